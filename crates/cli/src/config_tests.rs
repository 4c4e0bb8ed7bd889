// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const FULL: &str = r#"
namespace = "workflows"
poll_interval_ms = 500

[gitops]
repo = "https://github.com/acme/deployments"
branch = "release"
path = "apps"
api_url = "https://github.example.com/api/v3"

[gitops.author]
name = "flowcd"
email = "flowcd@example.com"
"#;

fn write(dir: &tempfile::TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn missing_optional_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileConfig::load(&dir.path().join("absent.toml"), false).unwrap();
    assert_eq!(file, FileConfig::default());
}

#[test]
fn missing_required_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileConfig::load(&dir.path().join("absent.toml"), true).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn full_file_parses() {
    let dir = tempfile::tempdir().unwrap();
    let file = FileConfig::load(&write(&dir, FULL), true).unwrap();
    assert_eq!(file.namespace.as_deref(), Some("workflows"));
    assert_eq!(file.poll_interval_ms, Some(500));
    assert_eq!(file.gitops.branch.as_deref(), Some("release"));
    assert_eq!(file.gitops.author.unwrap().email, "flowcd@example.com");
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileConfig::load(&write(&dir, "namespcae = \"argo\"\n"), true).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("namespcae"));
}

#[test]
fn defaults_apply_without_file_or_overrides() {
    let settings = Settings::resolve(FileConfig::default(), None, Overrides::default()).unwrap();
    assert_eq!(settings.namespace, "argo");
    assert_eq!(settings.poll_interval, Duration::from_secs(2));
    assert_eq!(settings.gitops.branch, "main");
    assert_eq!(settings.gitops.path, "argocd-manifests");
    assert_eq!(settings.gitops.api_url, "https://api.github.com");
    assert!(settings.gitops.repo.is_none());
    assert!(settings.gitops.credentials.is_none());
}

#[yare::parameterized(
    flag_wins = { Some("from-flag"), Some("from-env"), Some("from-file"), "from-flag" },
    env_next  = { None, Some("from-env"), Some("from-file"), "from-env" },
    file_next = { None, None, Some("from-file"), "from-file" },
    default   = { None, None, None, "argo" },
)]
fn namespace_precedence(flag: Option<&str>, env: Option<&str>, file: Option<&str>, expected: &str) {
    let file = FileConfig { namespace: file.map(String::from), ..Default::default() };
    let overrides = Overrides {
        namespace_flag: flag.map(String::from),
        namespace_env: env.map(String::from),
        ..Default::default()
    };
    assert_eq!(Settings::resolve(file, None, overrides).unwrap().namespace, expected);
}

#[test]
fn zero_poll_interval_is_rejected() {
    let file = FileConfig { poll_interval_ms: Some(0), ..Default::default() };
    let err = Settings::resolve(file, None, Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroPollInterval));
}

#[test]
fn token_becomes_credentials_and_is_redacted_when_shown() {
    let overrides = Overrides {
        git_username: Some("deploy-bot".to_string()),
        git_token: Some(SecretString::from("ghp_secret".to_string())),
        ..Default::default()
    };
    let settings = Settings::resolve(FileConfig::default(), None, overrides).unwrap();
    let credentials = settings.gitops.credentials.as_ref().unwrap();
    assert_eq!(credentials.username.as_deref(), Some("deploy-bot"));

    let shown = settings.shown();
    assert_eq!(shown.gitops.token, "[redacted]");
    let text = toml::to_string(&shown).unwrap();
    assert!(!text.contains("ghp_secret"));
    assert!(!format!("{settings:?}").contains("ghp_secret"));
}

#[test]
fn shown_settings_render_as_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, FULL);
    let file = FileConfig::load(&path, true).unwrap();
    let settings = Settings::resolve(file, Some(path), Overrides::default()).unwrap();

    let text = toml::to_string(&settings.shown()).unwrap();
    assert!(text.contains("namespace = \"workflows\""));
    assert!(text.contains("poll_interval_ms = 500"));
    assert!(text.contains("token = \"(unset)\""));
    assert!(text.contains("[gitops.author]"));
    assert_eq!(settings.flow_config().tracker.poll_interval, Duration::from_millis(500));
}
