// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple      = { "nginx-dev" },
    digits      = { "app1" },
    single_char = { "a" },
    max_len     = { "a23456789012345678901234567890123456789012345678901234567890123" },
)]
fn dns_label_accepts(value: &str) {
    assert_eq!(dns_label(value), Ok(()));
}

#[yare::parameterized(
    uppercase     = { "Nginx" },
    underscore    = { "my_app" },
    leading_dash  = { "-app" },
    trailing_dash = { "app-" },
    dotted        = { "app.dev" },
    too_long      = { "a234567890123456789012345678901234567890123456789012345678901234" },
)]
fn dns_label_rejects(value: &str) {
    assert!(dns_label(value).is_err());
}

#[yare::parameterized(
    https      = { "https://charts.bitnami.com/bitnami" },
    http       = { "http://example.com/repo.git" },
    scp_style  = { "git@github.com:org/repo.git" },
    git_proto  = { "git://example.com/repo.git" },
    ssh        = { "ssh://git@example.com/repo.git" },
)]
fn repo_url_accepts(value: &str) {
    assert_eq!(repo_url(value), Ok(()));
}

#[yare::parameterized(
    bare_host  = { "github.com/org/repo" },
    ftp        = { "ftp://example.com/repo" },
    spaces     = { "https://example.com/my repo" },
    empty_host = { "https://" },
)]
fn repo_url_rejects(value: &str) {
    assert!(repo_url(value).is_err());
}

#[yare::parameterized(
    absolute  = { "/charts/nginx" },
    parent    = { "../nginx" },
    nested_up = { "charts/../../nginx" },
)]
fn chart_path_rejects(value: &str) {
    assert!(chart_path(value).is_err());
}

#[test]
fn chart_path_accepts_nested_relative() {
    assert_eq!(chart_path("charts/nginx"), Ok(()));
    assert_eq!(chart_path("nginx"), Ok(()));
}

#[test]
fn helm_parameters_keep_order_and_trim() {
    let params = parse_helm_parameters("replicas=3, image.tag = v2.0,args=--a=b").unwrap();
    let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(pairs, [("replicas", "3"), ("image.tag", "v2.0"), ("args", "--a=b")]);
}

#[yare::parameterized(
    no_equals = { "replicas" },
    empty_key = { "=3" },
    trailing  = { "a=1," },
)]
fn helm_parameters_reject_malformed(value: &str) {
    assert!(parse_helm_parameters(value).is_err());
}

#[test]
fn environments_accept_cluster_url_alias() {
    let envs = parse_environments(
        r#"[{"name":"dev","namespace":"dev","cluster_url":"https://kubernetes.default.svc"}]"#,
    )
    .unwrap();
    assert_eq!(envs.len(), 1);
    assert_eq!(envs[0].cluster, "https://kubernetes.default.svc");
}

#[yare::parameterized(
    not_json        = { "dev,prod" },
    not_array       = { r#"{"name":"dev"}"# },
    empty           = { "[]" },
    not_object      = { r#"["dev"]"# },
    missing_cluster = { r#"[{"name":"dev","namespace":"dev"}]"# },
    blank_namespace = { r#"[{"name":"dev","namespace":" ","cluster":"c"}]"# },
    bad_name        = { r#"[{"name":"Dev","namespace":"dev","cluster":"c"}]"# },
)]
fn environments_reject(value: &str) {
    assert!(parse_environments(value).is_err());
}

#[test]
fn environment_error_names_missing_fields() {
    let err = parse_environments(r#"[{"name":"prod"}]"#).unwrap_err();
    assert!(err.contains("\"prod\""), "{err}");
    assert!(err.contains("namespace, cluster"), "{err}");
}

#[test]
fn checks_skip_empty_values() {
    assert_eq!(Check::DnsLabel.run(""), Ok(()));
    assert_eq!(Check::OneOf(&["list", "git"]).run(""), Ok(()));
}

#[test]
fn one_of_lists_allowed_values() {
    let err = Check::OneOf(&["list", "git"]).run("matrix").unwrap_err();
    assert_eq!(err, "must be one of list, git, got \"matrix\"");
}
