// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use flowcd_core::{LogLevel, Phase};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: pastel cyan / steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Muted / secondary text: darker grey
    pub const MUTED: u8 = 240;
    /// Succeeded: sage green
    pub const GOOD: u8 = 108;
    /// Failed / Error: soft red
    pub const BAD: u8 = 167;
    /// Running / warnings: amber
    pub const BUSY: u8 = 179;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if crate::env::no_color() {
        return false;
    }
    if crate::env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

/// Format text with the header color (steel blue).
pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

/// Format text with the context color (medium grey).
pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

/// Format text with the muted color (darker grey).
pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// Phase name colored by outcome.
pub fn phase(phase: Phase) -> String {
    let text = phase.to_string();
    match phase {
        Phase::Succeeded => paint(codes::GOOD, &text),
        Phase::Failed | Phase::Error => paint(codes::BAD, &text),
        Phase::Running => paint(codes::BUSY, &text),
        Phase::Pending => paint(codes::MUTED, &text),
    }
}

/// Log line colored by its level; info lines stay plain.
pub fn log_line(level: LogLevel, line: &str) -> String {
    match level {
        LogLevel::Error => paint(codes::BAD, line),
        LogLevel::Warning => paint(codes::BUSY, line),
        LogLevel::Info => line.to_string(),
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
