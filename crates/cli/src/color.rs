// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Color detection and the CLI palette.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
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
    /// Healthy / success
    pub const GREEN: u8 = 108;
    /// Warnings / stalled
    pub const YELLOW: u8 = 179;
    /// Failures / zombies
    pub const RED: u8 = 167;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn wrap(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

pub fn muted(text: &str) -> String {
    wrap(codes::MUTED, text)
}

/// Status coloring by conventional words: green for healthy, yellow for
/// in-between, red for dead.
pub fn status(text: &str) -> String {
    let code = match text.trim() {
        "alive" | "ok" | "available" | "merged" | "open" => codes::GREEN,
        "zombie" | "stalled" | "limited" | "cooldown" | "warn" | "pending" => codes::YELLOW,
        "absent" | "fail" | "blocked" | "crashed" | "dead" => codes::RED,
        _ => codes::LITERAL,
    };
    wrap(code, text)
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .usage(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}
