// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit-code plumbing.
//!
//! `SilentExit` lets check-style commands signal through the exit code
//! alone (`gt mail check`: 0 = unread mail present, 1 = none) so shell
//! callers can branch without parsing output.

use std::fmt;

/// Error carrying an explicit exit code.
#[derive(Debug)]
pub enum ExitError {
    /// Exit with this code, printing nothing.
    Silent(i32),
    /// Print the message to stderr, exit 1.
    Message(String),
}

impl ExitError {
    pub fn silent(code: i32) -> anyhow::Error {
        anyhow::Error::new(ExitError::Silent(code))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitError::Silent(code) => write!(f, "silent exit {}", code),
            ExitError::Message(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ExitError {}

/// Terminate the process according to an error chain, honoring
/// `SilentExit` when present.
pub fn exit_with(error: anyhow::Error) -> ! {
    if let Some(exit) = error.downcast_ref::<ExitError>() {
        match exit {
            ExitError::Silent(code) => std::process::exit(*code),
            ExitError::Message(message) => {
                eprintln!("gt: {}", message);
                std::process::exit(1);
            }
        }
    }
    eprintln!("gt: {:#}", error);
    std::process::exit(1);
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
