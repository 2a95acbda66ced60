// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output format selection and small shared formatters.

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a UTC timestamp as relative age (e.g., "5s", "2m", "1h", "3d").
pub fn format_age(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    let Some(ts) = ts else {
        return "-".to_string();
    };
    let elapsed = (chrono::Utc::now() - ts).num_seconds().max(0) as u64;
    gt_core::time_fmt::format_elapsed(elapsed)
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
