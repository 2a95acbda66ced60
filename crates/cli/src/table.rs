// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared table renderer for CLI list views.
//!
//! Consistent column alignment, status coloring, and truncation across
//! the `gt * list` commands.

use crate::color;

/// Column text alignment.
#[derive(Clone, Copy)]
pub enum Align {
    Left,
    Right,
}

/// How a cell's text is styled after padding.
#[derive(Clone, Copy)]
pub enum CellStyle {
    /// No color applied.
    Plain,
    /// Apply [`color::muted`].
    Muted,
    /// Apply [`color::status`], which auto-detects green/yellow/red.
    Status,
}

/// A column definition in a [`Table`].
pub struct Column {
    pub name: &'static str,
    pub align: Align,
    pub style: CellStyle,
    /// Maximum width (`None` = unlimited). Values exceeding this are truncated.
    pub max_width: Option<usize>,
}

impl Column {
    /// Left-aligned, plain style.
    pub fn left(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Left,
            style: CellStyle::Plain,
            max_width: None,
        }
    }

    /// Right-aligned, plain style.
    pub fn right(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Right,
            style: CellStyle::Plain,
            max_width: None,
        }
    }

    pub fn status(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Left,
            style: CellStyle::Status,
            max_width: None,
        }
    }

    pub fn muted(name: &'static str) -> Self {
        Self {
            name,
            align: Align::Left,
            style: CellStyle::Muted,
            max_width: None,
        }
    }

    pub fn max(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Accumulates rows, then renders with computed widths.
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render to a string, trailing newline included.
    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.len()).collect();
        let mut clipped: Vec<Vec<String>> = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut cells = Vec::with_capacity(self.columns.len());
            for (i, column) in self.columns.iter().enumerate() {
                let raw = row.get(i).map(String::as_str).unwrap_or("");
                let cell = match column.max_width {
                    Some(max) if raw.chars().count() > max => {
                        let truncated: String = raw.chars().take(max.saturating_sub(1)).collect();
                        format!("{}…", truncated)
                    }
                    _ => raw.to_string(),
                };
                widths[i] = widths[i].max(cell.chars().count());
                cells.push(cell);
            }
            clipped.push(cells);
        }

        let mut out = String::new();
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            out.push_str(&pad(column.name, widths[i], Align::Left));
        }
        out.push('\n');
        for cells in &clipped {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    out.push_str("  ");
                }
                let padded = pad(&cells[i], widths[i], column.align);
                let styled = match column.style {
                    CellStyle::Plain => padded,
                    CellStyle::Muted => color::muted(&padded),
                    CellStyle::Status => color::status(&padded),
                };
                out.push_str(&styled);
            }
            out.push('\n');
        }
        out
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    let fill = width.saturating_sub(len);
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), text),
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
