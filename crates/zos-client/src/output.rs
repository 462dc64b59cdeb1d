//! Rendering helpers shared by the command handlers.

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, tabular where the response is a list.
    #[default]
    Text,
    /// The structured response as pretty-printed JSON.
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Print a structured response as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

/// Print a plain confirmation, or a `{success, message}` object in
/// JSON mode, for operations whose success has no payload.
pub fn print_done(format: OutputFormat, message: String) -> Result<()> {
    if format.is_json() {
        print_json(&serde_json::json!({ "success": true, "message": message }))
    } else {
        println!("{message}");
        Ok(())
    }
}

/// Render rows under a header, each column padded to its widest cell.
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.len()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if index < widths.len() {
                widths[index] = widths[index].max(cell.len());
            }
        }
    }
    let mut out = String::new();
    render_row(&mut out, header.iter().map(|cell| *cell), &widths);
    for row in rows {
        render_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn render_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let cells: Vec<&str> = cells.collect();
    for (index, cell) in cells.iter().enumerate() {
        if index + 1 == cells.len() {
            // Last column stays unpadded so lines have no trailing blanks.
            out.push_str(cell);
        } else {
            out.push_str(&format!("{:<width$}  ", cell, width = widths[index]));
        }
    }
    out.push('\n');
}
