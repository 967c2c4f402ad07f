//! Rendering of command results.
//!
//! Table output is for people and carries status lines. JSON and YAML output
//! is for scripts: stdout then holds exactly one document, and status lines
//! are left out so the stream stays parseable.

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Modify, Style, Width},
    Table, Tabled,
};

/// Output format selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Render as a formatted table
    #[default]
    Table,
    /// Render as JSON
    Json,
    /// Render as YAML
    Yaml,
}

impl OutputFormat {
    /// Whether output is a machine-readable document.
    pub fn is_document(self) -> bool {
        self != Self::Table
    }
}

/// Serialize `value` as a JSON or YAML document. Table format renders JSON.
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Table | OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(value)?;
            text.push('\n');
            text
        }
    })
}

/// Render rows as a table; long cells such as full paths wrap instead of
/// stretching the terminal.
pub fn table<T: Tabled>(rows: &[T]) -> String {
    Table::new(rows)
        .with(Style::sharp())
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(100).keep_words()))
        .to_string()
}

/// Print an error message to stderr. Used in every format.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

/// Writes command results to stdout in the selected format.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Rows as a table, or as one JSON/YAML list.
    pub fn rows<T: Tabled + Serialize>(&self, rows: &[T], empty: &str) -> Result<()> {
        if self.format.is_document() {
            print!("{}", render(rows, self.format)?);
        } else if rows.is_empty() {
            println!("{}", empty.dimmed());
        } else {
            println!("{}", table(rows));
        }
        Ok(())
    }

    /// A whole result as one document. Ignored for table output, where the
    /// caller prints its own sections.
    pub fn document<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if self.format.is_document() {
            print!("{}", render(value, self.format)?);
        }
        Ok(())
    }

    pub fn section(&self, title: &str) {
        if !self.format.is_document() {
            println!();
            println!("{}", title.bold().underline());
        }
    }

    pub fn field(&self, key: &str, value: &str) {
        if !self.format.is_document() {
            println!("  {}: {}", key.cyan(), value);
        }
    }

    pub fn done(&self, msg: &str) {
        if !self.format.is_document() {
            println!("{} {}", "[OK]".green().bold(), msg);
        }
    }

    pub fn note(&self, msg: &str) {
        if !self.format.is_document() {
            println!("{} {}", "[INFO]".blue().bold(), msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        index: usize,
        path: String,
    }

    #[test]
    fn test_render_documents() {
        let rows = vec![Row {
            index: 0,
            path: "/runs/ais.json".to_string(),
        }];

        let json = render(&rows, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["path"], "/runs/ais.json");

        let yaml = render(&rows, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("path: /runs/ais.json"));
    }

    #[test]
    fn test_table_keeps_full_paths() {
        let path = "/scratch/experiment-42/bamber19.icesheets/output/bamber19.ais.lslr.json";
        let rendered = table(&[Row {
            index: 0,
            path: path.to_string(),
        }]);
        assert!(rendered.contains(path));
    }
}
