//! Command handlers for the pantry CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod checkout;
mod import;
mod init;
mod items;
mod report;
mod transactions;

use crate::args::OutputFormat;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use tracing::{debug, info};

pub use checkout::checkout;
pub use import::import;
pub use init::init;
pub use items::items;
pub use report::{build_report, report, LowStockItem, Movement, Report};
pub use transactions::transactions;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Listing rows rendered in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// JSON array of objects, one per row.
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data with a header row.
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

impl Rows {
    /// Renders `records` in `format`. `headers` and `cells` drive the table and CSV layouts; JSON
    /// uses each record's own serialization.
    pub(crate) fn render<T, F>(
        format: OutputFormat,
        headers: &[&str],
        records: &[T],
        cells: F,
    ) -> Result<Self>
    where
        T: Serialize,
        F: Fn(&T) -> Vec<String>,
    {
        match format {
            OutputFormat::Json => Ok(Rows::Json(
                serde_json::to_value(records).context("Unable to serialize rows")?,
            )),
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                writer.write_record(headers).context("Unable to write CSV")?;
                for record in records {
                    writer
                        .write_record(cells(record))
                        .context("Unable to write CSV")?;
                }
                let bytes = writer.into_inner().context("Unable to finish CSV")?;
                Ok(Rows::Csv(
                    String::from_utf8(bytes).context("CSV output is not UTF-8")?,
                ))
            }
            OutputFormat::Table => {
                let body: Vec<Vec<String>> = records.iter().map(&cells).collect();
                Ok(Rows::Table(markdown_table(headers, &body)))
            }
        }
    }
}

fn markdown_table(headers: &[&str], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(table_line(headers.iter().copied(), &widths));
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(format!("|-{}-|", dashes.join("-|-")));
    for row in body {
        out.push(table_line(row.iter().map(String::as_str), &widths));
    }
    out.join("\n")
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    format!("| {} |", padded.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Shelf {
        name: String,
        count: u32,
    }

    fn shelves() -> Vec<Shelf> {
        vec![
            Shelf {
                name: "Rice".to_string(),
                count: 12,
            },
            Shelf {
                name: "Canned beans, black".to_string(),
                count: 3,
            },
        ]
    }

    fn cells(s: &Shelf) -> Vec<String> {
        vec![s.name.clone(), s.count.to_string()]
    }

    #[test]
    fn test_render_table() {
        let rows =
            Rows::render(OutputFormat::Table, &["Name", "Count"], &shelves(), cells).unwrap();
        let expected = "\
| Name                | Count |
|---------------------|-------|
| Rice                | 12    |
| Canned beans, black | 3     |";
        assert_eq!(rows.to_string(), expected);
    }

    #[test]
    fn test_render_csv_quotes_commas() {
        let rows =
            Rows::render(OutputFormat::Csv, &["Name", "Count"], &shelves(), cells).unwrap();
        assert_eq!(
            rows.to_string(),
            "Name,Count\nRice,12\n\"Canned beans, black\",3\n"
        );
    }

    #[test]
    fn test_render_json() {
        let rows =
            Rows::render(OutputFormat::Json, &["Name", "Count"], &shelves(), cells).unwrap();
        let Rows::Json(value) = rows else {
            panic!("expected json");
        };
        assert_eq!(value[1]["name"], "Canned beans, black");
        assert_eq!(value[0]["count"], 12);
    }

    #[test]
    fn test_out_from_message() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }
}
