//! Command output.
//!
//! Every command produces both a JSON body and a list of text blocks; `--json`
//! picks the former, the terminal gets the latter.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CrmError, Result};

/// Widest cell printed in a text table.
const MAX_CELL_WIDTH: usize = 48;

/// A piece of human-readable output.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Informational message (success, status, etc.).
    Info(String),
    /// Section title.
    Heading(String),
    /// Label/value pairs, one per line.
    Fields(Vec<(String, String)>),
    /// Column headers and row cells.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub json: Value,
    pub blocks: Vec<Block>,
}

impl CommandOutput {
    /// Starts an output whose JSON form is `body`.
    pub fn new(body: &impl Serialize) -> Result<Self> {
        let json = serde_json::to_value(body)
            .map_err(|e| CrmError::internal(format!("Failed to serialize output: {e}")))?;
        Ok(Self {
            json,
            blocks: Vec::new(),
        })
    }

    pub fn info(mut self, msg: impl Into<String>) -> Self {
        self.blocks.push(Block::Info(msg.into()));
        self
    }

    pub fn heading(mut self, title: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading(title.into()));
        self
    }

    pub fn fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.blocks.push(Block::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn table(mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        self.blocks.push(Block::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        });
        self
    }

    /// Renders either the pretty-printed JSON body or the text blocks.
    pub fn render(&self, json: bool) -> String {
        if json {
            return serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| "null".into());
        }

        self.blocks
            .iter()
            .map(render_block)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Info(msg) => msg.clone(),
        Block::Heading(title) => format!("{title}\n{}", "=".repeat(title.chars().count())),
        Block::Fields(fields) => {
            let width = fields
                .iter()
                .map(|(k, _)| k.chars().count())
                .max()
                .unwrap_or(0);
            fields
                .iter()
                .map(|(k, v)| format!("{k:<width$}  {v}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Block::Table { headers, rows } => render_table(headers, rows),
    }
}

fn clip(cell: &str) -> String {
    let cell = cell.replace('\n', " ");
    if cell.chars().count() <= MAX_CELL_WIDTH {
        cell
    } else {
        let clipped: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{clipped}...")
    }
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }

    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| clip(c)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{:<w$}", cells.get(i).map(String::as_str).unwrap_or("")))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![
        line(headers),
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    ];
    out.extend(rows.iter().map(|r| line(r)));
    out.join("\n")
}

/// `1234.5` -> `$1,234.50`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Signed percentage with one decimal, or `n/a`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:+.1}%"),
        None => "n/a".to_string(),
    }
}
