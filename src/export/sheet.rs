use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

use crate::records::RecordingKind;

/// One raw cell value as produced by the spreadsheet decoder
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Trimmed text content, `None` for empty or whitespace-only cells
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            // Numeric ids and exam numbers come back as floats from the decoder
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Cell::DateTime(dt) => Some(dt.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(dt: NaiveDateTime) -> Self {
        Cell::DateTime(dt)
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => match s.as_str() {
                "TRUE" => Cell::Bool(true),
                "FALSE" => Cell::Bool(false),
                _ => Cell::Text(s),
            },
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A row: column name to raw cell
pub type Row = BTreeMap<String, Cell>;

/// How the recording kind of a sheet's rows is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    /// Every row of the sheet is this kind
    Fixed(RecordingKind),
    /// Each row names its kind in the format's kind column
    Column,
}

/// One decoded export sheet handed over by the spreadsheet decoder
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSheet {
    /// Provenance label, usually the export file name
    pub name: String,
    pub kind: SheetKind,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Deserialize)]
struct RawSheet {
    name: String,
    #[serde(default)]
    kind: Option<RecordingKind>,
    #[serde(default)]
    columns: Vec<String>,
    rows: Vec<serde_json::Map<String, Value>>,
}

impl ExportSheet {
    pub fn new(name: impl Into<String>, kind: SheetKind, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Load a sheet decoded elsewhere and serialized as JSON.
    ///
    /// Expected shape: `{"name": .., "kind": "video" | "eeg" | null, "columns": [..], "rows": [{..}]}`.
    /// A missing `kind` means the kind is read per row; missing `columns` are
    /// collected from the row keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawSheet = serde_json::from_str(json).context("Failed to parse sheet JSON")?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawSheet =
            serde_json::from_reader(reader).context("Failed to read sheet JSON")?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSheet) -> Self {
        let mut columns = raw.columns;
        if columns.is_empty() {
            for row in &raw.rows {
                for key in row.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let rows: Vec<Row> = raw
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k, Cell::from(v))).collect::<Row>())
            .collect();

        Self {
            name: raw.name,
            kind: raw.kind.map(SheetKind::Fixed).unwrap_or(SheetKind::Column),
            columns,
            rows,
        }
    }
}
