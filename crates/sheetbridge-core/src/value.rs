//! Cell values as they travel between clients and the spreadsheet.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A cell value that can be a string, number, boolean, or null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum CellValue {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An empty or null cell.
    #[default]
    Null,
}

/// One row keyed by column name, as produced for appends.
pub type RowMap = BTreeMap<String, CellValue>;

impl CellValue {
    /// Converts a raw JSON cell returned by the Sheets API.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Null => Self::Null,
            other => Self::String(other.to_string()),
        }
    }

    /// Converts to the JSON form sent to the Sheets API.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::json!(n),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Null => serde_json::Value::Null,
        }
    }

    /// Whether this value is a JSON number. Numeric strings are not.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}
