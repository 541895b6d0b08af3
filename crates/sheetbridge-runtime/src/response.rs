//! JSON bodies returned by the routes.

use serde::Serialize;
use sheetbridge_core::{DocumentInfo, RowSet};

/// `GET /sheets` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetsResponse {
    pub count: usize,
    pub titles: Vec<String>,
}

impl From<&DocumentInfo> for SheetsResponse {
    fn from(info: &DocumentInfo) -> Self {
        Self {
            count: info.worksheets.len(),
            titles: info.titles(),
        }
    }
}

/// Row listing shared by the read and write routes.
///
/// Every cell is rendered as a string, rows keep their raw length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowsResponse {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl From<RowSet> for RowsResponse {
    fn from(set: RowSet) -> Self {
        if set.is_empty() {
            return Self::default();
        }
        let rows = set.rows.iter().map(|row| row.display_values()).collect();
        Self {
            headers: set.headers,
            rows,
        }
    }
}
