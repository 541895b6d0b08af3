//! Positional row model.
//!
//! Rows have no stable key: a [`Row`] is identified by its 1-based A1 row
//! number, and columns are resolved by name against the header row the row
//! was read with.

use std::sync::Arc;

use crate::CellValue;

/// A1 row number of the first data row; row 1 holds the headers.
pub(crate) const FIRST_DATA_ROW: usize = 2;

/// Window of data rows to read, passed through to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowRange {
    /// Maximum number of data rows to return.
    pub limit: Option<usize>,
    /// Number of data rows to skip.
    pub offset: usize,
}

impl RowRange {
    /// Every data row of the worksheet.
    pub const ALL: Self = Self {
        limit: None,
        offset: 0,
    };

    /// Row cap to apply. A zero limit reads every row, like an absent one.
    pub fn effective_limit(self) -> Option<usize> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// A1 row number of the first row in the window, or `None` when the
    /// offset lies past any addressable row.
    pub fn first_row_number(self) -> Option<usize> {
        FIRST_DATA_ROW.checked_add(self.offset)
    }
}

/// A single data row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    row_number: usize,
    headers: Arc<[String]>,
    values: Vec<CellValue>,
}

impl Row {
    pub fn new(row_number: usize, headers: Arc<[String]>, values: Vec<CellValue>) -> Self {
        Self {
            row_number,
            headers,
            values,
        }
    }

    /// 1-based A1 row number (the header row is row 1).
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cells as returned by the backend. May be shorter than the header row
    /// because trailing empty cells are omitted.
    pub fn raw_values(&self) -> &[CellValue] {
        &self.values
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == column)
    }

    /// Whether the header row names `column`. Case-sensitive.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_position(column).is_some()
    }

    /// The value under `column`, or `None` if the column is unknown or the
    /// cell lies past the end of the raw values.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.column_position(column)
            .and_then(|position| self.values.get(position))
    }

    /// Sets the value under `column`. Returns `false` (and changes nothing)
    /// when the column is unknown.
    pub fn set(&mut self, column: &str, value: CellValue) -> bool {
        let Some(position) = self.column_position(column) else {
            return false;
        };
        if self.values.len() <= position {
            self.values.resize(position + 1, CellValue::Null);
        }
        self.values[position] = value;
        true
    }

    /// Values padded or truncated to the header width, for writing back.
    pub fn aligned_values(&self) -> Vec<CellValue> {
        (0..self.headers.len())
            .map(|position| self.values.get(position).cloned().unwrap_or_default())
            .collect()
    }

    /// Raw values rendered as strings, preserving column order.
    pub fn display_values(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }
}

/// The header row plus data rows of one worksheet read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowSet {
    /// Builds a row set from raw cells, numbering rows from
    /// `first_row_number`.
    pub fn from_cells(
        headers: Vec<String>,
        first_row_number: usize,
        cells: Vec<Vec<CellValue>>,
    ) -> Self {
        let shared: Arc<[String]> = Arc::from(headers.clone());
        let rows = cells
            .into_iter()
            .enumerate()
            .map(|(i, values)| Row::new(first_row_number.saturating_add(i), Arc::clone(&shared), values))
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
