//! The capability surface the HTTP layer depends on.
//!
//! [`SpreadsheetStore`] captures everything the routes need from a
//! spreadsheet: metadata load/reset, row reads with optional limit/offset,
//! row appends, and persisting a single edited row. The production
//! implementation is [`GoogleSpreadsheet`](crate::GoogleSpreadsheet);
//! [`MemorySpreadsheet`](crate::MemorySpreadsheet) backs tests.

use async_trait::async_trait;
use serde::Serialize;

use crate::{Row, RowMap, RowRange, RowSet, SheetsError};

/// Metadata for one worksheet (tab).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorksheetInfo {
    pub sheet_id: u64,
    pub title: String,
    /// Zero-based position within the document.
    pub index: usize,
    pub row_count: u32,
    pub column_count: u32,
}

/// Cached document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentInfo {
    pub title: String,
    /// Worksheets ordered by position.
    pub worksheets: Vec<WorksheetInfo>,
}

impl DocumentInfo {
    pub fn sheet_by_index(&self, index: usize) -> Option<&WorksheetInfo> {
        self.worksheets.get(index)
    }

    pub fn titles(&self) -> Vec<String> {
        self.worksheets.iter().map(|sheet| sheet.title.clone()).collect()
    }
}

/// A single spreadsheet document that rows can be read from and written to.
///
/// Implementations are shared across concurrent requests. They do not guard
/// read-then-write sequences: two callers that read the same row and then
/// save it race, and the last write wins.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Returns cached metadata, loading it first if the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns the backend error if metadata has to be loaded and that fails.
    async fn info(&self) -> Result<DocumentInfo, SheetsError>;

    /// Drops cached metadata and loads it again from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the reload fails.
    async fn reload_info(&self) -> Result<DocumentInfo, SheetsError>;

    /// Reads the header row and the requested window of data rows.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::SheetNotFound`] for an unknown `sheet_index`,
    /// [`SheetsError::MissingHeaderRow`] when data sits under a blank header
    /// row, or the backend error.
    async fn get_rows(&self, sheet_index: usize, range: RowRange) -> Result<RowSet, SheetsError>;

    /// Appends rows, aligning each mapping to the worksheet's header row.
    /// Keys that are not headers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::SheetNotFound`] for an unknown `sheet_index`,
    /// [`SheetsError::MissingHeaderRow`] when the worksheet has no header
    /// row, or the backend error.
    async fn add_rows(&self, sheet_index: usize, rows: Vec<RowMap>) -> Result<(), SheetsError>;

    /// Writes `row` back in place at its row number.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::SheetNotFound`] for an unknown `sheet_index` or
    /// the backend error.
    async fn save_row(&self, sheet_index: usize, row: &Row) -> Result<(), SheetsError>;
}
