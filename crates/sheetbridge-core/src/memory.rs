//! In-process [`SpreadsheetStore`] used by tests and local development.
//!
//! Worksheets are kept as plain vectors behind a `RwLock`. Cells are stored
//! the way the Sheets API returns them: trailing empty cells are dropped, and
//! writing a null cell leaves the existing value in place.

use std::sync::{
    PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::{
    CellValue, DocumentInfo, Row, RowMap, RowRange, RowSet, SheetsError, SpreadsheetStore,
    WorksheetInfo, row::FIRST_DATA_ROW,
};

#[derive(Debug, Clone, Default)]
struct MemoryWorksheet {
    title: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// A spreadsheet document held entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySpreadsheet {
    title: String,
    sheets: RwLock<Vec<MemoryWorksheet>>,
    read_only: AtomicBool,
}

impl MemorySpreadsheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Adds a worksheet after the existing ones.
    #[must_use]
    pub fn with_worksheet<H, S>(mut self, title: &str, headers: H, rows: Vec<Vec<CellValue>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sheet = MemoryWorksheet {
            title: title.to_string(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows.into_iter().map(trim_trailing_nulls).collect(),
        };
        self.sheets
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sheet);
        self
    }

    /// Makes every write fail with a `403` API error, as a protected sheet
    /// would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Current data rows of a worksheet, or `None` for an unknown index.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::LockPoisoned`] if the lock is poisoned.
    pub fn snapshot(&self, sheet_index: usize) -> Result<Option<Vec<Vec<CellValue>>>, SheetsError> {
        let sheets = self.sheets.read().map_err(|_| SheetsError::LockPoisoned)?;
        Ok(sheets.get(sheet_index).map(|sheet| sheet.rows.clone()))
    }

    fn check_writable(&self) -> Result<(), SheetsError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(SheetsError::Api {
                status: StatusCode::FORBIDDEN,
                body: "worksheet is read-only".to_string(),
            });
        }
        Ok(())
    }
}

fn trim_trailing_nulls(mut values: Vec<CellValue>) -> Vec<CellValue> {
    while values.last() == Some(&CellValue::Null) {
        values.pop();
    }
    values
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[async_trait]
impl SpreadsheetStore for MemorySpreadsheet {
    async fn info(&self) -> Result<DocumentInfo, SheetsError> {
        let sheets = self.sheets.read().map_err(|_| SheetsError::LockPoisoned)?;
        let worksheets = sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| WorksheetInfo {
                sheet_id: u64::try_from(index).unwrap_or(u64::MAX),
                title: sheet.title.clone(),
                index,
                row_count: saturating_u32(sheet.rows.len() + 1),
                column_count: saturating_u32(sheet.headers.len()),
            })
            .collect();
        Ok(DocumentInfo {
            title: self.title.clone(),
            worksheets,
        })
    }

    async fn reload_info(&self) -> Result<DocumentInfo, SheetsError> {
        self.info().await
    }

    #[instrument(skip(self))]
    async fn get_rows(&self, sheet_index: usize, range: RowRange) -> Result<RowSet, SheetsError> {
        let sheets = self.sheets.read().map_err(|_| SheetsError::LockPoisoned)?;
        let sheet = sheets
            .get(sheet_index)
            .ok_or(SheetsError::SheetNotFound(sheet_index))?;

        if sheet.headers.is_empty() && !sheet.rows.is_empty() {
            return Err(SheetsError::MissingHeaderRow(sheet.title.clone()));
        }

        let Some(first_row) = range.first_row_number() else {
            return Ok(RowSet::from_cells(sheet.headers.clone(), FIRST_DATA_ROW, Vec::new()));
        };
        let cells: Vec<Vec<CellValue>> = sheet
            .rows
            .iter()
            .skip(range.offset)
            .take(range.effective_limit().unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(RowSet::from_cells(sheet.headers.clone(), first_row, cells))
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn add_rows(&self, sheet_index: usize, rows: Vec<RowMap>) -> Result<(), SheetsError> {
        self.check_writable()?;
        let mut sheets = self.sheets.write().map_err(|_| SheetsError::LockPoisoned)?;
        let sheet = sheets
            .get_mut(sheet_index)
            .ok_or(SheetsError::SheetNotFound(sheet_index))?;
        if rows.is_empty() {
            return Ok(());
        }
        if sheet.headers.is_empty() {
            return Err(SheetsError::MissingHeaderRow(sheet.title.clone()));
        }

        for row in &rows {
            let values = sheet
                .headers
                .iter()
                .map(|header| row.get(header).cloned().unwrap_or_default())
                .collect();
            sheet.rows.push(trim_trailing_nulls(values));
        }
        debug!(total = sheet.rows.len(), "Appended rows");
        Ok(())
    }

    #[instrument(skip(self, row), fields(row_number = row.row_number()))]
    async fn save_row(&self, sheet_index: usize, row: &Row) -> Result<(), SheetsError> {
        self.check_writable()?;
        let mut sheets = self.sheets.write().map_err(|_| SheetsError::LockPoisoned)?;
        let sheet = sheets
            .get_mut(sheet_index)
            .ok_or(SheetsError::SheetNotFound(sheet_index))?;

        let position = row.row_number().saturating_sub(FIRST_DATA_ROW);
        if sheet.rows.len() <= position {
            sheet.rows.resize(position + 1, Vec::new());
        }

        let stored = &mut sheet.rows[position];
        for (column, value) in row.aligned_values().into_iter().enumerate() {
            if value == CellValue::Null {
                continue;
            }
            if stored.len() <= column {
                stored.resize(column + 1, CellValue::Null);
            }
            stored[column] = value;
        }
        Ok(())
    }
}
