//! Google Sheets backed [`SpreadsheetStore`].
//!
//! [`GoogleSpreadsheet`] is the handle for one spreadsheet document. It keeps
//! the document's worksheet list in a local cache that is filled at
//! [`connect`](GoogleSpreadsheet::connect) time and refreshed on demand;
//! everything else goes to the Sheets v4 REST API on every call.
//!
//! Worksheets are addressed by position. The first row of a worksheet is its
//! header row and data rows start at A1 row 2.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::{
    CellValue, Config, DocumentInfo, Row, RowMap, RowRange, RowSet, SheetsError, SpreadsheetStore,
    WorksheetInfo,
    client::{SheetsClient, quote_sheet_title},
    credentials::TokenSource,
    types::{
        AppendValuesResponse, BatchGetValuesResponse, SpreadsheetMetadata, UpdateValuesResponse,
        ValueRange, ValueRangeInput,
    },
};

const METADATA_FIELDS: &str = "properties.title,sheets.properties";
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Handle for a single Google Sheets document.
#[derive(Debug)]
pub struct GoogleSpreadsheet {
    sheet_id: String,
    client: SheetsClient,
    metadata: RwLock<Option<DocumentInfo>>,
}

impl GoogleSpreadsheet {
    /// Creates a handle without touching the network.
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Creates a handle that issues requests through `http`.
    pub fn with_http_client(config: &Config, http: reqwest::Client) -> Self {
        let tokens = Arc::new(TokenSource::new(config.credentials.clone(), http.clone()));
        Self {
            sheet_id: config.sheet_id.clone(),
            client: SheetsClient::new(http, &config.endpoint, tokens),
            metadata: RwLock::new(None),
        }
    }

    /// Authenticates and loads document metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Auth`] if the credential exchange fails, or the
    /// API error if metadata cannot be loaded.
    pub async fn connect(config: &Config) -> Result<Self, SheetsError> {
        let document = Self::new(config);
        document.client.authenticate().await?;
        let info = document.load_info().await?;
        info!(
            sheet_id = %document.sheet_id,
            title = %info.title,
            worksheets = info.worksheets.len(),
            "Loaded spreadsheet"
        );
        Ok(document)
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    /// Fetches document properties and worksheets into the local cache.
    ///
    /// # Errors
    ///
    /// Returns the API or transport error if the request fails.
    pub async fn load_info(&self) -> Result<DocumentInfo, SheetsError> {
        let url = self.client.url_with_segments(&["spreadsheets", &self.sheet_id])?;
        let metadata: SpreadsheetMetadata = self
            .client
            .get_json(url, &[("fields", METADATA_FIELDS.to_string())])
            .await?;

        let mut worksheets: Vec<WorksheetInfo> = metadata
            .sheets
            .into_iter()
            .map(|sheet| WorksheetInfo {
                sheet_id: sheet.properties.sheet_id,
                title: sheet.properties.title,
                index: sheet.properties.index,
                row_count: sheet.properties.grid_properties.row_count,
                column_count: sheet.properties.grid_properties.column_count,
            })
            .collect();
        worksheets.sort_by_key(|sheet| sheet.index);

        let info = DocumentInfo {
            title: metadata.properties.title,
            worksheets,
        };
        *self.metadata.write().await = Some(info.clone());
        Ok(info)
    }

    /// Forgets cached metadata; the next access reloads it.
    pub async fn reset_local_cache(&self) {
        *self.metadata.write().await = None;
    }

    async fn worksheet(&self, index: usize) -> Result<WorksheetInfo, SheetsError> {
        let info = self.info().await?;
        info.sheet_by_index(index)
            .cloned()
            .ok_or(SheetsError::SheetNotFound(index))
    }

    /// Raises the cached grid height so rows an append wrote past the end
    /// stay inside the unbounded data range.
    async fn grow_row_count(&self, sheet_index: usize, end_row: u32) {
        let mut metadata = self.metadata.write().await;
        if let Some(sheet) = metadata
            .as_mut()
            .and_then(|info| info.worksheets.get_mut(sheet_index))
        {
            sheet.row_count = sheet.row_count.max(end_row);
        }
    }

    async fn fetch_header_row(&self, sheet: &WorksheetInfo) -> Result<Vec<String>, SheetsError> {
        let range = format!("{}!1:1", quote_sheet_title(&sheet.title));
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.sheet_id, "values", &range])?;
        let response: ValueRange = self.client.get_json(url, &[]).await?;
        Ok(header_values(response.values.into_iter().next()))
    }
}

fn header_values(row: Option<Vec<serde_json::Value>>) -> Vec<String> {
    row.unwrap_or_default()
        .into_iter()
        .map(|cell| CellValue::from_json(cell).to_string().trim().to_string())
        .collect()
}

/// Last row number of an A1 range such as `'Sheet 1'!A4:C5`.
fn range_end_row(a1: &str) -> Option<u32> {
    let cells = a1.rsplit_once('!').map_or(a1, |(_, cells)| cells);
    let end = cells.rsplit_once(':').map_or(cells, |(_, end)| end);
    end.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// A1 range covering the requested data rows, or `None` when the window is
/// empty.
fn data_range(sheet: &WorksheetInfo, range: RowRange) -> Option<String> {
    let first = range.first_row_number()?;
    let last = match range.effective_limit() {
        Some(limit) => first.saturating_add(limit - 1),
        None => usize::try_from(sheet.row_count).unwrap_or(usize::MAX),
    };
    (first <= last).then(|| format!("{}!{first}:{last}", quote_sheet_title(&sheet.title)))
}

#[async_trait]
impl SpreadsheetStore for GoogleSpreadsheet {
    async fn info(&self) -> Result<DocumentInfo, SheetsError> {
        let cached = self.metadata.read().await.clone();
        if let Some(info) = cached {
            return Ok(info);
        }
        self.load_info().await
    }

    async fn reload_info(&self) -> Result<DocumentInfo, SheetsError> {
        self.reset_local_cache().await;
        self.load_info().await
    }

    #[instrument(skip(self), fields(sheet_id = %self.sheet_id))]
    async fn get_rows(&self, sheet_index: usize, range: RowRange) -> Result<RowSet, SheetsError> {
        let sheet = self.worksheet(sheet_index).await?;

        let mut query = vec![
            ("ranges", format!("{}!1:1", quote_sheet_title(&sheet.title))),
            ("valueRenderOption", "FORMATTED_VALUE".to_string()),
        ];
        if let Some(data) = data_range(&sheet, range) {
            query.push(("ranges", data));
        }

        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.sheet_id, "values:batchGet"])?;
        let response: BatchGetValuesResponse = self.client.get_json(url, &query).await?;

        let mut value_ranges = response.value_ranges.into_iter();
        let headers = header_values(
            value_ranges
                .next()
                .and_then(|header| header.values.into_iter().next()),
        );
        let cells: Vec<Vec<CellValue>> = value_ranges
            .next()
            .map(|data| data.values)
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(CellValue::from_json).collect())
            .collect();

        if headers.is_empty() && !cells.is_empty() {
            return Err(SheetsError::MissingHeaderRow(sheet.title));
        }

        debug!(sheet = %sheet.title, rows = cells.len(), "Fetched rows");
        Ok(RowSet::from_cells(
            headers,
            range.first_row_number().unwrap_or(usize::MAX),
            cells,
        ))
    }

    #[instrument(skip(self, rows), fields(sheet_id = %self.sheet_id, rows = rows.len()))]
    async fn add_rows(&self, sheet_index: usize, rows: Vec<RowMap>) -> Result<(), SheetsError> {
        let sheet = self.worksheet(sheet_index).await?;
        if rows.is_empty() {
            return Ok(());
        }

        let headers = self.fetch_header_row(&sheet).await?;
        if headers.is_empty() {
            return Err(SheetsError::MissingHeaderRow(sheet.title));
        }

        let values = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|header| row.get(header).map_or(serde_json::Value::Null, CellValue::to_json))
                    .collect()
            })
            .collect();

        let range = format!("{}!A1", quote_sheet_title(&sheet.title));
        let url = self.client.url_with_segments(&[
            "spreadsheets",
            &self.sheet_id,
            "values",
            &format!("{range}:append"),
        ])?;
        let body = ValueRangeInput {
            range,
            major_dimension: "ROWS",
            values,
        };
        let query = [
            ("valueInputOption", VALUE_INPUT_OPTION.to_string()),
            ("insertDataOption", "OVERWRITE".to_string()),
        ];

        let response: AppendValuesResponse = self.client.post_json(url, &body, &query).await?;
        if let Some(updates) = response.updates {
            debug!(
                table_range = ?response.table_range,
                updated_range = %updates.updated_range,
                updated_rows = updates.updated_rows,
                updated_cells = updates.updated_cells,
                "Appended rows"
            );
            if let Some(end_row) = range_end_row(&updates.updated_range) {
                self.grow_row_count(sheet_index, end_row).await;
            }
        }
        Ok(())
    }

    #[instrument(skip(self, row), fields(sheet_id = %self.sheet_id, row_number = row.row_number()))]
    async fn save_row(&self, sheet_index: usize, row: &Row) -> Result<(), SheetsError> {
        let sheet = self.worksheet(sheet_index).await?;

        let row_number = row.row_number();
        let range = format!(
            "{}!{row_number}:{row_number}",
            quote_sheet_title(&sheet.title)
        );
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.sheet_id, "values", &range])?;
        let body = ValueRangeInput {
            range,
            major_dimension: "ROWS",
            values: vec![row.aligned_values().iter().map(CellValue::to_json).collect()],
        };

        let response: UpdateValuesResponse = self
            .client
            .put_json(
                url,
                &body,
                &[("valueInputOption", VALUE_INPUT_OPTION.to_string())],
            )
            .await?;
        debug!(
            updated_range = %response.updated_range,
            updated_cells = response.updated_cells,
            "Saved row"
        );
        Ok(())
    }
}
