//! Route registration and request handlers.
//!
//! Every handler returns a single `Result`, so a request produces exactly one
//! response. Mutating routes answer with the refreshed row listing of the
//! worksheet they touched.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sheetbridge_core::{CellValue, RowRange, SpreadsheetStore};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApiError,
    payload::{AddRowsRequest, UpdateCellRequest},
    policy::UpdatePolicy,
    response::{RowsResponse, SheetsResponse},
};

/// Column stamped with the update time on every cell update, when present.
pub const TIMESTAMP_COLUMN: &str = "time";

// Offsets beyond any worksheet's grid are clamped before they reach the store.
const MAX_ROW_OFFSET: usize = 10_000_000;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SpreadsheetStore>,
    policy: Arc<UpdatePolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn SpreadsheetStore>, policy: UpdatePolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RowsQuery {
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
}

impl From<RowsQuery> for RowRange {
    fn from(query: RowsQuery) -> Self {
        Self {
            limit: query.limit,
            offset: query.offset.min(MAX_ROW_OFFSET),
        }
    }
}

/// Builds the spreadsheet routes.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sheets", get(list_sheets))
        .route("/rows", get(list_default_rows))
        .route("/rows/{sheet_index}", get(list_rows))
        .route("/add-rows", post(add_rows))
        .route("/update-cell", put(update_cell))
        .route("/health", get(health))
        .with_state(state)
}

/// Registers the spreadsheet routes on an existing router.
pub fn register_routes(router: Router, state: AppState) -> Router {
    router.merge(routes(state))
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
async fn list_sheets(State(state): State<AppState>) -> Result<Json<SheetsResponse>, ApiError> {
    let info = state.store.reload_info().await?;
    debug!(count = info.worksheets.len(), "Reloaded worksheets");
    Ok(Json(SheetsResponse::from(&info)))
}

async fn list_default_rows(
    State(state): State<AppState>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<RowsResponse>, ApiError> {
    listing(state.store.as_ref(), 0, query.into())
        .await
        .map(Json)
}

async fn list_rows(
    State(state): State<AppState>,
    Path(sheet_index): Path<String>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<RowsResponse>, ApiError> {
    let sheet_index = parse_sheet_index(&sheet_index)?;
    listing(state.store.as_ref(), sheet_index, query.into())
        .await
        .map(Json)
}

#[instrument(skip_all)]
async fn add_rows(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RowsResponse>, ApiError> {
    let request = AddRowsRequest::parse(&body)?;
    let rows = request.row_maps();

    info!(
        sheet_index = request.sheet_index,
        rows = rows.len(),
        "Appending rows"
    );
    state.store.add_rows(request.sheet_index, rows).await?;

    listing(state.store.as_ref(), request.sheet_index, RowRange::ALL)
        .await
        .map(Json)
}

#[instrument(skip_all)]
async fn update_cell(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RowsResponse>, ApiError> {
    let UpdateCellRequest {
        sheet_index,
        column_name,
        value,
        row_index,
    } = UpdateCellRequest::parse(&body)?;

    let mut rows = state.store.get_rows(sheet_index, RowRange::ALL).await?.rows;

    // Checked before the existence test, so an index one past the end is 404
    // and anything further is 409.
    let len = rows.len();
    if len < row_index {
        return Err(ApiError::Conflict(format!(
            "Property 'rowIndex' (provided in PUT body) of {row_index} is out of range (rows.length == {len})"
        )));
    }
    let Some(row) = rows.get_mut(row_index) else {
        return Err(ApiError::NotFound(format!(
            "Row index {row_index} does not yet exist"
        )));
    };
    if !row.has_column(&column_name) {
        return Err(ApiError::NotFound(format!(
            "Column name '{column_name}' not found for sheet {sheet_index}"
        )));
    }

    state.policy.check_column(&column_name)?;
    state.policy.check_value(&value)?;

    row.set(&column_name, value);
    if row.has_column(TIMESTAMP_COLUMN) {
        row.set(TIMESTAMP_COLUMN, CellValue::String(http_date(Utc::now())));
    } else {
        warn!(
            sheet_index,
            "Column name '{TIMESTAMP_COLUMN}' not found, please create one for sheet {sheet_index}"
        );
    }

    info!(
        sheet_index,
        row_index,
        row_number = row.row_number(),
        column = %column_name,
        "Saving updated row"
    );
    state.store.save_row(sheet_index, row).await?;

    listing(state.store.as_ref(), sheet_index, RowRange::ALL)
        .await
        .map(Json)
}

async fn listing(
    store: &dyn SpreadsheetStore,
    sheet_index: usize,
    range: RowRange,
) -> Result<RowsResponse, ApiError> {
    let set = store.get_rows(sheet_index, range).await?;
    Ok(RowsResponse::from(set))
}

fn parse_sheet_index(raw: &str) -> Result<usize, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "Sheet index '{raw}' must be a non-negative integer"
        ))
    })
}

/// RFC 1123 date as used in HTTP headers, e.g. `Tue, 15 Oct 2026 12:00:00 GMT`.
fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
