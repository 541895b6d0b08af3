//! HTTP surface of sheetbridge.
//!
//! Exposes one spreadsheet as a small REST API on an axum [`Router`]:
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | GET | `/sheets` | - |
//! | GET | `/rows`, `/rows/{sheetIndex}` | - (`limit`, `offset` query) |
//! | POST | `/add-rows` | `{sheetIndex?, headers, rows}` |
//! | PUT | `/update-cell` | `{sheetIndex?, columnName, value, rowIndex}` |
//! | GET | `/health` | - |
//!
//! The spreadsheet is reached through an injected
//! [`SpreadsheetStore`](sheetbridge_core::SpreadsheetStore), so the same
//! routes serve a live Google document or an in-memory one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::Router;
//! use sheetbridge_core::{CellValue, MemorySpreadsheet};
//! use sheetbridge_runtime::{AppState, UpdatePolicy, register_routes};
//!
//! let store = MemorySpreadsheet::new("Tasks").with_worksheet(
//!     "Sheet1",
//!     ["name", "status", "time"],
//!     vec![vec![CellValue::from("alpha"), CellValue::from("open")]],
//! );
//! let router = register_routes(
//!     Router::new(),
//!     AppState::new(Arc::new(store), UpdatePolicy::default()),
//! );
//! ```
//!
//! [`Router`]: axum::Router

mod error;
mod payload;
mod policy;
mod response;
mod routes;

pub use error::ApiError;
pub use payload::{AddRowsRequest, PayloadError, UpdateCellRequest};
pub use policy::{PolicyViolation, UpdatePolicy};
pub use response::{RowsResponse, SheetsResponse};
pub use routes::{AppState, TIMESTAMP_COLUMN, register_routes, routes};
