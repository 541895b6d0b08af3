//! Spreadsheet access for the sheetbridge REST proxy.
//!
//! This crate owns everything below the HTTP layer: configuration and
//! allow-lists, Google credentials, the positional row model, and the
//! [`SpreadsheetStore`] trait with its two implementations.
//!
//! # Key Components
//!
//! - **Configuration**: [`Config`] bundles the sheet id, [`Credentials`] and
//!   the column/value [`AllowList`]s
//! - **Credentials**: [`ServiceAccount`] signs RS256 assertions and
//!   [`TokenSource`] caches the resulting bearer tokens
//! - **Row model**: [`Row`] and [`RowSet`] address cells by header name and
//!   rows by A1 row number
//! - **Backends**: [`GoogleSpreadsheet`] talks to the Sheets v4 API and
//!   [`MemorySpreadsheet`] keeps worksheets in process
//!
//! # Example
//!
//! ```no_run
//! use sheetbridge_core::{Config, Credentials, GoogleSpreadsheet, RowRange, SpreadsheetStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("spreadsheet-id", Credentials::AccessToken("token".into()));
//! let document = GoogleSpreadsheet::connect(&config).await?;
//!
//! let rows = document.get_rows(0, RowRange::ALL).await?;
//! println!("{} rows under {:?}", rows.len(), rows.headers);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod credentials;
mod error;
mod google;
mod memory;
mod row;
mod store;
mod types;
mod value;

pub use config::{AllowList, Config, ConfigError, DEFAULT_SHEETS_ENDPOINT};
pub use credentials::{AccessToken, Credentials, DEFAULT_TOKEN_URI, ServiceAccount, TokenSource};
pub use error::SheetsError;
pub use google::GoogleSpreadsheet;
pub use memory::MemorySpreadsheet;
pub use row::{Row, RowRange, RowSet};
pub use store::{DocumentInfo, SpreadsheetStore, WorksheetInfo};
pub use value::{CellValue, RowMap};
