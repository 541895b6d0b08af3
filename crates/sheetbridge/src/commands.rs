//! CLI command implementations for `sheetbridge`.
//!
//! Each command module exports an `*Args` struct implementing `clap::Args`
//! and an async `run` function; `main` dispatches to them.
//!
//! - **`serve`**: Load the spreadsheet and serve the REST API
//! - **`check`**: Load the spreadsheet and print its worksheets

pub mod check;
pub mod serve;
