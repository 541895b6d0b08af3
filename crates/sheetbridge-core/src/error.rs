//! Error type shared by every spreadsheet backend.

use reqwest::StatusCode;

/// Errors returned while talking to a spreadsheet backend.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SheetsError {
    /// Transport-level failure (connect, TLS, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Sheets API answered with a non-success status.
    #[error("Google Sheets API request failed ({status}): {body}")]
    Api { status: StatusCode, body: String },

    /// Credential exchange or token signing failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No worksheet exists at the requested position.
    #[error("sheet index {0} does not exist")]
    SheetNotFound(usize),

    /// A worksheet holds data rows but its first row is blank.
    #[error("no values in the header row of sheet '{0}'")]
    MissingHeaderRow(String),

    /// A request URL could not be built from the configured endpoint.
    #[error("invalid request url: {0}")]
    Url(String),

    /// JSON encoding of a request failed.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// An in-process lock was poisoned by a panicking writer.
    #[error("spreadsheet state lock poisoned")]
    LockPoisoned,
}

impl SheetsError {
    /// Returns `true` when the error was caused by the caller addressing a
    /// worksheet that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SheetNotFound(_))
    }
}
