//! Process configuration for sheetbridge.
//!
//! A [`Config`] is assembled once at startup, usually from environment
//! variables by the `sheetbridge` binary, and is read-only afterwards. It names
//! the spreadsheet document, the credentials used to reach it, the Sheets API
//! endpoint and the optional column/value allow-lists enforced on cell
//! updates.
//!
//! # Example
//!
//! ```
//! use sheetbridge_core::{AllowList, Config, Credentials};
//!
//! let config = Config::new("1AbCdEf", Credentials::AccessToken("ya29.token".into()))
//!     .with_valid_columns(AllowList::parse("Status, Notes"));
//!
//! assert!(config.validate().is_ok());
//! assert!(config.valid_columns.contains("STATUS"));
//! ```

use std::path::PathBuf;

use crate::credentials::Credentials;

/// Default base URL of the Google Sheets v4 REST API.
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

/// Errors that can occur while assembling or validating configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required setting was not provided.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// I/O error when reading a key file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service account key file is not valid JSON.
    #[error("failed to parse service account key: {0}")]
    KeyFile(#[from] serde_json::Error),

    /// The configured endpoint is not an absolute http(s) URL.
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

/// A case-insensitive allow-list parsed from a comma-separated setting.
///
/// Entries are trimmed and lowercased; empty entries are dropped, so an unset
/// or blank variable yields an empty list, which disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Parses a comma-separated list such as `open,closed`.
    pub fn parse(raw: &str) -> Self {
        Self::from_values(raw.split(','))
    }

    /// Builds an allow-list from individual entries.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            values
                .into_iter()
                .map(|value| value.as_ref().trim().to_lowercase())
                .filter(|value| !value.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the lowercased candidate is one of the entries.
    pub fn contains(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        self.0.iter().any(|entry| *entry == candidate)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The spreadsheet document ID (the long ID in the sheet URL).
    pub sheet_id: String,
    /// Credentials used to obtain bearer tokens.
    pub credentials: Credentials,
    /// Sheets API base URL without a trailing slash.
    pub endpoint: String,
    /// Columns an update may target. Empty means any column.
    pub valid_columns: AllowList,
    /// Non-numeric values an update may write. Empty means any value.
    pub valid_values: AllowList,
}

impl Config {
    /// Creates a configuration with the default endpoint and no allow-lists.
    pub fn new(sheet_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            credentials,
            endpoint: DEFAULT_SHEETS_ENDPOINT.to_string(),
            valid_columns: AllowList::default(),
            valid_values: AllowList::default(),
        }
    }

    /// Overrides the Sheets API base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_valid_columns(mut self, columns: AllowList) -> Self {
        self.valid_columns = columns;
        self
    }

    #[must_use]
    pub fn with_valid_values(mut self, values: AllowList) -> Self {
        self.valid_values = values;
        self
    }

    /// Checks that the document ID is present and the endpoint is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for an empty document ID and
    /// [`ConfigError::Endpoint`] when the endpoint is not an absolute
    /// `http`/`https` URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet_id.trim().is_empty() {
            return Err(ConfigError::Missing("SHEET_ID"));
        }

        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Endpoint(format!("{}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::Endpoint(self.endpoint.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Credentials {
        Credentials::AccessToken("token".to_string())
    }

    #[test]
    fn test_allow_list_parse_trims_lowercases_and_drops_empty_entries() {
        let list = AllowList::parse(" Open, CLOSED ,,  ");
        assert_eq!(list.entries(), ["open", "closed"]);
    }

    #[test]
    fn test_allow_list_parse_empty_string_is_empty() {
        assert!(AllowList::parse("").is_empty());
        assert!(AllowList::parse(" , ").is_empty());
    }

    #[test]
    fn test_allow_list_contains_is_case_insensitive() {
        let list = AllowList::from_values(["status"]);
        assert!(list.contains("status"));
        assert!(list.contains("STATUS"));
        assert!(!list.contains("notes"));
    }

    #[test]
    fn test_config_new_uses_default_endpoint() {
        let config = Config::new("doc", token());
        assert_eq!(config.endpoint, DEFAULT_SHEETS_ENDPOINT);
        assert!(config.valid_columns.is_empty());
        assert!(config.valid_values.is_empty());
    }

    #[test]
    fn test_with_endpoint_strips_trailing_slash() {
        let config = Config::new("doc", token()).with_endpoint(" http://localhost:9000/v4/ ");
        assert_eq!(config.endpoint, "http://localhost:9000/v4");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_sheet_id() {
        let err = Config::new("  ", token()).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SHEET_ID")));
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let err = Config::new("doc", token())
            .with_endpoint("ftp://example.com")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint(_)));

        let err = Config::new("doc", token())
            .with_endpoint("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint(_)));
    }
}
