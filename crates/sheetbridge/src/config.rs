//! Connection settings shared by every command.
//!
//! Each flag falls back to an environment variable, and `main` loads a `.env`
//! file before parsing, so a deployment can be configured entirely from the
//! environment.

use std::path::PathBuf;

use clap::Args;
use sheetbridge_core::{Config, ConfigError, Credentials, DEFAULT_SHEETS_ENDPOINT, ServiceAccount};

/// Spreadsheet and credential flags.
///
/// Credentials are resolved in order: a static access token, then a JSON key
/// file, then an email plus PEM private key.
#[derive(Args, Clone, Default)]
pub struct SheetArgs {
    /// Spreadsheet document id (the long id in the sheet URL).
    #[arg(long, env = "SHEET_ID")]
    pub sheet_id: Option<String>,

    /// Service account email.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL")]
    pub service_account_email: Option<String>,

    /// Service account PEM private key. Literal `\n` sequences are accepted.
    #[arg(long, env = "GOOGLE_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Path to a JSON service account key file.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Pre-issued OAuth access token, used instead of a service account.
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Base URL of the Sheets v4 API.
    #[arg(long, env = "SHEETS_ENDPOINT", default_value = DEFAULT_SHEETS_ENDPOINT)]
    pub endpoint: String,
}

impl SheetArgs {
    /// Builds and validates the core configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming the first absent variable,
    /// [`ConfigError::Io`] or [`ConfigError::KeyFile`] for an unreadable key
    /// file, and [`ConfigError::Endpoint`] for a malformed endpoint.
    pub fn config(&self) -> Result<Config, ConfigError> {
        let sheet_id = non_empty(self.sheet_id.as_deref()).ok_or(ConfigError::Missing("SHEET_ID"))?;
        let config = Config::new(sheet_id, self.credentials()?).with_endpoint(&self.endpoint);
        config.validate()?;
        Ok(config)
    }

    fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(token) = non_empty(self.access_token.as_deref()) {
            return Ok(Credentials::AccessToken(token.to_string()));
        }
        if let Some(path) = &self.key_file {
            return ServiceAccount::from_key_file(path).map(Credentials::ServiceAccount);
        }

        let email = non_empty(self.service_account_email.as_deref())
            .ok_or(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_EMAIL"))?;
        let key = non_empty(self.private_key.as_deref())
            .ok_or(ConfigError::Missing("GOOGLE_PRIVATE_KEY"))?;
        Ok(Credentials::ServiceAccount(ServiceAccount::new(email, key)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
