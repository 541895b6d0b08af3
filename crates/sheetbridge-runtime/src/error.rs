//! Mapping from request failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sheetbridge_core::SheetsError;
use thiserror::Error;
use tracing::error;

use crate::{payload::PayloadError, policy::PolicyViolation};

/// A failed request. Bodies are plain text.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The spreadsheet service failed. Logged, never shown to the client.
    #[error("Internal server error")]
    Internal(#[source] SheetsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<PolicyViolation> for ApiError {
    fn from(err: PolicyViolation) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<SheetsError> for ApiError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::SheetNotFound(index) => {
                Self::NotFound(format!("Sheet index {index} does not exist"))
            }
            other => Self::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(source) = &self {
            error!(error = %source, "Spreadsheet request failed");
        }
        (status, self.to_string()).into_response()
    }
}
