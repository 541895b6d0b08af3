//! Allow-list checks applied to cell updates.

use sheetbridge_core::{AllowList, CellValue, Config};
use thiserror::Error;

/// An update that names a column or value outside the configured allow-list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyViolation {
    #[error("Must provide one of '{}' column", .allowed.join("', '"))]
    Column { allowed: Vec<String> },

    #[error("Must provide an allowed value")]
    Value,
}

/// Column and value allow-lists for `PUT /update-cell`.
///
/// An empty list disables its check.
#[derive(Debug, Clone, Default)]
pub struct UpdatePolicy {
    valid_columns: AllowList,
    valid_values: AllowList,
}

impl UpdatePolicy {
    pub fn new(valid_columns: AllowList, valid_values: AllowList) -> Self {
        Self {
            valid_columns,
            valid_values,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.valid_columns.clone(), config.valid_values.clone())
    }

    /// # Errors
    ///
    /// Returns [`PolicyViolation::Column`] when the lowercased column is not
    /// listed.
    pub fn check_column(&self, column: &str) -> Result<(), PolicyViolation> {
        if self.valid_columns.is_empty() || self.valid_columns.contains(column) {
            return Ok(());
        }
        Err(PolicyViolation::Column {
            allowed: self.valid_columns.entries().to_vec(),
        })
    }

    /// Numbers are always accepted.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyViolation::Value`] when the lowercased value is not
    /// listed.
    pub fn check_value(&self, value: &CellValue) -> Result<(), PolicyViolation> {
        if self.valid_values.is_empty()
            || value.is_number()
            || self.valid_values.contains(&value.to_string())
        {
            return Ok(());
        }
        Err(PolicyViolation::Value)
    }
}
