//! Request bodies for the mutating routes.
//!
//! Bodies are taken as raw bytes and validated field by field so that every
//! failure names the offending property. Checks run in a fixed order and the
//! first failure wins.

use serde_json::{Map, Value};
use sheetbridge_core::{CellValue, RowMap};
use thiserror::Error;

const POST: &str = "POST";
const PUT: &str = "PUT";

/// A request body that failed validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("Missing {method} body")]
    MissingBody { method: &'static str },

    #[error("{method} body is not valid JSON: {reason}")]
    InvalidJson {
        method: &'static str,
        reason: String,
    },

    #[error("{method} body must be a JSON object")]
    NotAnObject { method: &'static str },

    #[error("{method} body is present, but empty - Is 'content-type' header set?")]
    EmptyBody { method: &'static str },

    #[error("Missing required property '{property}' in {method} body")]
    MissingProperty {
        method: &'static str,
        property: &'static str,
    },

    #[error("Property '{property}' in {method} body {expected}")]
    InvalidProperty {
        method: &'static str,
        property: &'static str,
        expected: &'static str,
    },
}

/// Validated `POST /add-rows` body.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRowsRequest {
    pub sheet_index: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl AddRowsRequest {
    /// Parses and validates a raw body.
    ///
    /// # Errors
    ///
    /// Returns the first [`PayloadError`] found: body shape, then `headers`,
    /// then `rows`, then `sheetIndex`.
    pub fn parse(body: &[u8]) -> Result<Self, PayloadError> {
        let fields = Fields::parse(POST, body)?;

        let headers = fields
            .required("headers")?
            .as_array()
            .and_then(|headers| {
                headers
                    .iter()
                    .map(|header| header.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| fields.invalid("headers", "must be an array of strings"))?;

        let rows = fields
            .required("rows")?
            .as_array()
            .and_then(|rows| rows.iter().map(row_cells).collect::<Option<Vec<_>>>())
            .ok_or_else(|| {
                fields.invalid(
                    "rows",
                    "must be an array of arrays of strings, numbers, booleans or nulls",
                )
            })?;

        Ok(Self {
            sheet_index: fields.sheet_index()?,
            headers,
            rows,
        })
    }

    /// Zips every row against the headers by position.
    ///
    /// Each mapping holds one key per distinct header. Short rows are padded
    /// with [`CellValue::Null`], extra values are dropped, and a repeated
    /// header keeps its last value.
    pub fn row_maps(&self) -> Vec<RowMap> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .enumerate()
                    .map(|(position, header)| {
                        (header.clone(), row.get(position).cloned().unwrap_or_default())
                    })
                    .collect()
            })
            .collect()
    }
}

fn row_cells(row: &Value) -> Option<Vec<CellValue>> {
    row.as_array()?
        .iter()
        .map(|cell| match cell {
            Value::Array(_) | Value::Object(_) => None,
            scalar => Some(CellValue::from_json(scalar.clone())),
        })
        .collect()
}

/// Validated `PUT /update-cell` body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCellRequest {
    pub sheet_index: usize,
    pub column_name: String,
    /// Either [`CellValue::String`] or [`CellValue::Number`].
    pub value: CellValue,
    pub row_index: usize,
}

impl UpdateCellRequest {
    /// Parses and validates a raw body.
    ///
    /// `rowIndex` and `sheetIndex` accept JSON integers as well as strings
    /// holding one.
    ///
    /// # Errors
    ///
    /// Returns the first [`PayloadError`] found: body shape, then
    /// `columnName`, `value`, `rowIndex` and `sheetIndex` in that order.
    pub fn parse(body: &[u8]) -> Result<Self, PayloadError> {
        let fields = Fields::parse(PUT, body)?;

        let column_name = fields
            .required("columnName")?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| fields.invalid("columnName", "must be a string"))?;

        let value = match fields.required("value")? {
            value @ (Value::String(_) | Value::Number(_)) => CellValue::from_json(value.clone()),
            _ => return Err(fields.invalid("value", "must be a string or a number")),
        };

        let row_index = coerce_index(fields.required("rowIndex")?)
            .ok_or_else(|| fields.invalid("rowIndex", "must be a non-negative integer"))?;

        Ok(Self {
            sheet_index: fields.sheet_index()?,
            column_name,
            value,
            row_index,
        })
    }
}

/// A body known to be a non-empty JSON object.
struct Fields {
    method: &'static str,
    map: Map<String, Value>,
}

impl Fields {
    fn parse(method: &'static str, body: &[u8]) -> Result<Self, PayloadError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PayloadError::MissingBody { method });
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|err| PayloadError::InvalidJson {
                method,
                reason: err.to_string(),
            })?;
        let Value::Object(map) = value else {
            return Err(PayloadError::NotAnObject { method });
        };
        if map.is_empty() {
            return Err(PayloadError::EmptyBody { method });
        }

        Ok(Self { method, map })
    }

    // An explicit `null` counts as absent.
    fn required(&self, property: &'static str) -> Result<&Value, PayloadError> {
        match self.map.get(property) {
            None | Some(Value::Null) => Err(PayloadError::MissingProperty {
                method: self.method,
                property,
            }),
            Some(value) => Ok(value),
        }
    }

    fn invalid(&self, property: &'static str, expected: &'static str) -> PayloadError {
        PayloadError::InvalidProperty {
            method: self.method,
            property,
            expected,
        }
    }

    fn sheet_index(&self) -> Result<usize, PayloadError> {
        match self.map.get("sheetIndex") {
            None | Some(Value::Null) => Ok(0),
            Some(value) => coerce_index(value)
                .ok_or_else(|| self.invalid("sheetIndex", "must be a non-negative integer")),
        }
    }
}

fn coerce_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(body: &str) -> Result<UpdateCellRequest, PayloadError> {
        UpdateCellRequest::parse(body.as_bytes())
    }

    #[test]
    fn test_empty_body_is_missing() {
        assert_eq!(
            update("  ").unwrap_err(),
            PayloadError::MissingBody { method: "PUT" }
        );
        assert_eq!(
            AddRowsRequest::parse(b"").unwrap_err().to_string(),
            "Missing POST body"
        );
    }

    #[test]
    fn test_empty_object_hints_at_content_type() {
        assert_eq!(
            update("{}").unwrap_err().to_string(),
            "PUT body is present, but empty - Is 'content-type' header set?"
        );
    }

    #[test]
    fn test_malformed_and_non_object_bodies() {
        assert!(matches!(
            update("{not json").unwrap_err(),
            PayloadError::InvalidJson { method: "PUT", .. }
        ));
        assert_eq!(
            update("[1, 2]").unwrap_err(),
            PayloadError::NotAnObject { method: "PUT" }
        );
    }

    #[test]
    fn test_update_fields_checked_in_order() {
        assert_eq!(
            update(r#"{"value": "x", "rowIndex": 0}"#)
                .unwrap_err()
                .to_string(),
            "Missing required property 'columnName' in PUT body"
        );
        assert_eq!(
            update(r#"{"columnName": "status", "rowIndex": 0}"#)
                .unwrap_err()
                .to_string(),
            "Missing required property 'value' in PUT body"
        );
        assert_eq!(
            update(r#"{"columnName": "status", "value": "x"}"#)
                .unwrap_err()
                .to_string(),
            "Missing required property 'rowIndex' in PUT body"
        );
    }

    #[test]
    fn test_null_property_counts_as_missing() {
        assert_eq!(
            update(r#"{"columnName": null, "value": "x", "rowIndex": 0}"#).unwrap_err(),
            PayloadError::MissingProperty {
                method: "PUT",
                property: "columnName"
            }
        );
    }

    #[test]
    fn test_update_parses_and_coerces_indices() {
        let request =
            update(r#"{"columnName": "status", "value": 42, "rowIndex": "3", "sheetIndex": 1}"#)
                .unwrap();
        assert_eq!(
            request,
            UpdateCellRequest {
                sheet_index: 1,
                column_name: "status".to_string(),
                value: CellValue::Number(42.0),
                row_index: 3,
            }
        );

        let request = update(r#"{"columnName": "status", "value": "open", "rowIndex": 0}"#).unwrap();
        assert_eq!(request.sheet_index, 0);
        assert_eq!(request.value, CellValue::from("open"));
    }

    #[test]
    fn test_update_rejects_bad_types() {
        assert_eq!(
            update(r#"{"columnName": "status", "value": true, "rowIndex": 0}"#)
                .unwrap_err()
                .to_string(),
            "Property 'value' in PUT body must be a string or a number"
        );
        assert_eq!(
            update(r#"{"columnName": "status", "value": "x", "rowIndex": -1}"#)
                .unwrap_err()
                .to_string(),
            "Property 'rowIndex' in PUT body must be a non-negative integer"
        );
        assert!(matches!(
            update(r#"{"columnName": "status", "value": "x", "rowIndex": 1.5}"#).unwrap_err(),
            PayloadError::InvalidProperty {
                property: "rowIndex",
                ..
            }
        ));
        assert!(matches!(
            update(r#"{"columnName": 7, "value": "x", "rowIndex": 1}"#).unwrap_err(),
            PayloadError::InvalidProperty {
                property: "columnName",
                ..
            }
        ));
        assert!(matches!(
            update(r#"{"columnName": "a", "value": "x", "rowIndex": 1, "sheetIndex": "one"}"#)
                .unwrap_err(),
            PayloadError::InvalidProperty {
                property: "sheetIndex",
                ..
            }
        ));
    }

    #[test]
    fn test_add_rows_requires_headers_then_rows() {
        assert_eq!(
            AddRowsRequest::parse(br#"{"rows": []}"#)
                .unwrap_err()
                .to_string(),
            "Missing required property 'headers' in POST body"
        );
        assert_eq!(
            AddRowsRequest::parse(br#"{"headers": ["a"]}"#)
                .unwrap_err()
                .to_string(),
            "Missing required property 'rows' in POST body"
        );
        assert!(matches!(
            AddRowsRequest::parse(br#"{"headers": ["a"], "rows": [[{"x": 1}]]}"#).unwrap_err(),
            PayloadError::InvalidProperty {
                property: "rows",
                ..
            }
        ));
        assert!(matches!(
            AddRowsRequest::parse(br#"{"headers": "a", "rows": []}"#).unwrap_err(),
            PayloadError::InvalidProperty {
                property: "headers",
                ..
            }
        ));
    }

    #[test]
    fn test_row_maps_zip_positionally() {
        let request = AddRowsRequest::parse(
            br#"{"sheetIndex": 2, "headers": ["name", "status", "count"],
                 "rows": [["alpha", "open", 3], ["beta"], ["gamma", "done", 1, "extra"]]}"#,
        )
        .unwrap();
        assert_eq!(request.sheet_index, 2);

        let maps = request.row_maps();
        assert_eq!(maps.len(), 3);
        for map in &maps {
            assert_eq!(
                map.keys().map(String::as_str).collect::<Vec<_>>(),
                ["count", "name", "status"]
            );
        }
        assert_eq!(maps[0]["count"], CellValue::Number(3.0));
        assert_eq!(maps[1]["status"], CellValue::Null);
        assert_eq!(maps[2]["status"], CellValue::from("done"));
    }

    #[test]
    fn test_row_maps_repeated_header_keeps_last_value() {
        let request =
            AddRowsRequest::parse(br#"{"headers": ["a", "a"], "rows": [["first", "second"]]}"#)
                .unwrap();
        let maps = request.row_maps();
        assert_eq!(maps[0].len(), 1);
        assert_eq!(maps[0]["a"], CellValue::from("second"));
    }
}
