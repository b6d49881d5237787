use std::fmt::Write;

use rusqlite::types::Value;

use crate::error::SqlRowMapError;
use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// # Errors
/// Returns `SqlRowMapError::ParameterError` if a timestamp cannot be formatted.
pub fn row_value_to_sqlite_value(value: &RowValues) -> Result<Value, SqlRowMapError> {
    Ok(match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => {
            let mut text = String::with_capacity(32);
            write!(text, "{}", dt.format("%F %T%.f"))
                .map_err(|e| SqlRowMapError::ParameterError(format!("timestamp format: {e}")))?;
            Value::Text(text)
        }
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    })
}

/// Owned `SQLite` parameter list, ready to move onto a blocking thread.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert parameter values into `SQLite` values.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::ParameterError` if any parameter fails to convert.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlRowMapError> {
        params
            .iter()
            .map(row_value_to_sqlite_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Params)
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn converts_each_variant() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(12, 30, 5, 250)
            .unwrap();
        let params = Params::convert(&[
            RowValues::Int(7),
            RowValues::Bool(true),
            RowValues::Timestamp(ts),
            RowValues::Null,
            RowValues::JSON(serde_json::json!({"a": 1})),
        ])
        .unwrap();
        assert_eq!(
            params.as_values(),
            &[
                Value::Integer(7),
                Value::Integer(1),
                Value::Text("2024-03-09 12:30:05.250".into()),
                Value::Null,
                Value::Text("{\"a\":1}".into()),
            ]
        );
    }
}
