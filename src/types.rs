use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TrackerDbError;

/// Opaque primary key naming one stored row.
pub type Oid = i64;

/// Declared type of a statement parameter or a requested column conversion.
///
/// Booleans are stored as `CHAR(1)` holding `'Y'` or `'N'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlDataType {
    Integer,
    Real,
    String,
    Boolean,
    Timestamp,
}

/// Values that can be bound to a parameter or read from a record.
///
/// ```rust
/// use tracker_sql::prelude::*;
///
/// let values = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("alice".into()),
///     SqlValue::Bool(true),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SqlValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    #[default]
    Null,
    /// Binary data (only ever produced by an engine, never bound)
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let SqlValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(value) => Some(*value),
            SqlValue::Int(1) => Some(true),
            SqlValue::Int(0) => Some(false),
            SqlValue::Text(s) if s == "Y" => Some(true),
            SqlValue::Text(s) if s == "N" => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    /// Convert a raw engine value to the requested type. NULL always stays NULL.
    ///
    /// # Errors
    /// Returns `TrackerDbError::ParameterError` if the value cannot represent `data_type`.
    pub fn convert(&self, data_type: SqlDataType) -> Result<SqlValue, TrackerDbError> {
        if self.is_null() {
            return Ok(SqlValue::Null);
        }
        let converted = match data_type {
            SqlDataType::Integer => match self {
                SqlValue::Int(i) => Some(SqlValue::Int(*i)),
                SqlValue::Text(s) => s.trim().parse().ok().map(SqlValue::Int),
                SqlValue::Bool(b) => Some(SqlValue::Int(i64::from(*b))),
                _ => None,
            },
            SqlDataType::Real => match self {
                SqlValue::Text(s) => s.trim().parse().ok().map(SqlValue::Float),
                other => other.as_float().map(SqlValue::Float),
            },
            SqlDataType::String => match self {
                SqlValue::Text(s) => Some(SqlValue::Text(s.clone())),
                SqlValue::Int(i) => Some(SqlValue::Text(i.to_string())),
                SqlValue::Float(f) => Some(SqlValue::Text(f.to_string())),
                SqlValue::Bool(b) => Some(SqlValue::Text(if *b { "Y" } else { "N" }.into())),
                SqlValue::Timestamp(dt) => Some(SqlValue::Text(dt.format("%F %T%.f").to_string())),
                _ => None,
            },
            SqlDataType::Boolean => self.as_bool().map(SqlValue::Bool),
            SqlDataType::Timestamp => self.as_timestamp().map(SqlValue::Timestamp),
        };
        converted.ok_or_else(|| {
            TrackerDbError::ParameterError(format!("cannot convert {self:?} to {data_type:?}"))
        })
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_read_from_char_flags() {
        assert_eq!(SqlValue::Text("Y".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("N".into()).as_bool(), Some(false));
        assert_eq!(SqlValue::Int(1).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("maybe".into()).as_bool(), None);
    }

    #[test]
    fn null_survives_any_conversion() {
        for ty in [
            SqlDataType::Integer,
            SqlDataType::Real,
            SqlDataType::String,
            SqlDataType::Boolean,
            SqlDataType::Timestamp,
        ] {
            assert_eq!(SqlValue::Null.convert(ty).unwrap(), SqlValue::Null);
        }
    }

    #[test]
    fn text_converts_to_numbers() {
        assert_eq!(
            SqlValue::Text(" 42 ".into()).convert(SqlDataType::Integer).unwrap(),
            SqlValue::Int(42)
        );
        assert!(SqlValue::Text("x".into()).convert(SqlDataType::Integer).is_err());
    }

    #[test]
    fn option_maps_none_to_null() {
        let v: SqlValue = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: SqlValue = Some("a").into();
        assert_eq!(v, SqlValue::Text("a".into()));
    }
}
