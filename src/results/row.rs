use crate::error::TrackerDbError;
use crate::types::{SqlDataType, SqlValue};

use super::result_set::RecordSet;

/// Column address: 0-based position or column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'k> {
    Index(usize),
    Name(&'k str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'k> From<&'k str> for ColumnKey<'k> {
    fn from(name: &'k str) -> Self {
        ColumnKey::Name(name)
    }
}

impl std::fmt::Display for ColumnKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKey::Index(i) => write!(f, "{i}"),
            ColumnKey::Name(name) => f.write_str(name),
        }
    }
}

/// One row of a [`RecordSet`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    set: &'a RecordSet,
    row_number: usize,
    values: &'a [SqlValue],
}

impl<'a> Record<'a> {
    pub(super) fn new(set: &'a RecordSet, row_number: usize, values: &'a [SqlValue]) -> Self {
        Self {
            set,
            row_number,
            values,
        }
    }

    /// Position of this record within its set.
    #[must_use]
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    #[must_use]
    pub fn values(&self) -> &'a [SqlValue] {
        self.values
    }

    /// Get a value by column position or name.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DoesNotExist` for an unknown name or an index
    /// out of range.
    pub fn get<'k>(&self, key: impl Into<ColumnKey<'k>>) -> Result<&'a SqlValue, TrackerDbError> {
        let key = key.into();
        let index = match key {
            ColumnKey::Index(i) => Some(i),
            ColumnKey::Name(name) => self.set.column_index(name),
        };
        index
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| TrackerDbError::DoesNotExist {
                kind: "field",
                key: key.to_string(),
            })
    }

    /// Get a value converted to `data_type`; NULL stays NULL.
    ///
    /// # Errors
    /// Returns `TrackerDbError::DoesNotExist` for an unknown column and
    /// `TrackerDbError::ParameterError` if the value does not convert.
    pub fn get_as<'k>(
        &self,
        key: impl Into<ColumnKey<'k>>,
        data_type: SqlDataType,
    ) -> Result<SqlValue, TrackerDbError> {
        self.get(key)?.convert(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_converts_flags() {
        let rs = RecordSet::new(
            vec!["enabled".into(), "note".into()],
            vec![vec![SqlValue::Text("Y".into()), SqlValue::Null]],
        );
        let record = rs.get(0).unwrap();
        assert_eq!(
            record.get_as("enabled", SqlDataType::Boolean).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            record.get_as("note", SqlDataType::String).unwrap(),
            SqlValue::Null
        );
        assert!(record.get_as(0usize, SqlDataType::Integer).is_err());
    }
}
