use std::cell::OnceCell;
use std::collections::HashMap;

use crate::types::SqlValue;

use super::row::Record;

/// Rows captured by one SELECT execution.
///
/// This is a snapshot, not a live engine cursor: the same set can be walked any
/// number of times, each walk starting again at the first row.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
    // built on the first lookup by column name
    column_indices: OnceCell<HashMap<String, usize>>,
}

impl RecordSet {
    /// Create a record set from column names and row tuples.
    ///
    /// # Arguments
    ///
    /// * `columns` - The column names, in result order
    /// * `rows` - The row tuples; each should hold one value per column
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows,
            column_indices: OnceCell::new(),
        }
    }

    /// Create an empty record set with a known capacity
    #[must_use]
    pub fn with_capacity(columns: Vec<String>, capacity: usize) -> Self {
        Self::new(columns, Vec::with_capacity(capacity))
    }

    /// Add a row to the record set
    pub fn add_row_values(&mut self, row_values: Vec<SqlValue>) {
        self.rows.push(row_values);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The record at `row_number`, or `None` past the end.
    #[must_use]
    pub fn get(&self, row_number: usize) -> Option<Record<'_>> {
        self.rows
            .get(row_number)
            .map(|values| Record::new(self, row_number, values))
    }

    /// A fresh cursor positioned at the first row.
    #[must_use]
    pub fn iter(&self) -> Records<'_> {
        Records {
            set: self,
            next_row: 0,
        }
    }

    pub(crate) fn column_index(&self, column: &str) -> Option<usize> {
        self.column_indices
            .get_or_init(|| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| (name.clone(), i))
                    .collect()
            })
            .get(column)
            .copied()
    }

    #[cfg(test)]
    pub(crate) fn column_indices_built(&self) -> bool {
        self.column_indices.get().is_some()
    }
}

/// Cursor over a [`RecordSet`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    set: &'a RecordSet,
    next_row: usize,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.set.get(self.next_row)?;
        self.next_row += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.len().saturating_sub(self.next_row);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = Record<'a>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerDbError;

    fn sample() -> RecordSet {
        RecordSet::new(
            vec!["pk".into(), "name".into()],
            vec![
                vec![SqlValue::Int(1), SqlValue::Text("design".into())],
                vec![SqlValue::Int(2), SqlValue::Text("review".into())],
            ],
        )
    }

    #[test]
    fn iteration_restarts_from_the_first_row() {
        let rs = sample();
        let first: Vec<i64> = rs.iter().map(|r| r.get(0usize).unwrap().as_int().unwrap()).collect();
        let second: Vec<i64> = (&rs)
            .into_iter()
            .map(|r| r.get(0usize).unwrap().as_int().unwrap())
            .collect();
        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
        assert_eq!(rs.iter().len(), 2);
    }

    #[test]
    fn name_lookup_builds_index_lazily() {
        let rs = sample();
        assert!(!rs.column_indices_built());
        let record = rs.get(1).unwrap();
        assert_eq!(record.get(0usize).unwrap(), &SqlValue::Int(2));
        assert!(!rs.column_indices_built());
        assert_eq!(record.get("name").unwrap().as_text(), Some("review"));
        assert!(rs.column_indices_built());
    }

    #[test]
    fn unknown_columns_do_not_exist() {
        let rs = sample();
        let record = rs.get(0).unwrap();
        assert!(matches!(
            record.get("missing"),
            Err(TrackerDbError::DoesNotExist { kind: "field", .. })
        ));
        assert!(matches!(
            record.get(7usize),
            Err(TrackerDbError::DoesNotExist { .. })
        ));
        assert!(rs.get(2).is_none());
    }
}
