//! Helper utilities for testing and development.

use crate::results::RecordSet;
use crate::types::SqlValue;

/// Create a record set with the given column names and rows.
#[must_use]
pub fn create_test_record_set(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> RecordSet {
    RecordSet::new(columns.iter().map(|c| (*c).to_owned()).collect(), rows)
}

/// A single-row record set, the shape a proxy reload expects.
#[must_use]
pub fn single_row(columns: &[&str], values: Vec<SqlValue>) -> RecordSet {
    create_test_record_set(columns, vec![values])
}
