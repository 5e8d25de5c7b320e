mod result_set;
mod row;

pub use result_set::{RecordSet, Records};
pub use row::{ColumnKey, Record};
