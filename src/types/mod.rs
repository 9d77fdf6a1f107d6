pub mod transaction;
pub mod converted;
pub mod aggregate;

use csv::StringRecord;

pub use aggregate::AggregateRecord;
pub use converted::ConvertedRecord;
pub use transaction::{EventKind, RawTransaction};

/// Stable, field-ordered encoding of a record as one checkpoint row.
///
/// `to_row` and `from_row` must round-trip: decoding an encoded row yields
/// an equal record.
pub trait CheckpointRow: Sized + Send + 'static {
    fn to_row(&self) -> Vec<String>;

    /// Decode one row, returning a human readable reason on failure.
    fn from_row(row: &StringRecord) -> std::result::Result<Self, String>;
}

pub(crate) fn field<'a>(row: &'a StringRecord, index: usize) -> std::result::Result<&'a str, String> {
    row.get(index)
        .ok_or_else(|| format!("missing field {} (row has {} fields)", index, row.len()))
}
