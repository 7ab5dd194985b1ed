//! Contract for the append-only assignment log.

use crate::errors::RandError;
use crate::types::AssignmentRecord;

/// Durable, append-only sink for completed allocations.
///
/// Implementations must never update or delete a record once appended, and
/// [`LogStore::read_all_records`] must return records in append order.
pub trait LogStore: Send + Sync {
    /// Appends one record. Success means the record is durable.
    fn append_record(&self, record: &AssignmentRecord) -> Result<(), RandError>;

    /// Returns every record in append order.
    fn read_all_records(&self) -> Result<Vec<AssignmentRecord>, RandError>;
}

impl<T: LogStore + ?Sized> LogStore for &T {
    fn append_record(&self, record: &AssignmentRecord) -> Result<(), RandError> {
        (**self).append_record(record)
    }

    fn read_all_records(&self) -> Result<Vec<AssignmentRecord>, RandError> {
        (**self).read_all_records()
    }
}

impl<T: LogStore + ?Sized> LogStore for std::sync::Arc<T> {
    fn append_record(&self, record: &AssignmentRecord) -> Result<(), RandError> {
        (**self).append_record(record)
    }

    fn read_all_records(&self) -> Result<Vec<AssignmentRecord>, RandError> {
        (**self).read_all_records()
    }
}
