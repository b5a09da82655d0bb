//! Destinations for selected records.

use crate::record::Record;
use std::sync::Arc;

/// A collection that `select` appends reconstructed records to.
///
/// | collection          | elements              |
/// |---------------------|-----------------------|
/// | `Vec<T>`            | records by value      |
/// | `Vec<Arc<T>>`       | shared references     |
/// | `Option<C>`         | allocates `C` if `None` |
///
/// Existing elements are kept; new records are appended in row order.
pub trait ResultCollection: Send {
    type Record: Record + Default;

    /// Make sure storage exists; called once per select, even for zero rows.
    fn prepare(&mut self, additional: usize);

    fn push_record(&mut self, record: Self::Record);
}

impl<T: Record + Default> ResultCollection for Vec<T> {
    type Record = T;

    fn prepare(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn push_record(&mut self, record: T) {
        self.push(record);
    }
}

impl<T: Record + Default> ResultCollection for Vec<Arc<T>> {
    type Record = T;

    fn prepare(&mut self, additional: usize) {
        self.reserve(additional);
    }

    fn push_record(&mut self, record: T) {
        self.push(Arc::new(record));
    }
}

impl<C: ResultCollection + Default> ResultCollection for Option<C> {
    type Record = C::Record;

    fn prepare(&mut self, additional: usize) {
        self.get_or_insert_with(C::default).prepare(additional);
    }

    fn push_record(&mut self, record: Self::Record) {
        self.get_or_insert_with(C::default).push_record(record);
    }
}
