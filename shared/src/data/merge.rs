//! Merging fetched batches into history

use crate::models::{compare_dates, Series};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Merge `incoming` into `previous`.
///
/// A record whose date is already known is updated field by field, an unknown
/// date is appended. Nothing is ever removed. The result is sorted ascending by
/// date, and merging the same batch twice gives the same series as merging it
/// once.
///
/// Duplicate dates inside `incoming` all land on the same record, in batch
/// order, so the last one wins per field.
pub fn merge(mut previous: Series, incoming: Series) -> Series {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(previous.len());
    for (i, record) in previous.iter().enumerate() {
        index.entry(record.date_key()).or_insert(i);
    }

    for record in incoming {
        match index.entry(record.date_key()) {
            Entry::Occupied(slot) => previous[*slot.get()].update(record),
            Entry::Vacant(slot) => {
                slot.insert(previous.len());
                previous.push(record);
            }
        }
    }

    previous.sort_by(|a, b| compare_dates(a.date(), b.date()));
    previous
}
