//! In-memory mirror of a remote collection.
//!
//! The store has no authority of its own: it is filled wholesale by a list
//! call and afterwards only patched with what the server returned for a
//! successful mutation.

use crate::api::Record;

/// A local change derived from a successful remote mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
  /// A created record goes to the front of the list
  Prepend(Record),
  /// Replace the record(s) sharing this record's id
  Replace(Record),
  /// Drop the record(s) with this id
  Remove(u64),
}

/// Owned client-side cache of records, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
  /// `None` until the first successful load
  records: Option<Vec<Record>>,
}

impl RecordStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_loaded(&self) -> bool {
    self.records.is_some()
  }

  pub fn records(&self) -> &[Record] {
    self.records.as_deref().unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.records().len()
  }

  pub fn get(&self, id: u64) -> Option<&Record> {
    self.records().iter().find(|r| r.id == id)
  }

  /// Replace the cache with a fresh list result.
  pub fn replace_all(&mut self, records: Vec<Record>) {
    self.records = Some(records);
  }

  /// Apply a mutation result to the cache.
  pub fn apply(&mut self, patch: Patch) {
    match patch {
      Patch::Prepend(record) => match &mut self.records {
        Some(records) => records.insert(0, record),
        None => self.records = Some(vec![record]),
      },
      Patch::Replace(record) => {
        if let Some(records) = &mut self.records {
          for existing in records.iter_mut().filter(|r| r.id == record.id) {
            *existing = record.clone();
          }
        }
      }
      Patch::Remove(id) => {
        if let Some(records) = &mut self.records {
          records.retain(|r| r.id != id);
        }
      }
    }
  }

  /// Records matching `query`, see [`filter_records`].
  pub fn filtered(&self, query: &str) -> Vec<&Record> {
    filter_records(self.records(), query)
  }
}

/// Records whose title or body contains `query`, ignoring case.
///
/// An empty query matches everything. Order is preserved.
pub fn filter_records<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
  if query.is_empty() {
    return records.iter().collect();
  }

  let query_lower = query.to_lowercase();
  records
    .iter()
    .filter(|record| {
      record.title.to_lowercase().contains(&query_lower)
        || record.body.to_lowercase().contains(&query_lower)
    })
    .collect()
}
