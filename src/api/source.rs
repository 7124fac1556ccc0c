//! The seam between the cache and whatever serves the records.

use color_eyre::Result;
use futures::future::BoxFuture;

use super::types::{Record, RecordFields};

/// The four remote calls a collection supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  List,
  Create,
  Update,
  Delete,
}

impl Operation {
  /// Generic error reported for a failed call; the underlying cause is only logged.
  pub fn failure_message(&self, resource: &str) -> String {
    match self {
      Operation::List => format!("Failed to fetch {}", resource),
      Operation::Create => "Create request failed".to_string(),
      Operation::Update => "Update request failed".to_string(),
      Operation::Delete => "Delete request failed".to_string(),
    }
  }

  /// Past-tense verb for success notifications
  pub fn past_tense(&self) -> &'static str {
    match self {
      Operation::List => "loaded",
      Operation::Create => "created",
      Operation::Update => "updated",
      Operation::Delete => "deleted",
    }
  }
}

/// A remote collection of records.
///
/// Futures are `'static` so callers can move them into spawned tasks.
pub trait RecordSource: Send + Sync {
  /// Fetch the whole collection
  fn list(&self) -> BoxFuture<'static, Result<Vec<Record>>>;

  /// Create a record; the returned record carries the server-assigned id
  fn create(&self, fields: RecordFields) -> BoxFuture<'static, Result<Record>>;

  /// Replace the record with `id`; the returned record always has `id`
  fn update(&self, id: u64, fields: RecordFields) -> BoxFuture<'static, Result<Record>>;

  /// Delete the record with `id`
  fn delete(&self, id: u64) -> BoxFuture<'static, Result<()>>;
}

#[cfg(test)]
pub mod fake {
  //! In-memory source for exercising the cache without a network.

  use super::*;
  use color_eyre::eyre::eyre;
  use futures::FutureExt;
  use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
  use std::sync::{Arc, Mutex};
  use std::time::Duration;

  #[derive(Clone, Default)]
  pub struct FakeSource {
    inner: Arc<Inner>,
  }

  #[derive(Default)]
  struct Inner {
    records: Mutex<Vec<Record>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    delay_ms: AtomicU64,
  }

  impl FakeSource {
    pub fn with_records(records: Vec<Record>) -> Self {
      let next = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
      let source = Self::default();
      *source.inner.records.lock().unwrap() = records;
      source.inner.next_id.store(next, Ordering::SeqCst);
      source
    }

    pub fn set_failing(&self, failing: bool) {
      self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
      self
        .inner
        .delay_ms
        .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
      if self.inner.failing.load(Ordering::SeqCst) {
        Err(eyre!("connection refused"))
      } else {
        Ok(())
      }
    }

    fn delay(&self) -> Duration {
      Duration::from_millis(self.inner.delay_ms.load(Ordering::SeqCst))
    }
  }

  impl RecordSource for FakeSource {
    fn list(&self) -> BoxFuture<'static, Result<Vec<Record>>> {
      let result = self
        .check()
        .map(|_| self.inner.records.lock().unwrap().clone());
      let delay = self.delay();
      async move {
        tokio::time::sleep(delay).await;
        result
      }
      .boxed()
    }

    fn create(&self, fields: RecordFields) -> BoxFuture<'static, Result<Record>> {
      let result = self.check().map(|_| Record {
        id: self.inner.next_id.fetch_add(1, Ordering::SeqCst),
        title: fields.title,
        body: fields.body,
      });
      let delay = self.delay();
      async move {
        tokio::time::sleep(delay).await;
        result
      }
      .boxed()
    }

    fn update(&self, id: u64, fields: RecordFields) -> BoxFuture<'static, Result<Record>> {
      let result = self.check().map(|_| Record {
        id,
        title: fields.title,
        body: fields.body,
      });
      let delay = self.delay();
      async move {
        tokio::time::sleep(delay).await;
        result
      }
      .boxed()
    }

    fn delete(&self, _id: u64) -> BoxFuture<'static, Result<()>> {
      let result = self.check();
      let delay = self.delay();
      async move {
        tokio::time::sleep(delay).await;
        result
      }
      .boxed()
    }
  }
}
