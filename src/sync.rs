//! Remote collection with a locally patched cache.
//!
//! `Collection` fires list/create/update/delete calls as independent tokio
//! tasks and hands back a [`Ticket`]. Results come back over a channel and
//! are applied in [`Collection::poll`], which the UI calls from its event
//! loop tick. Every cache write happens on the UI thread, so the store needs
//! no locking.
//!
//! ```ignore
//! let mut posts = Collection::new("posts", Arc::new(client));
//! posts.load();
//! let ticket = posts.create(RecordFields::new("Hello", "World"));
//!
//! // In event loop tick
//! for done in posts.poll() {
//!     if done.ticket == ticket { /* close the form */ }
//! }
//! ```

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{Operation, Record, RecordFields, RecordSource};
use crate::store::{Patch, RecordStore};

/// Identifies one submitted operation
pub type Ticket = u64;

/// State of the most recent list load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  /// No load has been started
  Idle,
  Loading,
  Loaded,
  /// The last load failed; the cache keeps whatever it had before
  Failed(String),
}

/// A finished operation, reported once by [`Collection::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
  pub ticket: Ticket,
  pub operation: Operation,
  /// Generic, operation-specific error message on failure
  pub error: Option<String>,
}

impl Completion {
  pub fn is_success(&self) -> bool {
    self.error.is_none()
  }
}

/// What a successful remote call returned
#[derive(Debug)]
enum Reply {
  Listed(Vec<Record>),
  Created(Record),
  Updated(Record),
  Deleted(u64),
}

impl Reply {
  fn operation(&self) -> Operation {
    match self {
      Reply::Listed(_) => Operation::List,
      Reply::Created(_) => Operation::Create,
      Reply::Updated(_) => Operation::Update,
      Reply::Deleted(_) => Operation::Delete,
    }
  }
}

#[derive(Debug)]
struct Finished {
  ticket: Ticket,
  operation: Operation,
  result: Result<Reply, String>,
}

/// One remote collection and its local cache.
pub struct Collection {
  resource: String,
  source: Arc<dyn RecordSource>,
  store: RecordStore,
  load_state: LoadState,
  /// Ticket of the load whose result will be accepted
  current_load: Option<Ticket>,
  next_ticket: Ticket,
  pending: usize,
  tx: mpsc::UnboundedSender<Finished>,
  rx: mpsc::UnboundedReceiver<Finished>,
}

impl Collection {
  pub fn new(resource: impl Into<String>, source: Arc<dyn RecordSource>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      resource: resource.into(),
      source,
      store: RecordStore::new(),
      load_state: LoadState::Idle,
      current_load: None,
      next_ticket: 1,
      pending: 0,
      tx,
      rx,
    }
  }

  pub fn resource(&self) -> &str {
    &self.resource
  }

  pub fn store(&self) -> &RecordStore {
    &self.store
  }

  pub fn records(&self) -> &[Record] {
    self.store.records()
  }

  pub fn get(&self, id: u64) -> Option<&Record> {
    self.store.get(id)
  }

  /// Cached records matching `query` (title or body, case-insensitive).
  pub fn filtered(&self, query: &str) -> Vec<&Record> {
    self.store.filtered(query)
  }

  pub fn load_state(&self) -> &LoadState {
    &self.load_state
  }

  pub fn is_loading(&self) -> bool {
    self.load_state == LoadState::Loading
  }

  pub fn load_error(&self) -> Option<&str> {
    match &self.load_state {
      LoadState::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// Whether any operation is still in flight.
  pub fn is_pending(&self) -> bool {
    self.pending > 0
  }

  /// Fetch the whole collection. A newer load supersedes an in-flight one.
  pub fn load(&mut self) -> Ticket {
    let future = self.source.list();
    let ticket = self.spawn(Operation::List, async move {
      future.await.map(Reply::Listed)
    });
    self.current_load = Some(ticket);
    self.load_state = LoadState::Loading;
    ticket
  }

  pub fn create(&mut self, fields: RecordFields) -> Ticket {
    let future = self.source.create(fields);
    self.spawn(Operation::Create, async move {
      future.await.map(Reply::Created)
    })
  }

  pub fn update(&mut self, id: u64, fields: RecordFields) -> Ticket {
    let future = self.source.update(id, fields);
    self.spawn(Operation::Update, async move {
      // Keyed by the requested id no matter what the source reports
      future.await.map(|record| Reply::Updated(Record { id, ..record }))
    })
  }

  pub fn delete(&mut self, id: u64) -> Ticket {
    let future = self.source.delete(id);
    self.spawn(Operation::Delete, async move {
      future.await.map(|_| Reply::Deleted(id))
    })
  }

  /// Apply finished operations to the cache.
  ///
  /// Returns one completion per finished operation, in arrival order.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> Vec<Completion> {
    let mut completed = Vec::new();

    while let Ok(finished) = self.rx.try_recv() {
      self.pending = self.pending.saturating_sub(1);
      if let Some(completion) = self.finish(finished) {
        completed.push(completion);
      }
    }

    completed
  }

  fn finish(&mut self, finished: Finished) -> Option<Completion> {
    let Finished {
      ticket,
      operation,
      result,
    } = finished;

    if operation == Operation::List && self.current_load != Some(ticket) {
      debug!(resource = %self.resource, ticket, "discarding superseded load");
      return None;
    }

    let error = match result {
      Ok(reply) => {
        debug_assert_eq!(reply.operation(), operation);
        self.apply(reply);
        None
      }
      Err(error) => {
        if operation == Operation::List {
          self.load_state = LoadState::Failed(error.clone());
        }
        Some(error)
      }
    };

    if operation == Operation::List {
      self.current_load = None;
    }

    Some(Completion {
      ticket,
      operation,
      error,
    })
  }

  fn apply(&mut self, reply: Reply) {
    match reply {
      Reply::Listed(records) => {
        info!(resource = %self.resource, count = records.len(), "collection loaded");
        self.store.replace_all(records);
        self.load_state = LoadState::Loaded;
      }
      Reply::Created(record) => {
        info!(resource = %self.resource, id = record.id, "record created");
        self.store.apply(Patch::Prepend(record));
      }
      Reply::Updated(record) => {
        info!(resource = %self.resource, id = record.id, "record updated");
        self.store.apply(Patch::Replace(record));
      }
      Reply::Deleted(id) => {
        info!(resource = %self.resource, id, "record deleted");
        self.store.apply(Patch::Remove(id));
      }
    }
  }

  fn spawn<Fut>(&mut self, operation: Operation, future: Fut) -> Ticket
  where
    Fut: std::future::Future<Output = color_eyre::Result<Reply>> + Send + 'static,
  {
    let ticket = self.next_ticket;
    self.next_ticket += 1;
    self.pending += 1;

    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = future.await.map_err(|e| e.to_string());
      // Ignore send errors - the collection may have been dropped
      let _ = tx.send(Finished {
        ticket,
        operation,
        result,
      });
    });

    ticket
  }
}

impl std::fmt::Debug for Collection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Collection")
      .field("resource", &self.resource)
      .field("load_state", &self.load_state)
      .field("records", &self.store.len())
      .field("pending", &self.pending)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::source::fake::FakeSource;
  use futures::future::BoxFuture;
  use futures::FutureExt;
  use std::time::Duration;

  fn record(id: u64, title: &str, body: &str) -> Record {
    Record {
      id,
      title: title.to_string(),
      body: body.to_string(),
    }
  }

  /// Poll until at least `n` completions arrived.
  async fn settle(collection: &mut Collection, n: usize) -> Vec<Completion> {
    let mut done = Vec::new();
    for _ in 0..200 {
      done.extend(collection.poll());
      if done.len() >= n && !collection.is_pending() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    done
  }

  async fn loaded(records: Vec<Record>) -> (Collection, FakeSource) {
    let source = FakeSource::with_records(records);
    let mut collection = Collection::new("posts", Arc::new(source.clone()));
    collection.load();
    settle(&mut collection, 1).await;
    (collection, source)
  }

  #[tokio::test]
  async fn test_load_replaces_cache() {
    let (collection, _) = loaded(vec![record(1, "A", "x"), record(2, "B", "y")]).await;
    assert_eq!(collection.load_state(), &LoadState::Loaded);
    assert_eq!(collection.records().len(), 2);
  }

  #[tokio::test]
  async fn test_load_failure_leaves_cache_unset() {
    let source = FakeSource::default();
    source.set_failing(true);
    let mut collection = Collection::new("posts", Arc::new(source));

    collection.load();
    assert!(collection.is_loading());
    let done = settle(&mut collection, 1).await;

    assert_eq!(done.len(), 1);
    assert_eq!(done[0].operation, Operation::List);
    assert!(!done[0].is_success());
    assert!(collection.load_error().is_some());
    assert!(!collection.store().is_loaded());
  }

  #[tokio::test]
  async fn test_reload_failure_keeps_last_known_good() {
    let (mut collection, source) = loaded(vec![record(1, "A", "x")]).await;
    source.set_failing(true);

    collection.load();
    settle(&mut collection, 1).await;

    assert!(collection.load_error().is_some());
    assert_eq!(collection.records(), &[record(1, "A", "x")]);
  }

  #[tokio::test]
  async fn test_create_prepends() {
    let (mut collection, _) = loaded(vec![record(1, "A", "x")]).await;

    let ticket = collection.create(RecordFields::new("B", "y"));
    let done = settle(&mut collection, 1).await;

    assert_eq!(done[0].ticket, ticket);
    assert!(done[0].is_success());
    assert_eq!(collection.records().len(), 2);
    assert_eq!(collection.records()[0], record(2, "B", "y"));
  }

  #[tokio::test]
  async fn test_update_replaces_matching_record() {
    let (mut collection, _) = loaded(vec![record(1, "A", "x"), record(2, "B", "y")]).await;

    collection.update(2, RecordFields::new("B2", "y2"));
    settle(&mut collection, 1).await;

    assert_eq!(
      collection.records(),
      &[record(1, "A", "x"), record(2, "B2", "y2")]
    );
  }

  /// Serves a fixed list and answers every update with id 101,
  /// like jsonplaceholder does for created records.
  struct WrongIdSource(Vec<Record>);

  impl RecordSource for WrongIdSource {
    fn list(&self) -> BoxFuture<'static, color_eyre::Result<Vec<Record>>> {
      let records = self.0.clone();
      async move { Ok(records) }.boxed()
    }

    fn create(&self, fields: RecordFields) -> BoxFuture<'static, color_eyre::Result<Record>> {
      self.update(101, fields)
    }

    fn update(
      &self,
      _id: u64,
      fields: RecordFields,
    ) -> BoxFuture<'static, color_eyre::Result<Record>> {
      async move {
        Ok(Record {
          id: 101,
          title: fields.title,
          body: fields.body,
        })
      }
      .boxed()
    }

    fn delete(&self, _id: u64) -> BoxFuture<'static, color_eyre::Result<()>> {
      async { Ok(()) }.boxed()
    }
  }

  #[tokio::test]
  async fn test_update_keeps_requested_id() {
    let source = WrongIdSource(vec![record(5, "A", "x"), record(6, "B", "y")]);
    let mut collection = Collection::new("posts", Arc::new(source));
    collection.load();
    settle(&mut collection, 1).await;

    collection.update(5, RecordFields::new("A2", "x2"));
    let done = settle(&mut collection, 1).await;

    assert!(done[0].is_success());
    assert_eq!(
      collection.records(),
      &[record(5, "A2", "x2"), record(6, "B", "y")]
    );
    assert!(collection.get(101).is_none());
  }

  #[tokio::test]
  async fn test_update_unknown_id_leaves_cache() {
    let (mut collection, _) = loaded(vec![record(1, "A", "x")]).await;

    collection.update(9, RecordFields::new("Z", "z"));
    let done = settle(&mut collection, 1).await;

    assert!(done[0].is_success());
    assert_eq!(collection.records(), &[record(1, "A", "x")]);
  }

  #[tokio::test]
  async fn test_delete_then_create() {
    let (mut collection, _) = loaded(vec![record(1, "A", "x")]).await;

    collection.delete(1);
    settle(&mut collection, 1).await;
    assert!(collection.records().is_empty());

    collection.create(RecordFields::new("B", "y"));
    settle(&mut collection, 1).await;
    assert_eq!(collection.records(), &[record(2, "B", "y")]);
  }

  #[tokio::test]
  async fn test_failed_mutations_leave_cache_identical() {
    let (mut collection, source) = loaded(vec![record(1, "A", "x"), record(2, "B", "y")]).await;
    let before = collection.store().clone();
    source.set_failing(true);

    collection.create(RecordFields::new("C", "z"));
    collection.update(1, RecordFields::new("A2", "x2"));
    collection.delete(2);
    let done = settle(&mut collection, 3).await;

    assert_eq!(done.len(), 3);
    assert_eq!(collection.store(), &before);
    assert!(done.iter().all(|c| !c.is_success()));
    // Mutation failures never mark the list as failed
    assert_eq!(collection.load_state(), &LoadState::Loaded);
  }

  #[tokio::test]
  async fn test_newer_load_supersedes_older() {
    let source = FakeSource::with_records(vec![record(1, "A", "x")]);
    source.set_delay(Duration::from_millis(20));
    let mut collection = Collection::new("posts", Arc::new(source.clone()));

    let first = collection.load();
    let second = collection.load();
    let done = settle(&mut collection, 1).await;

    assert_eq!(done.len(), 1);
    assert_eq!(done[0].ticket, second);
    assert_ne!(first, second);
    assert_eq!(collection.load_state(), &LoadState::Loaded);
  }

  #[tokio::test]
  async fn test_tickets_are_unique_and_pending_tracks_flight() {
    let source = FakeSource::default();
    source.set_delay(Duration::from_millis(10));
    let mut collection = Collection::new("posts", Arc::new(source));

    let a = collection.create(RecordFields::new("a", "a"));
    let b = collection.create(RecordFields::new("b", "b"));
    assert_ne!(a, b);
    assert!(collection.is_pending());

    settle(&mut collection, 2).await;
    assert!(!collection.is_pending());
    assert_eq!(collection.records().len(), 2);
  }
}
