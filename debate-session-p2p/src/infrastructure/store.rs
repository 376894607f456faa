use crate::infrastructure::error::StoreError;
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use serde_json::Value;
use std::fmt;

/// Slash-separated location in the hierarchical store,
/// e.g. `rooms/{id}/participants/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &StorePath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Two paths overlap when a write at one is visible at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// One delivery on a subscription: the current value of the subscribed
/// subtree, `None` when it does not exist.
pub type Snapshot = Option<Value>;

/// Push-based watch on a subtree. The store fires it immediately with
/// the current value, then again after every change that touches the
/// subtree. Deliveries are drained by polling.
pub struct Subscription {
    path: StorePath,
    rx: UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub fn new(path: StorePath, rx: UnboundedReceiver<Snapshot>) -> Self {
        Self { path, rx }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Take everything delivered since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<Snapshot> {
        let mut snapshots = Vec::new();
        while let Ok(Some(snapshot)) = self.rx.try_next() {
            snapshots.push(snapshot);
        }
        snapshots
    }
}

/// Requested outcome of a transaction closure.
#[derive(Debug, Clone, PartialEq)]
pub enum TxResult {
    /// Replace the value at the path.
    Update(Value),
    /// Leave the store untouched.
    Abort,
}

/// What the store actually did with a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TxCommit {
    Committed(Value),
    Aborted,
}

/// The synchronized, eventually-consistent real-time store.
///
/// Writes from any client are pushed to every subscriber of the same
/// subtree; `update` applies several paths atomically; `transaction`
/// is the conditional-update primitive that closes the read-then-write
/// race on joins; `on_disconnect_remove` registers a store-side delete
/// that fires when this client's connection drops.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// One-shot read of the value at `path`.
    async fn read(&self, path: &StorePath) -> Result<Snapshot, StoreError>;

    /// Point write, replacing the subtree at `path`.
    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Atomic multi-path update; `None` deletes the path.
    async fn update(&self, changes: Vec<(StorePath, Option<Value>)>) -> Result<(), StoreError>;

    /// Point delete.
    async fn remove(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Append `value` under a store-generated child key; keys sort in
    /// creation order. Returns the generated key.
    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError>;

    /// Run `apply` against the current value and commit its result
    /// atomically, or leave the store untouched on `TxResult::Abort`.
    async fn transaction(
        &self,
        path: &StorePath,
        apply: &mut (dyn FnMut(Snapshot) -> TxResult + Send),
    ) -> Result<TxCommit, StoreError>;

    /// Watch a subtree; fires immediately with the current value.
    fn subscribe(&self, path: &StorePath) -> Subscription;

    /// Register a store-side delete of `path` for when this client's
    /// connection drops.
    async fn on_disconnect_remove(&self, path: &StorePath) -> Result<(), StoreError>;
}
