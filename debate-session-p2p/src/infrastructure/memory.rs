use crate::infrastructure::error::StoreError;
use crate::infrastructure::store::{Snapshot, StorePath, Subscription, SyncStore, TxCommit, TxResult};
use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// In-memory [`SyncStore`]: one JSON tree shared by every clone.
///
/// Reference implementation used by the test suite and by loopback
/// runs. It honors the store contract the coordinator relies on:
/// subscriptions fire immediately and on every overlapping change,
/// multi-path updates notify each watcher once, empty branches are
/// pruned, and push keys sort in creation order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    root: Value,
    watchers: Vec<Watcher>,
    disconnect_removals: Vec<StorePath>,
    push_seq: u64,
}

struct Watcher {
    path: StorePath,
    tx: UnboundedSender<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full tree snapshot, for assertions in tests.
    pub fn snapshot(&self) -> Value {
        self.lock().root.clone()
    }

    /// Fire the registered on-disconnect removals that lie under
    /// `prefix`, simulating this client's connection dropping.
    pub fn simulate_disconnect(&self, prefix: &StorePath) {
        let mut inner = self.lock();
        let (fired, kept): (Vec<_>, Vec<_>) = inner
            .disconnect_removals
            .drain(..)
            .partition(|path| path.starts_with(prefix));
        inner.disconnect_removals = kept;
        if fired.is_empty() {
            return;
        }
        for path in &fired {
            remove_at(&mut inner.root, path.segments());
        }
        notify(&mut inner, &fired);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> Result<Snapshot, StoreError> {
        Ok(value_at(&self.lock().root, path.segments()).cloned())
    }

    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        let mut inner = self.lock();
        apply_change(&mut inner.root, path, Some(value));
        notify(&mut inner, std::slice::from_ref(path));
        Ok(())
    }

    async fn update(&self, changes: Vec<(StorePath, Option<Value>)>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let mut touched = Vec::with_capacity(changes.len());
        for (path, value) in changes {
            apply_change(&mut inner.root, &path, value);
            touched.push(path);
        }
        notify(&mut inner, &touched);
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut inner = self.lock();
        remove_at(&mut inner.root, path.segments());
        notify(&mut inner, std::slice::from_ref(path));
        Ok(())
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, StoreError> {
        let mut inner = self.lock();
        inner.push_seq += 1;
        // Zero-padded so lexicographic key order is creation order.
        let key = format!("k{:012}", inner.push_seq);
        let child = path.child(key.clone());
        apply_change(&mut inner.root, &child, Some(value));
        notify(&mut inner, std::slice::from_ref(&child));
        Ok(key)
    }

    async fn transaction(
        &self,
        path: &StorePath,
        apply: &mut (dyn FnMut(Snapshot) -> TxResult + Send),
    ) -> Result<TxCommit, StoreError> {
        let mut inner = self.lock();
        let current = value_at(&inner.root, path.segments()).cloned();
        match apply(current) {
            TxResult::Update(value) => {
                apply_change(&mut inner.root, path, Some(value.clone()));
                notify(&mut inner, std::slice::from_ref(path));
                Ok(TxCommit::Committed(value))
            }
            TxResult::Abort => Ok(TxCommit::Aborted),
        }
    }

    fn subscribe(&self, path: &StorePath) -> Subscription {
        let (tx, rx) = unbounded();
        let mut inner = self.lock();
        // Fires immediately with the current value.
        let _ = tx.unbounded_send(value_at(&inner.root, path.segments()).cloned());
        inner.watchers.push(Watcher {
            path: path.clone(),
            tx,
        });
        Subscription::new(path.clone(), rx)
    }

    async fn on_disconnect_remove(&self, path: &StorePath) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.disconnect_removals.contains(path) {
            inner.disconnect_removals.push(path.clone());
        }
        Ok(())
    }
}

/// Deliver the value at each watcher's path, once per watcher, to every
/// watcher whose subtree overlaps a touched path. Watchers whose
/// receiver is gone are dropped.
fn notify(inner: &mut Inner, touched: &[StorePath]) {
    let root = inner.root.clone();
    inner.watchers.retain(|watcher| {
        if !touched.iter().any(|path| path.overlaps(&watcher.path)) {
            return true;
        }
        let snapshot = value_at(&root, watcher.path.segments()).cloned();
        watcher.tx.unbounded_send(snapshot).is_ok()
    });
}

fn apply_change(root: &mut Value, path: &StorePath, value: Option<Value>) {
    match value {
        // The store has no notion of a stored null.
        Some(Value::Null) | None => {
            remove_at(root, path.segments());
        }
        Some(value) => set_at(root, path.segments(), value),
    }
}

fn value_at<'tree>(root: &'tree Value, segments: &[String]) -> Option<&'tree Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn set_at(root: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *root = value;
        return;
    };
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Some(map) = root.as_object_mut() {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_at(child, rest, value);
    }
}

/// Delete the subtree at `segments`, pruning branches left empty all
/// the way up. Returns whether the node at this level became empty.
fn remove_at(root: &mut Value, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        *root = Value::Null;
        return true;
    };
    let Some(map) = root.as_object_mut() else {
        return false;
    };
    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        if remove_at(child, rest) {
            map.remove(first);
        }
    }
    if map.is_empty() {
        *root = Value::Null;
        return true;
    }
    false
}
