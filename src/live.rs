//! Live queries: a watcher receives a fresh snapshot of its query after
//! every write to the collection it watches, until its handle is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError, Weak};

use serde_json::Value;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::store::{Collection, Document, Query};

type Callback = Box<dyn FnMut(Vec<Value>) + Send>;

struct Watcher {
    id: u64,
    query: Query,
    /// Set by every write to `query.collection`, cleared before each re-query.
    stale: AtomicBool,
    closed: AtomicBool,
    callback: Mutex<Callback>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    watchers: Vec<Arc<Watcher>>,
}

#[derive(Default)]
pub(crate) struct LiveQueries {
    registry: Arc<Mutex<Registry>>,
}

/// Handle for a live query. Dropping it unsubscribes.
#[must_use = "dropping a Subscription stops its snapshots"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut guard) = registry.lock() else {
            return;
        };
        guard.watchers.retain(|w| {
            if w.id == self.id {
                w.closed.store(true, Ordering::SeqCst);
                false
            } else {
                true
            }
        });
        tracing::debug!(subscription = self.id, "Live query closed");
    }
}

impl Database {
    /// Delivers the current snapshot right away, then again after each write
    /// to `query.collection`. Callbacks for one watcher never overlap; a write
    /// made while a callback runs is delivered as soon as it returns.
    pub fn watch_raw(
        &self,
        query: Query,
        callback: impl FnMut(Vec<Value>) + Send + 'static,
    ) -> Result<Subscription> {
        let watcher = {
            let mut registry = self.live.registry.lock().map_err(|_| Error::LockPoisoned)?;
            registry.next_id += 1;
            let watcher = Arc::new(Watcher {
                id: registry.next_id,
                query,
                stale: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                callback: Mutex::new(Box::new(callback)),
            });
            registry.watchers.push(watcher.clone());
            watcher
        };
        tracing::debug!(
            subscription = watcher.id,
            collection = watcher.query.collection.as_str(),
            "Live query opened"
        );

        let subscription = Subscription {
            id: watcher.id,
            registry: Arc::downgrade(&self.live.registry),
        };
        // Registered before the first query, so no write can fall between the two.
        self.refresh(&watcher)?;
        Ok(subscription)
    }

    /// Typed variant of [`Database::watch_raw`]. Documents that no longer
    /// decode as `D` are logged and left out of the snapshot.
    pub fn watch<D: Document + 'static>(
        &self,
        query: Query,
        mut callback: impl FnMut(Vec<D>) + Send + 'static,
    ) -> Result<Subscription> {
        if query.collection != D::COLLECTION {
            return Err(Error::validation(format!(
                "Cannot watch {} as {}",
                query.collection.as_str(),
                D::COLLECTION.as_str()
            )));
        }

        self.watch_raw(query, move |snapshot| {
            let docs = snapshot
                .into_iter()
                .filter_map(|value| {
                    serde_json::from_value(value)
                        .map_err(|e| tracing::warn!("Skipping malformed {} document: {e}", D::COLLECTION.as_str()))
                        .ok()
                })
                .collect();
            callback(docs)
        })
    }

    pub(crate) fn notify(&self, collection: Collection) {
        let watchers: Vec<Arc<Watcher>> = match self.live.registry.lock() {
            Ok(registry) => registry
                .watchers
                .iter()
                .filter(|w| w.query.collection == collection)
                .cloned()
                .collect(),
            Err(_) => {
                tracing::warn!("Live query registry poisoned, skipping notification");
                return;
            }
        };

        for watcher in watchers {
            watcher.stale.store(true, Ordering::SeqCst);
            if let Err(e) = self.refresh(&watcher) {
                tracing::warn!(subscription = watcher.id, "Live query refresh failed: {e}");
            }
        }
    }

    /// Re-runs the watcher's query until it is no longer stale. If another
    /// thread is already delivering to this watcher, that thread picks up
    /// the stale flag instead.
    fn refresh(&self, watcher: &Watcher) -> Result<()> {
        loop {
            let mut callback = match watcher.callback.try_lock() {
                Ok(callback) => callback,
                Err(TryLockError::WouldBlock) => return Ok(()),
                Err(TryLockError::Poisoned(_)) => return Err(Error::LockPoisoned),
            };

            while watcher.stale.swap(false, Ordering::SeqCst) {
                if watcher.closed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                let snapshot = self.query_raw(&watcher.query)?;
                (*callback)(snapshot);
            }
            drop(callback);

            // A write may have marked it stale between the last check and the unlock.
            if !watcher.stale.load(Ordering::SeqCst) {
                return Ok(());
            }
        }
    }
}
