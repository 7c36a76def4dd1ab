//! Debounced write queue for draft answers.
//!
//! UI clients send a save per input pause; persisting every keystroke would
//! hammer the datastore. `SaveScheduler` accepts (key, value) pairs,
//! coalesces writes to the same key within a delay window, and guarantees
//! at most one in-flight write per key. `flush` bypasses the delay for an
//! explicit Save action.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type SaveFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;
type SaveFn<K, V> = Arc<dyn Fn(K, V) -> SaveFuture + Send + Sync>;

struct Entry<V> {
    /// Latest value not yet handed to a write. Taken when a write starts.
    latest: Option<V>,
    /// Bumped on every schedule/flush; stale timers check it and give up.
    epoch: u64,
    in_flight: bool,
    /// A timer fired (or flush arrived) while a write was in flight.
    rearm: bool,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Entry { latest: None, epoch: 0, in_flight: false, rearm: false }
    }
}

struct Inner<K, V> {
    delay: Duration,
    save: SaveFn<K, V>,
    state: Mutex<HashMap<K, Entry<V>>>,
}

/// Cheaply cloneable handle; clones share the same queue.
pub struct SaveScheduler<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for SaveScheduler<K, V> {
    fn clone(&self) -> Self {
        SaveScheduler { inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> SaveScheduler<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F>(delay: Duration, save: F) -> Self
    where
        F: Fn(K, V) -> SaveFuture + Send + Sync + 'static,
    {
        SaveScheduler {
            inner: Arc::new(Inner {
                delay,
                save: Arc::new(save),
                state: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Record a new value for `key` and (re)start its debounce timer.
    /// A newer call within the delay window replaces the value and pushes
    /// the write out again.
    pub fn schedule(&self, key: K, value: V) {
        let epoch = {
            let mut state = self.inner.state.lock().expect("scheduler lock poisoned");
            let entry = state.entry(key.clone()).or_default();
            entry.latest = Some(value);
            entry.epoch += 1;
            entry.epoch
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            fire(&inner, key, Some(epoch)).await;
        });
    }

    /// Write the pending value for `key` immediately, bypassing the delay.
    /// No-op when nothing is pending.
    pub async fn flush(&self, key: K) {
        {
            // Invalidate outstanding timers for this key.
            let mut state = self.inner.state.lock().expect("scheduler lock poisoned");
            if let Some(entry) = state.get_mut(&key) {
                entry.epoch += 1;
            } else {
                return;
            }
        }
        fire(&self.inner, key, None).await;
    }

    /// Number of keys with a value waiting to be written.
    pub fn pending_count(&self) -> usize {
        let state = self.inner.state.lock().expect("scheduler lock poisoned");
        state.values().filter(|e| e.latest.is_some()).count()
    }
}

async fn fire<K, V>(inner: &Arc<Inner<K, V>>, key: K, expected_epoch: Option<u64>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let value = {
        let mut state = inner.state.lock().expect("scheduler lock poisoned");
        let Some(entry) = state.get_mut(&key) else { return };
        if let Some(epoch) = expected_epoch {
            if entry.epoch != epoch {
                // A newer schedule or a flush superseded this timer.
                return;
            }
        }
        if entry.in_flight {
            entry.rearm = true;
            return;
        }
        let Some(value) = entry.latest.take() else { return };
        entry.in_flight = true;
        value
    };

    let result = (inner.save)(key.clone(), value.clone()).await;

    let rearm = {
        let mut state = inner.state.lock().expect("scheduler lock poisoned");
        let Some(entry) = state.get_mut(&key) else { return };
        entry.in_flight = false;
        if let Err(e) = &result {
            log::warn!("Debounced save failed, value kept for retry: {e}");
            // Unless a newer value already arrived, keep the failed one
            // so a later flush can retry it.
            if entry.latest.is_none() {
                entry.latest = Some(value);
            }
        }
        let rearm = entry.rearm && entry.latest.is_some();
        entry.rearm = false;
        rearm
    };

    if rearm {
        // A write arrived while this one was in flight; run it now.
        Box::pin(fire(inner, key, None)).await;
    }
}
