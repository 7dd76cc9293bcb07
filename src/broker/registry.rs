//! Poller registry
//!
//! The registry is the single writer of "does a poller exist for this key".
//! Every mutation happens inside one short critical section on a std mutex:
//! no network I/O and no awaits are ever performed while it is held, so the
//! lock is safe to take from both the subscription path and poller tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::broker::topic::TopicKey;

/// Ownership record of one running poller task.
#[derive(Debug)]
pub struct PollerHandle {
    pub key: TopicKey,
    /// Distinguishes successive pollers for the same key.
    pub generation: u64,
    pub started_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[derive(Debug, Default)]
pub struct PollerRegistry {
    pollers: Mutex<HashMap<TopicKey, PollerHandle>>,
    next_generation: AtomicU64,
    launched: AtomicU64,
}

impl PollerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches a poller for `key` unless a live one is already registered.
    ///
    /// `start` receives the generation assigned to the new poller and must
    /// only spawn the task. It runs inside the critical section, so two
    /// concurrent callers can never both launch. A registered task that has
    /// already terminated (it panicked) is replaced.
    ///
    /// Returns `true` when a new poller was launched.
    pub fn ensure_poller<F>(&self, key: &TopicKey, start: F) -> bool
    where
        F: FnOnce(u64) -> JoinHandle<()>,
    {
        let mut pollers = self.lock();

        if let Some(existing) = pollers.get(key) {
            if existing.is_running() {
                return false;
            }
            warn!(
                topic = %key,
                generation = existing.generation,
                "Poller task ended unexpectedly, relaunching"
            );
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let task = start(generation);
        pollers.insert(
            key.clone(),
            PollerHandle {
                key: key.clone(),
                generation,
                started_at: Utc::now(),
                task,
            },
        );
        self.launched.fetch_add(1, Ordering::Relaxed);
        debug!(topic = %key, generation, "Poller registered");
        true
    }

    /// Called by a poller between cycles when idle shutdown is enabled.
    ///
    /// Returns `true` when the poller must exit: either `is_idle` reported no
    /// viewers (the entry is removed in the same critical section) or the
    /// registry no longer tracks this generation.
    pub fn retire_if_idle<F>(&self, key: &TopicKey, generation: u64, is_idle: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut pollers = self.lock();

        match pollers.get(key) {
            Some(handle) if handle.generation == generation => {
                if is_idle() {
                    pollers.remove(key);
                    true
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    /// Cancels the poller for `key`. Returns `false` if none was registered.
    pub fn stop(&self, key: &TopicKey) -> bool {
        match self.lock().remove(key) {
            Some(handle) => {
                handle.task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every poller, returning how many were registered.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<PollerHandle> = self.lock().drain().map(|(_, handle)| handle).collect();
        for handle in &drained {
            handle.task.abort();
        }
        drained.len()
    }

    pub fn is_running(&self, key: &TopicKey) -> bool {
        self.lock().get(key).is_some_and(PollerHandle::is_running)
    }

    pub fn generation(&self, key: &TopicKey) -> Option<u64> {
        self.lock().get(key).map(|handle| handle.generation)
    }

    /// Number of registered pollers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total pollers ever launched by this registry.
    pub fn launched(&self) -> u64 {
        self.launched.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TopicKey, PollerHandle>> {
        self.pollers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
