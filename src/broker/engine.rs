use std::sync::Arc;

use tracing::info;

use crate::broker::audience::{Audience, ViewerId};
use crate::broker::cache::{CacheEntry, SnapshotCache};
use crate::broker::message::UpdatePayload;
use crate::broker::poller::{PollOptions, Poller};
use crate::broker::registry::PollerRegistry;
use crate::broker::topic::{TopicKey, TopicResolver, TopicSelector};
use crate::provider::{Fetcher, ProbeReport, probe};

/// State reachable from the subscription path and from every poller task.
pub(crate) struct Shared {
    pub(crate) resolver: TopicResolver,
    pub(crate) registry: PollerRegistry,
    pub(crate) cache: SnapshotCache,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) audience: Arc<dyn Audience>,
    pub(crate) options: PollOptions,
}

/// Represents the broker between upstream pollers and connected viewers.
///
/// The broker owns the poller registry and the snapshot cache. It resolves
/// each subscription to a topic key, makes sure exactly one poller runs per
/// key, replays the cached snapshot to joining viewers, and lets each poller
/// broadcast fresh snapshots to its topic's audience.
///
/// Cloning is cheap; all clones share the same registry and cache. The
/// subscription methods must be called from within a Tokio runtime since
/// they may spawn a poller task.
#[derive(Clone)]
pub struct Broker {
    shared: Arc<Shared>,
}

impl Broker {
    pub fn new(
        resolver: TopicResolver,
        fetcher: Arc<dyn Fetcher>,
        audience: Arc<dyn Audience>,
        options: PollOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                resolver,
                registry: PollerRegistry::new(),
                cache: SnapshotCache::new(),
                fetcher,
                audience,
                options,
            }),
        }
    }

    pub fn resolve(&self, selector: &TopicSelector) -> TopicKey {
        self.shared.resolver.resolve(selector)
    }

    /// Subscribes a viewer to a topic.
    ///
    /// Joins the viewer to the topic's audience, starts the topic's poller if
    /// none is running, then sends the viewer either the cached snapshot or a
    /// placeholder saying the first fetch is in progress.
    pub fn subscribe(&self, viewer: &ViewerId, selector: &TopicSelector) -> TopicKey {
        let key = self.resolve(selector);

        self.shared.audience.join(viewer, &key);
        let started = self.ensure_poller(&key);

        let payload = match self.shared.cache.get(&key) {
            Some(entry) => UpdatePayload::snapshot(&key, &entry.state),
            None => UpdatePayload::placeholder(&key),
        };
        self.shared.audience.send_to(viewer, &key, &payload);

        info!(
            viewer = %viewer,
            topic = %key,
            poller_started = started,
            replayed = !payload.is_placeholder(),
            "Viewer subscribed"
        );
        key
    }

    /// Removes a viewer from a topic's audience. The poller and the cached
    /// snapshot are left in place.
    pub fn unsubscribe(&self, viewer: &ViewerId, selector: &TopicSelector) -> TopicKey {
        let key = self.resolve(selector);
        self.shared.audience.leave(viewer, &key);
        info!(viewer = %viewer, topic = %key, "Viewer unsubscribed");
        key
    }

    fn ensure_poller(&self, key: &TopicKey) -> bool {
        let shared = Arc::clone(&self.shared);
        self.shared.registry.ensure_poller(key, |generation| {
            tokio::spawn(Poller::new(key.clone(), generation, shared).run())
        })
    }

    /// Cancels the poller for `key`; the next subscription starts a new one.
    pub fn stop(&self, key: &TopicKey) -> bool {
        let stopped = self.shared.registry.stop(key);
        if stopped {
            info!(topic = %key, "Poller stopped");
        }
        stopped
    }

    /// Cancels every poller.
    pub fn shutdown(&self) {
        let stopped = self.shared.registry.stop_all();
        info!(pollers = stopped, "Broker shut down");
    }

    /// The cached snapshot for `key`, if any cycle has succeeded yet.
    pub fn snapshot(&self, key: &TopicKey) -> Option<CacheEntry> {
        self.shared.cache.get(key)
    }

    pub fn is_polling(&self, key: &TopicKey) -> bool {
        self.shared.registry.is_running(key)
    }

    pub fn active_pollers(&self) -> usize {
        self.shared.registry.len()
    }

    /// Total pollers launched since the broker was created.
    pub fn pollers_launched(&self) -> u64 {
        self.shared.registry.launched()
    }

    /// Fetches the topic once without touching pollers or the cache.
    pub async fn probe(&self, selector: &TopicSelector) -> ProbeReport {
        let key = self.resolve(selector);
        probe(self.shared.fetcher.as_ref(), &key).await
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("options", &self.shared.options)
            .field("pollers", &self.shared.registry.len())
            .field("cached_topics", &self.shared.cache.len())
            .finish()
    }
}
