use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::broker::engine::Shared;
use crate::broker::message::UpdatePayload;
use crate::broker::topic::TopicKey;
use crate::config::PollerSettings;
use crate::normalize::normalize;
use crate::utils::error::CycleError;

/// Timing and lifecycle policy shared by all pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// Retire a poller once its topic has no members.
    pub idle_shutdown: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            idle_shutdown: false,
        }
    }
}

impl From<&PollerSettings> for PollOptions {
    fn from(settings: &PollerSettings) -> Self {
        Self {
            interval: settings.interval(),
            idle_shutdown: settings.idle_shutdown,
        }
    }
}

/// The fetch, normalize, cache, broadcast loop for one topic key.
pub(crate) struct Poller {
    key: TopicKey,
    generation: u64,
    shared: Arc<Shared>,
}

impl Poller {
    pub(crate) fn new(key: TopicKey, generation: u64, shared: Arc<Shared>) -> Self {
        Self {
            key,
            generation,
            shared,
        }
    }

    pub(crate) async fn run(self) {
        info!(topic = %self.key, generation = self.generation, "Poller started");

        loop {
            match AssertUnwindSafe(self.cycle()).catch_unwind().await {
                Ok(Ok(matches)) => {
                    debug!(topic = %self.key, matches, "Published snapshot");
                }
                Ok(Err(err)) => {
                    warn!(topic = %self.key, error = %err, "Poll cycle failed, keeping cached snapshot");
                }
                Err(panic) => {
                    error!(
                        topic = %self.key,
                        generation = self.generation,
                        panic = %panic_message(panic.as_ref()),
                        "Poller crashed, stopping it"
                    );
                    return;
                }
            }

            if self.shared.options.idle_shutdown && self.retire_if_idle() {
                info!(topic = %self.key, generation = self.generation, "No viewers left, poller retired");
                return;
            }

            tokio::time::sleep(self.shared.options.interval).await;
        }
    }

    /// One cycle. The cache is only written after a fully successful fetch
    /// and normalization, and the broadcast always carries what was written.
    async fn cycle(&self) -> Result<usize, CycleError> {
        let raw = self.shared.fetcher.fetch(&self.key).await?;
        let state = normalize(self.key.sport(), &raw)?;

        let entry = self.shared.cache.put(self.key.clone(), state);
        let payload = UpdatePayload::snapshot(&self.key, &entry.state);
        self.shared.audience.broadcast(&self.key, &payload);

        Ok(payload.matches.len())
    }

    fn retire_if_idle(&self) -> bool {
        let audience = &self.shared.audience;
        self.shared
            .registry
            .retire_if_idle(&self.key, self.generation, || {
                audience.member_count(&self.key) == 0
            })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
