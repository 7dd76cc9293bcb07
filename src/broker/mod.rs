//! The `broker` module is the core of `scorecast`: topic keys, the poller
//! registry, the snapshot cache, the poller loop and the subscription entry
//! points that tie them together.

pub mod audience;
pub mod cache;
pub mod engine;
pub mod message;
pub mod poller;
pub mod registry;
pub mod snapshot;
pub mod topic;

pub use audience::{Audience, ViewerId};
pub use cache::{CacheEntry, SnapshotCache};
pub use engine::Broker;
pub use message::UpdatePayload;
pub use poller::PollOptions;
pub use registry::PollerRegistry;
pub use snapshot::{MatchSnapshot, NormalizedState, Score, Scorecard, TeamCard};
pub use topic::{Sport, TopicKey, TopicResolver, TopicSelector};
