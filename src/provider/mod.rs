//! The `provider` module talks to the upstream score providers.
//!
//! Raw provider documents stay weakly typed (`serde_json::Value`) here; the
//! `normalize` module turns them into `NormalizedState` before anything
//! reaches the broker's cache or viewers.

pub mod http;
pub mod probe;

use async_trait::async_trait;
use serde_json::Value;

use crate::broker::TopicKey;
use crate::utils::error::FetchError;

pub use http::HttpFetcher;
pub use probe::{ProbeReport, probe};

/// Source of raw upstream documents, one per topic key.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &TopicKey) -> Result<Value, FetchError>;
}
