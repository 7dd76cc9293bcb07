//! The `error` module defines the error types used within `scorecast`.
//!
//! None of these errors ever reach a viewer. They are produced at the
//! upstream boundary (fetching and normalizing provider documents) and are
//! absorbed by the poller at the cycle boundary, where they are logged and
//! the cached snapshot keeps serving.

use std::time::Duration;

use reqwest::StatusCode;

/// Failure to obtain a raw document from an upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection or protocol level failure.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The request did not complete within the per-sport timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    /// The provider answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    /// The body was not valid JSON.
    #[error("response body from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A document whose overall shape cannot be normalized at all.
///
/// Malformed individual records never produce this error; they are skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Why a single poll cycle produced no new snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}
