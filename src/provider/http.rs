use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::broker::{Sport, TopicKey};
use crate::config::{CricketSettings, SoccerSettings};
use crate::provider::Fetcher;
use crate::utils::error::FetchError;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; scorecast)";

/// HTTP fetcher for the ESPN soccer scoreboard and CricAPI current matches.
///
/// One connection pool is shared by all topics; each request carries the
/// timeout of its sport.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    soccer_base_url: String,
    soccer_timeout: Duration,
    cricket_url: String,
    cricket_api_key: String,
    cricket_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(soccer: &SoccerSettings, cricket: &CricketSettings) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            soccer_base_url: soccer.base_url.trim_end_matches('/').to_string(),
            soccer_timeout: Duration::from_secs(soccer.timeout_secs),
            cricket_url: cricket.url.clone(),
            cricket_api_key: cricket.api_key.clone(),
            cricket_timeout: Duration::from_secs(cricket.timeout_secs),
        })
    }

    /// Endpoint for `key`, without credentials.
    pub fn url_for(&self, key: &TopicKey) -> String {
        match key.sport() {
            Sport::Soccer => format!("{}/{}/scoreboard", self.soccer_base_url, key.feed()),
            Sport::Cricket => self.cricket_url.clone(),
        }
    }

    pub fn timeout_for(&self, sport: Sport) -> Duration {
        match sport {
            Sport::Soccer => self.soccer_timeout,
            Sport::Cricket => self.cricket_timeout,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &TopicKey) -> Result<Value, FetchError> {
        let url = self.url_for(key);
        let timeout = self.timeout_for(key.sport());

        let mut request = self.client.get(&url).timeout(timeout);
        if key.sport() == Sport::Cricket {
            request = request.query(&[("apikey", self.cricket_api_key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| request_error(&url, timeout, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| request_error(&url, timeout, source))?;
        debug!(topic = %key, bytes = body.len(), "Fetched upstream document");

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

fn request_error(url: &str, timeout: Duration, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source,
        }
    }
}
