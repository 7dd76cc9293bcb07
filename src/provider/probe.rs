use serde::Serialize;
use serde_json::Value;

use crate::broker::TopicKey;
use crate::normalize::normalize;
use crate::provider::Fetcher;

/// Health of one topic's upstream, as reported by [`probe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub topic: String,
    /// The fetch succeeded and the document has a usable match list.
    pub ok: bool,
    /// Top-level keys of the document, for shape introspection.
    pub sample_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fetches `key` once and reports whether the document is usable.
///
/// Read-only: no poller is started and the snapshot cache is not touched.
pub async fn probe(fetcher: &dyn Fetcher, key: &TopicKey) -> ProbeReport {
    let raw = match fetcher.fetch(key).await {
        Ok(raw) => raw,
        Err(err) => {
            return ProbeReport {
                topic: key.to_string(),
                ok: false,
                sample_keys: Vec::new(),
                error: Some(err.to_string()),
            };
        }
    };

    let sample_keys = match &raw {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    match normalize(key.sport(), &raw) {
        Ok(_) => ProbeReport {
            topic: key.to_string(),
            ok: true,
            sample_keys,
            error: None,
        },
        Err(err) => ProbeReport {
            topic: key.to_string(),
            ok: false,
            sample_keys,
            error: Some(err.to_string()),
        },
    }
}
