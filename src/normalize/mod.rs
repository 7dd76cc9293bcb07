//! Per-sport normalization of raw provider documents.
//!
//! Normalizers are pure. A record that cannot be read is logged and skipped
//! while its siblings are kept; only a document without any usable match
//! list is rejected as a whole.

mod cricket;
mod soccer;

use serde_json::Value;

use crate::broker::{NormalizedState, Sport};
use crate::utils::error::NormalizeError;

pub use cricket::normalize_cricket;
pub use soccer::normalize_soccer;

pub fn normalize(sport: Sport, raw: &Value) -> Result<NormalizedState, NormalizeError> {
    match sport {
        Sport::Soccer => normalize_soccer(raw),
        Sport::Cricket => normalize_cricket(raw),
    }
}

/// Upstream ids are strings for some providers and numbers for others.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Renders a scalar the way a viewer expects to read it: strings without
/// quotes, null as nothing.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
