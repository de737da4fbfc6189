//! Inbound payload normalization.
//!
//! Two generations of frontends talk to this backend, one sending camelCase
//! fields as JSON and one sending snake_case fields, sometimes form-encoded.
//! `Payload` folds both onto one lookup surface so dispatch code names every
//! accepted alias explicitly.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Parses a POST body: structured JSON first, URL-encoded key/value
    /// fallback. Anything else yields an empty payload (dispatch then fails
    /// with a structured "Invalid action" response).
    pub fn parse(raw: &str) -> Self {
        if let Ok(Value::Object(fields)) = serde_json::from_str(raw) {
            return Self { fields };
        }
        match serde_urlencoded::from_str::<HashMap<String, String>>(raw) {
            Ok(pairs) => Self::from_pairs(pairs),
            Err(e) => {
                debug!(error = %e, "Request body is neither JSON nor form-encoded");
                Self::default()
            }
        }
    }

    /// Builds a payload from already-decoded key/value pairs (GET query).
    pub fn from_pairs(pairs: HashMap<String, String>) -> Self {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Self { fields }
    }

    /// First alias that holds a usable textual value. Numbers are stringified
    /// so `"quantity": 2` and `"quantity": "2"` behave the same.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        for alias in aliases {
            match self.fields.get(*alias) {
                Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(Value::Number(n)) => return Some(n.to_string()),
                Some(Value::Bool(b)) => return Some(b.to_string()),
                _ => {}
            }
        }
        None
    }

    /// First alias that holds a number, accepting numeric strings.
    pub fn number(&self, aliases: &[&str]) -> Option<f64> {
        for alias in aliases {
            match self.fields.get(*alias) {
                Some(Value::Number(n)) => return n.as_f64(),
                Some(Value::String(s)) => {
                    if let Ok(n) = s.parse() {
                        return Some(n);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// First alias present at all, raw.
    pub fn value(&self, aliases: &[&str]) -> Option<&Value> {
        aliases.iter().find_map(|alias| self.fields.get(*alias))
    }
}
