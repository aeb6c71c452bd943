use crate::time::parse_instant;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

/// What the monitor remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistedState {
    pub last_shortcode: Option<String>,
    pub last_dt_iso: Option<DateTime<FixedOffset>>,
    pub bootstrapped: bool,
    pub last_notified_date: Option<String>,
}

impl PersistedState {
    /// Builds a state from an untrusted JSON document.
    ///
    /// Each field present, non-null and well-typed overrides the default. Anything else keeps the
    /// default, so one bad field never discards the rest of the record.
    pub fn merge_from_json(doc: &Value) -> Self {
        let mut out = Self::default();
        let Some(obj) = doc.as_object() else {
            tracing::warn!("state document is not a JSON object; using defaults");
            return out;
        };

        match obj.get("last_shortcode") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if !s.trim().is_empty() => {
                out.last_shortcode = Some(s.clone());
            }
            Some(other) => {
                tracing::warn!(value = %other, "ignoring invalid last_shortcode in state");
            }
        }

        match obj.get("last_dt_iso") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => match parse_instant(s) {
                Some(at) => out.last_dt_iso = Some(at),
                None => tracing::warn!(value = %s, "ignoring unparseable last_dt_iso in state"),
            },
            Some(other) => {
                tracing::warn!(value = %other, "ignoring invalid last_dt_iso in state");
            }
        }

        match obj.get("bootstrapped") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => out.bootstrapped = *b,
            Some(other) => {
                tracing::warn!(value = %other, "ignoring invalid bootstrapped in state");
            }
        }

        match obj.get("last_notified_date") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => out.last_notified_date = Some(s.clone()),
            Some(other) => {
                tracing::warn!(value = %other, "ignoring invalid last_notified_date in state");
            }
        }

        out
    }
}
