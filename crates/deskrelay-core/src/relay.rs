//! JSON bodies exchanged with the relay's HTTP endpoints.
//!
//! The relay serializes these and the host deserializes them, so both ends
//! share one definition.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::snapshot::ControlSnapshot;

/// Path prefix for every session endpoint.
pub const SESSION_PATH: &str = "/api/session";

/// `{"status":"ok"}`, returned by image uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    pub fn ok() -> Self {
        StatusBody {
            status: "ok".to_owned(),
        }
    }
}

/// Response to a control post: the status plus the stamp the relay assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostControlsBody {
    pub status: String,
    pub time: u64,
}

impl PostControlsBody {
    pub fn ok(time: u64) -> Self {
        PostControlsBody {
            status: "ok".to_owned(),
            time,
        }
    }
}

/// Response to a control fetch.
///
/// The relay always sends an array in ascending `time` order.  Decoding
/// also accepts a single snapshot object or `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlsBody {
    #[serde(default, deserialize_with = "one_or_many")]
    pub controls: Vec<ControlSnapshot>,
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ControlSnapshot>, D::Error> {
    let v = Value::deserialize(d)?;
    let items = match v {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    };
    // A non-object entry is skipped rather than failing the whole batch.
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Relative path of a session endpoint, e.g. `session_path("abc", "controls")`.
pub fn session_path(session_id: &str, endpoint: &str) -> String {
    format!("{SESSION_PATH}/{session_id}/{endpoint}")
}
