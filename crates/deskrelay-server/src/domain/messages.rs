//! HTTP message shapes for the relay endpoints.
//!
//! Response bodies live in `deskrelay_core::relay` so the host decodes
//! exactly what the relay encodes; this module adds the request-side types
//! that only the relay needs.

use serde::Deserialize;

pub use deskrelay_core::relay::{ControlsBody, PostControlsBody, StatusBody};

/// Query string of `GET /api/session/{id}/controls`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ControlsQuery {
    /// Only return snapshots stamped strictly after this time.
    pub since: Option<u64>,
}
