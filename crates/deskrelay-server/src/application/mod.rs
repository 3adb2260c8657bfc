//! Application layer for deskrelay-server.
//!
//! Owns the relay's state and the logic that reads it:
//!
//! - `registry`: the per-session store of the latest frame and recent
//!   control snapshots, with idle eviction.
//! - `frame_relay`: turns a session's latest frame into a multipart stream.
//!
//! Nothing here knows about routes, extractors, or status codes; that is the
//! infrastructure layer.

pub mod frame_relay;
pub mod registry;

pub use frame_relay::{encode_part, frame_stream, stream_content_type};
pub use registry::{SessionEntry, SessionRegistry};
