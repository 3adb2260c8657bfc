//! Infrastructure layer for deskrelay-server.
//!
//! Everything that touches the network: the axum router and its handlers,
//! the HTTP error mapping, and the serve loop with its idle-session sweeper.
//!
//! # What does NOT belong here?
//!
//! - Session storage and stream encoding (that is the application layer)
//! - Configuration and message types (that is the domain layer)
//! - CLI parsing (that is done in `main.rs`)

pub mod error;
pub mod http;

pub use error::ApiError;
pub use http::{router, run_server, AppState};
