//! Domain layer for deskrelay-server.
//!
//! Pure types with no I/O: configuration, request/response shapes, and
//! content sniffing.  Nothing here touches `tokio` or `axum`.

pub mod config;
pub mod messages;
pub mod sniff;

pub use config::ServerConfig;
pub use messages::{ControlsBody, ControlsQuery, PostControlsBody, StatusBody};
pub use sniff::sniff_content_type;
