//! deskrelay-server library crate.
//!
//! The relay sits between browser viewers and one controlled host per
//! session.  Neither side can reach the other directly, so both talk HTTP to
//! the relay, which keeps the latest screen frame and the most recent control
//! snapshots for each session.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Viewer (browser)                       Controlled host
//!   │  POST controls, GET stream             │  POST image, GET controls
//!   └──────────────┐          ┌──────────────┘
//!             [deskrelay-server]
//!               ├── domain/          ServerConfig, query/response types, sniffing
//!               ├── application/     SessionRegistry, frame relay stream
//!               └── infrastructure/  axum router, ApiError, serve loop
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `deskrelay-core`, plus tokio timers.
//! - `infrastructure` depends on all other layers plus `axum`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: session state and the frame stream.
pub mod application;

/// Infrastructure layer: HTTP routes and the server loop.
pub mod infrastructure;
