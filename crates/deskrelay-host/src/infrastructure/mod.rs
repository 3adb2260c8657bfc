//! Infrastructure layer for the controlled host.
//!
//! Contains the OS- and network-facing adapters behind the application
//! layer's traits.
//!
//! # Sub-modules
//!
//! - **`input_driver`** – [`input_driver::InputDriver`] backends: `xdotool`
//!   per event, or one persistent PowerShell process fed JSON lines.
//! - **`relay_client`** – `reqwest` client for the relay's session endpoints.
//! - **`capture`** – screen capture by running an external command.
//! - **`compress`** – optional downscale and re-encode with the `image` crate.
//! - **`config`** – [`config::HostConfig`] and the persisted session id.

pub mod capture;
pub mod compress;
pub mod config;
pub mod input_driver;
pub mod relay_client;
