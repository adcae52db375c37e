//! # Ablage Client Library
//!
//! Client engine for an Ablage file drop server: upload files one after
//! another with live progress, list them, delete them.
//!
//! ## Architecture
//!
//! The engine is built using:
//! - **Tokio**: Async runtime; one upload in flight at a time, periodic refresh timers
//! - **Reqwest**: HTTP client with streamed multipart uploads
//! - **Serde**: JSON for the server's config and list endpoints
//! - **Tracing**: Structured logging
//!
//! ## Core Components
//!
//! - [`sanitize`]: Filename sanitization matching the server's stored names
//! - [`validation`]: Pre-upload checks of a whole selection
//! - [`transfer`]: Sequential batch upload and progress/speed/ETA math
//! - [`directory`]: File listing reconciliation and delete
//! - [`config_cache`]: The server-provided mode flags and endpoints
//! - [`api`]: The HTTP seam ([`api::RemoteStore`]) and its `reqwest` implementation
//! - [`app`]: Wiring of the components, upload/delete flows, refresh timers
//! - [`view`]: Pure projection of the state into a view model
//! - [`state`]: Shared client context
//! - [`config`]: Local settings
//! - [`error`]: Error taxonomy
//! - [`metrics`]: Session counters

pub mod api;
pub mod app;
pub mod config;
pub mod config_cache;
pub mod directory;
pub mod error;
pub mod format;
pub mod metrics;
pub mod notice;
pub mod sanitize;
pub mod state;
pub mod transfer;
pub mod types;
pub mod validation;
pub mod view;

#[cfg(test)]
mod tests;
