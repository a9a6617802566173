//! # Orrery - Digital Twin Viewer Service
//!
//! A Rust service hosting the state and decision logic of a browser-based
//! 3D digital-twin viewer: it polls an upstream phase-angle endpoint,
//! classifies every reading against a fixed threshold table, and drives the
//! in-browser rendering layer through a REST surface and a server-sent-event
//! redraw stream.
//!
//! ## Features
//!
//! - **Async-first**: single-owner driver task on the Tokio runtime
//! - **Automatic & manual modes**: periodic polling or user-entered values
//! - **Status classification**: OK / WARN / ALARM / DISCONNECTED
//! - **Model selector**: config-backed catalog for the viewer dropdown
//! - **Web interface**: REST API, SSE redraw stream, static viewer frontend
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of
//! concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `phase`: Phase readings and the status classifier
//! - `source`: HTTP client for the upstream phase endpoint
//! - `panel`: Panel state controller (modes, polling, redraw publishing)
//! - `scene`: Model catalog for the viewer's model selector
//! - `web`: HTTP server, REST API and SSE stream

pub mod config;
pub mod error;
pub mod logging;
pub mod panel;
pub mod phase;
pub mod scene;
pub mod source;
pub mod web;


// Re-export commonly used types
pub use config::Config;
pub use error::{OrreryError, Result};
pub use panel::PanelDriver;

/// Version stamped at build time (nightly/git aware)
pub fn version() -> &'static str {
    env!("APP_VERSION")
}
