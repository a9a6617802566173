//! Panel state controller
//!
//! The panel driver owns the update mode, the latest phase reading and the
//! active model selection, and is the single writer of all of them. The web
//! layer talks to it through a command channel and observes it through a
//! watch snapshot plus a broadcast frame stream; the frame stream is the
//! redraw callback of the rendering layer.

use crate::config::Config;
use crate::phase::{PhaseReading, PhaseStatus};
use crate::scene::ModelCatalog;
use crate::source::PhaseFetch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

mod runtime;

/// Update mode of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Periodic polling drives the displayed value
    Automatic,

    /// A user-entered value drives the displayed value; polling suspended
    Manual,
}

impl std::fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateMode::Automatic => f.write_str("automatic"),
            UpdateMode::Manual => f.write_str("manual"),
        }
    }
}

/// Commands accepted by the panel driver from external components (web, etc.)
#[derive(Debug, Clone)]
pub enum PanelCommand {
    SetMode(UpdateMode),
    /// Raw text from the manual input field; validated by the driver
    SubmitAngle(String),
    SelectModel(String),
}

/// Published view of the panel, rebuilt on every redraw
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSnapshot {
    pub timestamp: String,
    pub mode: UpdateMode,
    /// Latest angle in degrees; absent after a failed fetch
    pub angle: Option<f64>,
    pub status: PhaseStatus,
    /// Active model id from the catalog
    pub model: String,
    pub poll_interval_secs: u64,
    pub total_polls: u64,
    pub overrun_count: u64,
}

/// Panel state driver
pub struct PanelDriver {
    /// Configuration
    config: Config,

    /// Logger with context
    logger: crate::logging::StructuredLogger,

    /// Upstream reading source
    source: Arc<dyn PhaseFetch>,

    /// Selectable models
    catalog: ModelCatalog,

    /// Control state
    mode: UpdateMode,
    reading: PhaseReading,
    active_model: String,
    total_polls: u64,
    overrun_count: u64,

    /// Command receiver for external control
    commands_rx: mpsc::UnboundedReceiver<PanelCommand>,

    /// Command sender (handed to the web layer)
    commands_tx: mpsc::UnboundedSender<PanelCommand>,

    /// Broadcast channel for streaming redraw frames (SSE)
    frames_tx: broadcast::Sender<String>,

    /// Snapshot channel for REST reads
    snapshot_tx: watch::Sender<Arc<PanelSnapshot>>,
    snapshot_rx: watch::Receiver<Arc<PanelSnapshot>>,

    /// Shutdown signal
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

impl PanelDriver {
    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current update mode
    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Latest reading
    pub fn current_reading(&self) -> PhaseReading {
        self.reading
    }

    /// Active model id
    pub fn active_model(&self) -> &str {
        &self.active_model
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<PanelSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to redraw frames (for SSE)
    pub fn subscribe_frames(&self) -> broadcast::Receiver<String> {
        self.frames_tx.subscribe()
    }

    /// Sender half of the frame stream (for the web state)
    pub fn frames_sender(&self) -> broadcast::Sender<String> {
        self.frames_tx.clone()
    }

    /// Watch handle over published snapshots (for the web state)
    pub fn watch_snapshots(&self) -> watch::Receiver<Arc<PanelSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Command sender handle (for the web state)
    pub fn commands_sender(&self) -> mpsc::UnboundedSender<PanelCommand> {
        self.commands_tx.clone()
    }

    /// Request shutdown of the driver loop
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send(()).ok();
    }
}
