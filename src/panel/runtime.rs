use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Duration, Instant, interval, interval_at};

use crate::config::Config;
use crate::error::Result;
use crate::phase::{self, PhaseReading};
use crate::scene::{ModelCatalog, ModelEntry};
use crate::source::{PhaseEndpoint, PhaseFetch};

use super::{PanelCommand, PanelDriver, PanelSnapshot, UpdateMode};

impl PanelDriver {
    /// Create a new driver instance from the default configuration
    pub async fn new(
        commands_rx: mpsc::UnboundedReceiver<PanelCommand>,
        commands_tx: mpsc::UnboundedSender<PanelCommand>,
    ) -> Result<Self> {
        let config = Config::load().map_err(|e| {
            eprintln!("Failed to load configuration: {}", e);
            e
        })?;

        // Initialize logging
        crate::logging::init_logging(&config.logging)?;

        let source = Arc::new(PhaseEndpoint::new(config.source.url.clone()));
        Self::from_config(config, source, commands_rx, commands_tx)
    }

    /// Create a driver from an explicit configuration and reading source
    pub fn from_config(
        config: Config,
        source: Arc<dyn PhaseFetch>,
        commands_rx: mpsc::UnboundedReceiver<PanelCommand>,
        commands_tx: mpsc::UnboundedSender<PanelCommand>,
    ) -> Result<Self> {
        config.validate()?;

        let logger = crate::logging::get_logger("panel");
        logger.info("Initializing panel driver");

        let catalog = ModelCatalog::from_config(&config.models);
        let mode = config.panel.initial_mode;
        let active_model = config.models.default_model.clone();
        let reading = PhaseReading::absent();

        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (frames_tx, _frames_rx) = broadcast::channel::<String>(100);

        let initial_snapshot = Arc::new(PanelSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode,
            angle: None,
            status: reading.status(),
            model: active_model.clone(),
            poll_interval_secs: config.source.poll_interval_secs,
            total_polls: 0,
            overrun_count: 0,
        });
        let (snapshot_tx, snapshot_rx) = watch::channel::<Arc<PanelSnapshot>>(initial_snapshot);

        Ok(Self {
            config,
            logger,
            source,
            catalog,
            mode,
            reading,
            active_model,
            total_polls: 0,
            overrun_count: 0,
            commands_rx,
            commands_tx,
            frames_tx,
            snapshot_tx,
            snapshot_rx,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Run the panel driver main loop
    ///
    /// Selects over the poll schedule, the command channel and the shutdown
    /// signal. The first tick of a fresh interval fires immediately, which
    /// gives the one immediate fetch on startup in automatic mode.
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info(&format!(
            "Starting panel driver main loop (mode={}, poll every {}s)",
            self.mode, self.config.source.poll_interval_secs
        ));

        let period = Duration::from_secs(self.config.source.poll_interval_secs);
        let mut poll_interval = interval(period);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    // The schedule keeps ticking in manual mode; fetches do not.
                    if matches!(self.mode, UpdateMode::Automatic) {
                        let started = Instant::now();
                        self.poll_once().await;
                        if started.elapsed() > period {
                            self.overrun_count = self.overrun_count.saturating_add(1);
                        }
                    }
                }
                Some(cmd) = self.commands_rx.recv() => {
                    let was_automatic = matches!(self.mode, UpdateMode::Automatic);
                    self.handle_command(cmd).await;
                    if matches!(self.mode, UpdateMode::Automatic) && !was_automatic {
                        // set_mode already fetched once; realign the recurring
                        // schedule so the next poll is a full period away.
                        poll_interval = interval_at(Instant::now() + period, period);
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.logger.info("Panel driver shutdown complete");
        Ok(())
    }

    /// Handle external command
    pub async fn handle_command(&mut self, cmd: PanelCommand) {
        match cmd {
            PanelCommand::SetMode(mode) => self.set_mode(mode).await,
            PanelCommand::SubmitAngle(raw) => {
                if let Err(e) = self.submit_manual_angle(&raw) {
                    self.logger
                        .warn(&format!("Rejected manual angle '{}': {}", raw, e));
                }
            }
            PanelCommand::SelectModel(id) => {
                if let Err(e) = self.select_model(&id) {
                    self.logger.warn(&format!("Model selection failed: {}", e));
                }
            }
        }
    }

    /// Switch the update mode.
    ///
    /// Entering automatic mode performs one immediate fetch-classify-redraw;
    /// entering manual mode stops automatic polling and leaves the last
    /// value displayed until a manual submission. Setting the already-active
    /// mode is a no-op.
    pub async fn set_mode(&mut self, mode: UpdateMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.logger.info(&format!("Update mode set to {}", mode));
        match mode {
            UpdateMode::Automatic => self.poll_once().await,
            UpdateMode::Manual => self.publish_frame(),
        }
    }

    /// One fetch-classify-redraw cycle
    pub async fn poll_once(&mut self) {
        let reading = self.source.fetch().await;
        self.reading = reading;
        self.total_polls = self.total_polls.saturating_add(1);
        self.logger.debug(&format!(
            "Poll cycle completed: angle={:?} status={}",
            reading.angle(),
            reading.status()
        ));
        self.publish_frame();
    }

    /// Apply a manually entered angle.
    ///
    /// Valid only in manual mode; non-numeric or non-finite input is
    /// rejected without touching the current reading.
    pub fn submit_manual_angle(&mut self, raw: &str) -> Result<f64> {
        if !matches!(self.mode, UpdateMode::Manual) {
            return Err(crate::error::OrreryError::validation(
                "angle",
                "Panel is in automatic mode",
            ));
        }
        let angle = phase::parse_angle(raw)?;
        self.reading = PhaseReading::measured(angle);
        self.logger.info(&format!(
            "Manual angle applied: {:.2} deg (status={})",
            angle,
            self.reading.status()
        ));
        self.publish_frame();
        Ok(angle)
    }

    /// Switch the active model.
    ///
    /// Unknown ids are an error; a known model whose asset file is missing
    /// is logged and skipped, keeping the current selection.
    pub fn select_model(&mut self, id: &str) -> Result<Option<ModelEntry>> {
        let Some(entry) = self.catalog.get(id).cloned() else {
            return Err(crate::error::OrreryError::validation(
                "model",
                &format!("Unknown model '{}'", id),
            ));
        };
        if !self.catalog.asset_available(&entry) {
            self.logger.warn(&format!(
                "Model asset missing: {} (keeping '{}')",
                self.catalog.asset_path(&entry).display(),
                self.active_model
            ));
            return Ok(None);
        }
        self.active_model = entry.id.clone();
        self.logger
            .info(&format!("Active model set to '{}'", self.active_model));
        self.publish_frame();
        Ok(Some(entry))
    }

    /// Catalog of selectable models
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Publish the current state as a snapshot and a redraw frame
    fn publish_frame(&mut self) {
        let snapshot = Arc::new(PanelSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: self.mode,
            angle: self.reading.angle(),
            status: self.reading.status(),
            model: self.active_model.clone(),
            poll_interval_secs: self.config.source.poll_interval_secs,
            total_polls: self.total_polls,
            overrun_count: self.overrun_count,
        });
        let _ = self.snapshot_tx.send(snapshot.clone());
        if let Ok(payload) = serde_json::to_string(snapshot.as_ref()) {
            let _ = self.frames_tx.send(payload);
        }
    }
}
