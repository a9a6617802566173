use anyhow::Result;
use orrery::panel::{PanelCommand, PanelDriver};
use orrery::web;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Create panel command channel
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<PanelCommand>();

    // Initialize the driver with command receiver
    let mut driver = PanelDriver::new(cmd_rx, cmd_tx.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create panel driver: {}", e))?;

    info!("Orrery digital twin viewer starting up");

    // Hand the web layer its read/command handles before the driver loop
    // takes ownership of the driver.
    let state = web::AppState {
        commands: cmd_tx.clone(),
        snapshot_rx: driver.watch_snapshots(),
        frames: driver.frames_sender(),
        config: Arc::new(driver.config().clone()),
    };
    let host = driver.config().web.host.clone();
    let port = driver.config().web.port;

    // Spawn web server
    let web_task = tokio::spawn(async move {
        if let Err(e) = web::serve(state, &host, port).await {
            error!("Web server error: {}", e);
        }
    });

    // Run the driver in the current task
    match driver.run().await {
        Ok(_) => {
            info!("Panel driver shutdown complete");
            // Ensure web server task ends (it runs until process stops)
            web_task.abort();
            Ok(())
        }
        Err(e) => {
            error!("Panel driver failed with error: {}", e);
            web_task.abort();
            Err(anyhow::anyhow!("Panel driver error: {}", e))
        }
    }
}
