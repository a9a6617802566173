//! Upstream phase endpoint client
//!
//! One GET per poll cycle against the configured endpoint. The panel never
//! sees a fetch error: every failure is logged and reported as an absent
//! reading, which classifies as DISCONNECTED.

use crate::error::{OrreryError, Result};
use crate::logging::get_logger;
use crate::phase::PhaseReading;

/// Fetch seam for the panel driver; the production implementation is
/// [`PhaseEndpoint`], tests substitute a scripted fake.
#[async_trait::async_trait]
pub trait PhaseFetch: Send + Sync {
    async fn fetch(&self) -> PhaseReading;
}

/// HTTP client for the phase endpoint
pub struct PhaseEndpoint {
    url: String,
    client: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

impl PhaseEndpoint {
    /// Create a client for the given endpoint URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            logger: get_logger("source"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn try_fetch(&self) -> Result<PhaseReading> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(OrreryError::api(format!(
                "Phase endpoint returned {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| OrreryError::api(format!("Malformed phase payload: {}", e)))?;

        match body.get("angle") {
            // Upstream reports null when it has no data row
            Some(value) if value.is_null() => Ok(PhaseReading::absent()),
            Some(value) => value
                .as_f64()
                .map(PhaseReading::measured)
                .ok_or_else(|| OrreryError::api("Non-numeric angle field".to_string())),
            None => Err(OrreryError::api("Missing angle field".to_string())),
        }
    }
}

#[async_trait::async_trait]
impl PhaseFetch for PhaseEndpoint {
    async fn fetch(&self) -> PhaseReading {
        match self.try_fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                self.logger
                    .warn(&format!("Phase fetch failed, treating as absent: {}", e));
                PhaseReading::absent()
            }
        }
    }
}
