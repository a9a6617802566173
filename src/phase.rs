//! Phase-angle readings and status classification
//!
//! The status of the panel is a pure function of the most recent reading:
//! no history is kept and nothing here has side effects.

use crate::error::{OrreryError, Result};
use serde::{Deserialize, Serialize};

/// Absolute angle above which the panel shows WARN, in degrees
pub const WARN_THRESHOLD_DEGREES: f64 = 2.0;

/// Absolute angle above which the panel shows ALARM, in degrees
pub const ALARM_THRESHOLD_DEGREES: f64 = 3.0;

/// A single phase-angle measurement, possibly absent after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseReading {
    angle: Option<f64>,
}

impl PhaseReading {
    /// A measured angle in degrees. Non-finite values are treated as absent.
    pub fn measured(degrees: f64) -> Self {
        if degrees.is_finite() {
            Self {
                angle: Some(degrees),
            }
        } else {
            Self::absent()
        }
    }

    /// The reading of a failed or empty fetch
    pub fn absent() -> Self {
        Self { angle: None }
    }

    /// Angle in degrees, if present
    pub fn angle(&self) -> Option<f64> {
        self.angle
    }

    pub fn is_absent(&self) -> bool {
        self.angle.is_none()
    }

    /// Status of the panel for this reading
    pub fn status(&self) -> PhaseStatus {
        classify(*self)
    }
}

impl Default for PhaseReading {
    fn default() -> Self {
        Self::absent()
    }
}

/// Panel status derived from the latest reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    Ok,
    Warn,
    Alarm,
    Disconnected,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Ok => "OK",
            PhaseStatus::Warn => "WARN",
            PhaseStatus::Alarm => "ALARM",
            PhaseStatus::Disconnected => "DISCONNECTED",
        }
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a reading against the fixed threshold table.
///
/// WARN covers `2 < |a| <= 3`, ALARM everything above, DISCONNECTED an
/// absent reading.
pub fn classify(reading: PhaseReading) -> PhaseStatus {
    match reading.angle() {
        None => PhaseStatus::Disconnected,
        Some(angle) => {
            let abs = angle.abs();
            if abs > ALARM_THRESHOLD_DEGREES {
                PhaseStatus::Alarm
            } else if abs > WARN_THRESHOLD_DEGREES {
                PhaseStatus::Warn
            } else {
                PhaseStatus::Ok
            }
        }
    }
}

/// Parse user-entered angle text from the manual input field.
///
/// Rejects anything that is not a finite number; the caller surfaces the
/// error to the user and leaves the panel untouched.
pub fn parse_angle(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OrreryError::validation("angle", "Angle cannot be empty"));
    }
    let value: f64 = trimmed.parse().map_err(|_| {
        OrreryError::validation("angle", &format!("Not a number: '{}'", trimmed))
    })?;
    if !value.is_finite() {
        return Err(OrreryError::validation("angle", "Angle must be finite"));
    }
    Ok(value)
}
