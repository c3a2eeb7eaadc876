use eyre::Result;
use serde::{Deserialize, Serialize};

/// Additive input disturbance active on the half-open window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseDisturbance {
    pub magnitude: f64,
    pub start: f64,
    pub end: f64,
}

impl PulseDisturbance {
    pub fn new(magnitude: f64, start: f64, end: f64) -> Result<Self> {
        if !(start <= end) {
            return Err(eyre::eyre!(
                "Invalid disturbance window: start ({}) must not exceed end ({})",
                start,
                end
            ));
        }

        Ok(Self {
            magnitude,
            start,
            end,
        })
    }

    /// Disturbance value at simulation time `t`
    pub fn value_at(&self, t: f64) -> f64 {
        if self.is_active(t) {
            self.magnitude
        } else {
            0.0
        }
    }

    pub fn is_active(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}
