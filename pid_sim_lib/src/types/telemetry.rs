use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One simulation tick as written to the trajectory log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Simulation time at the start of the tick (seconds)
    pub time: f64,
    pub reference: f64,
    /// Plant output after this tick's update
    pub output: f64,
    /// Control applied to the plant (clamped)
    pub u_sat: f64,
    /// Raw PID sum before clamping
    pub u_unsat: f64,
    /// Controller integrator after this tick
    pub integrator: f64,
    /// Additive input disturbance during this tick
    pub disturbance: f64,
}

impl TickRecord {
    /// Control was clamped on this tick (NaN ticks are not)
    pub fn is_saturated(&self) -> bool {
        self.u_sat != self.u_unsat && !self.u_unsat.is_nan()
    }
}

/// Post-run statistics for a completed simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario: String,
    pub steps: usize,
    pub dt: f64,
    pub reference: f64,
    pub final_output: f64,
    /// Extreme output in the direction of the reference
    pub peak_output: f64,
    /// Distance the peak went past the reference (0 if it never did)
    pub overshoot: f64,
    /// Ticks where the control was clamped
    pub saturated_ticks: usize,
    /// End of the initial saturation transient, if the run started saturated
    /// and later left saturation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation_released_at: Option<f64>,
    pub final_integrator: f64,
    pub max_abs_integrator: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
    /// Timestamp when the run completed (Unix milliseconds)
    pub timestamp: i64,
}

impl RunSummary {
    /// Write the summary as pretty-printed JSON
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write summary {}", path.display()))?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read summary {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Folds tick records into a [`RunSummary`]
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    scenario: String,
    dt: f64,
    reference: f64,
    steps: usize,
    final_output: f64,
    peak_output: Option<f64>,
    saturated_ticks: usize,
    in_initial_transient: bool,
    saturation_released_at: Option<f64>,
    final_integrator: f64,
    max_abs_integrator: f64,
}

impl SummaryBuilder {
    pub fn new(scenario: impl Into<String>, dt: f64, reference: f64) -> Self {
        Self {
            scenario: scenario.into(),
            dt,
            reference,
            steps: 0,
            final_output: 0.0,
            peak_output: None,
            saturated_ticks: 0,
            in_initial_transient: true,
            saturation_released_at: None,
            final_integrator: 0.0,
            max_abs_integrator: 0.0,
        }
    }

    pub fn record(&mut self, tick: &TickRecord) {
        let saturated = tick.is_saturated();

        if saturated {
            self.saturated_ticks += 1;
        }

        if self.in_initial_transient {
            if self.steps == 0 && !saturated {
                // Never saturated at the start, nothing to release
                self.in_initial_transient = false;
            } else if !saturated {
                self.saturation_released_at = Some(tick.time);
                self.in_initial_transient = false;
            }
        }

        let towards_reference: fn(f64, f64) -> f64 = if self.reference >= 0.0 {
            f64::max
        } else {
            f64::min
        };
        self.peak_output = Some(match self.peak_output {
            Some(peak) => towards_reference(peak, tick.output),
            None => tick.output,
        });

        self.final_output = tick.output;
        self.final_integrator = tick.integrator;
        self.max_abs_integrator = self.max_abs_integrator.max(tick.integrator.abs());
        self.steps += 1;
    }

    pub fn finish(self, log_path: Option<String>) -> RunSummary {
        let peak_output = self.peak_output.unwrap_or(0.0);
        let overshoot = if self.steps == 0 {
            0.0
        } else if self.reference >= 0.0 {
            (peak_output - self.reference).max(0.0)
        } else {
            (self.reference - peak_output).max(0.0)
        };

        RunSummary {
            scenario: self.scenario,
            steps: self.steps,
            dt: self.dt,
            reference: self.reference,
            final_output: self.final_output,
            peak_output,
            overshoot,
            saturated_ticks: self.saturated_ticks,
            saturation_released_at: self.saturation_released_at,
            final_integrator: self.final_integrator,
            max_abs_integrator: self.max_abs_integrator,
            log_path,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(time: f64, output: f64, u_sat: f64, u_unsat: f64, integrator: f64) -> TickRecord {
        TickRecord {
            time,
            reference: 1.0,
            output,
            u_sat,
            u_unsat,
            integrator,
            disturbance: 0.0,
        }
    }

    #[test]
    fn test_summary_tracks_peak_and_saturation() {
        let mut builder = SummaryBuilder::new("unit", 0.1, 1.0);
        builder.record(&tick(0.0, 0.4, 2.0, 5.0, 0.1));
        builder.record(&tick(0.1, 0.9, 2.0, 3.0, 0.2));
        builder.record(&tick(0.2, 1.2, 1.5, 1.5, -0.3));
        builder.record(&tick(0.3, 1.05, 2.0, 2.5, 0.25));

        let summary = builder.finish(Some("unit.csv".to_string()));
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.saturated_ticks, 3);
        assert_eq!(summary.saturation_released_at, Some(0.2));
        assert_eq!(summary.peak_output, 1.2);
        assert!((summary.overshoot - 0.2).abs() < 1e-12);
        assert_eq!(summary.final_output, 1.05);
        assert_eq!(summary.final_integrator, 0.25);
        assert_eq!(summary.max_abs_integrator, 0.3);
        assert_eq!(summary.log_path.as_deref(), Some("unit.csv"));
    }

    #[test]
    fn test_no_release_when_never_saturated_initially() {
        let mut builder = SummaryBuilder::new("unit", 0.1, 1.0);
        builder.record(&tick(0.0, 0.1, 0.5, 0.5, 0.0));
        builder.record(&tick(0.1, 0.2, 2.0, 4.0, 0.0));
        builder.record(&tick(0.2, 0.3, 0.5, 0.5, 0.0));

        let summary = builder.finish(None);
        assert_eq!(summary.saturation_released_at, None);
        assert_eq!(summary.saturated_ticks, 1);
    }

    #[test]
    fn test_nan_ticks_are_not_counted_as_saturated() {
        let mut builder = SummaryBuilder::new("nan", 0.1, 1.0);
        builder.record(&tick(0.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN));
        builder.record(&tick(0.1, f64::NAN, f64::NAN, f64::NAN, f64::NAN));
        assert!(!tick(0.0, 0.0, f64::NAN, f64::NAN, 0.0).is_saturated());

        let summary = builder.finish(None);
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.saturated_ticks, 0);
    }

    #[test]
    fn test_negative_reference_overshoot() {
        let mut builder = SummaryBuilder::new("neg", 0.1, -1.0);
        builder.record(&tick(0.0, -0.5, -1.0, -1.0, 0.0));
        builder.record(&tick(0.1, -1.3, -1.0, -1.0, 0.0));
        builder.record(&tick(0.2, -0.9, -1.0, -1.0, 0.0));

        let summary = builder.finish(None);
        assert_eq!(summary.peak_output, -1.3);
        assert!((summary.overshoot - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_summary_serializes_without_empty_fields() {
        let summary = SummaryBuilder::new("empty", 0.1, 1.0).finish(None);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["steps"], 0);
        assert_eq!(json["overshoot"], 0.0);
        assert!(json.get("log_path").is_none());
        assert!(json.get("saturation_released_at").is_none());
    }

    #[test]
    fn test_summary_file_round_trip() {
        let mut builder = SummaryBuilder::new("file", 0.5, 2.0);
        builder.record(&tick(0.0, 2.5, 1.0, 1.0, 0.5));
        let summary = builder.finish(Some("file.csv".to_string()));

        let path = std::env::temp_dir().join(format!("pid_sim_summary_{}.json", std::process::id()));
        summary.save_to_file(&path).unwrap();
        let loaded = RunSummary::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.scenario, "file");
        assert_eq!(loaded.peak_output, 2.5);
        assert_eq!(loaded.overshoot, 0.5);
        assert_eq!(loaded.timestamp, summary.timestamp);
    }
}
