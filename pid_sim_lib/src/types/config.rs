use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::logger::LogVariant;
use crate::utils::{FirstOrderPlant, PIDController, PulseDisturbance};

/// Complete description of one closed-loop simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub simulation: SimulationConfig,
    pub plant: PlantConfig,
    pub controller: ControllerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disturbance: Option<DisturbanceConfig>,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub dt: f64,        // Fixed step (seconds)
    pub sim_time: f64,  // Total simulated time (seconds)
    pub reference: f64, // Constant setpoint applied from t = 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    pub a: f64,
    pub b: f64,
    #[serde(default)]
    pub initial_state: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    #[serde(default)]
    pub kaw: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<SaturationLimits>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationLimits {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceConfig {
    pub magnitude: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub path: String,
    #[serde(default)]
    pub variant: LogVariant,
}

impl ScenarioConfig {
    /// Step response to reference 3.0 with actuator limits of +/-2 and no
    /// anti-windup.
    pub fn reference_step() -> Self {
        Self {
            name: "reference_step".to_string(),
            simulation: SimulationConfig {
                dt: 0.001,
                sim_time: 20.0,
                reference: 3.0,
            },
            plant: PlantConfig {
                a: 1.0,
                b: 1.0,
                initial_state: 0.0,
            },
            controller: ControllerConfig {
                kp: 4.0,
                ki: 1.5,
                kd: 0.02,
                kaw: 0.0,
                saturation: Some(SaturationLimits { min: -2.0, max: 2.0 }),
            },
            disturbance: None,
            log: LogConfig {
                path: "pid_log_ref3kaw0.csv".to_string(),
                variant: LogVariant::Basic,
            },
        }
    }

    /// Step response with limits of +/-3, back-calculation gain 5 and a
    /// -1.0 input disturbance on [5 s, 10 s).
    pub fn disturbance_rejection() -> Self {
        Self {
            name: "disturbance_rejection".to_string(),
            simulation: SimulationConfig {
                dt: 0.001,
                sim_time: 20.0,
                reference: 3.0,
            },
            plant: PlantConfig {
                a: 1.0,
                b: 1.0,
                initial_state: 0.0,
            },
            controller: ControllerConfig {
                kp: 4.0,
                ki: 3.0,
                kd: 0.02,
                kaw: 5.0,
                saturation: Some(SaturationLimits { min: -3.0, max: 3.0 }),
            },
            disturbance: Some(DisturbanceConfig {
                magnitude: -1.0,
                start: 5.0,
                end: 10.0,
            }),
            log: LogConfig {
                path: "pid_log_ref3_lim3_dis1_kaw5.csv".to_string(),
                variant: LogVariant::Disturbance,
            },
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read scenario file {}", path.display()))?;
        let config: ScenarioConfig = toml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse scenario file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;

        if !(sim.dt > 0.0 && sim.dt.is_finite()) {
            return Err(eyre::eyre!(
                "Scenario '{}': dt ({}) must be positive and finite",
                self.name,
                sim.dt
            ));
        }

        if !(sim.sim_time >= 0.0 && sim.sim_time.is_finite()) {
            return Err(eyre::eyre!(
                "Scenario '{}': sim_time ({}) must be non-negative and finite",
                self.name,
                sim.sim_time
            ));
        }

        if let Some(limits) = &self.controller.saturation {
            if !(limits.min <= limits.max) {
                return Err(eyre::eyre!(
                    "Scenario '{}': saturation min ({}) exceeds max ({})",
                    self.name,
                    limits.min,
                    limits.max
                ));
            }
        }

        if let Some(dist) = &self.disturbance {
            if !(dist.start <= dist.end) {
                return Err(eyre::eyre!(
                    "Scenario '{}': disturbance start ({}) exceeds end ({})",
                    self.name,
                    dist.start,
                    dist.end
                ));
            }
        }

        if self.log.path.trim().is_empty() {
            return Err(eyre::eyre!("Scenario '{}': log path is empty", self.name));
        }

        Ok(())
    }

    /// Number of ticks, `sim_time / dt` truncated toward zero
    pub fn steps(&self) -> usize {
        (self.simulation.sim_time / self.simulation.dt) as usize
    }

    /// Build the controller with saturation and anti-windup applied
    pub fn build_controller(&self) -> Result<PIDController> {
        let c = &self.controller;
        let mut pid = PIDController::new(c.kp, c.ki, c.kd, self.simulation.dt)?;
        if let Some(limits) = c.saturation {
            pid.set_saturation(limits.min, limits.max)?;
        }
        pid.set_anti_windup_gain(c.kaw)?;
        Ok(pid)
    }

    pub fn build_plant(&self) -> FirstOrderPlant {
        FirstOrderPlant::new(self.plant.a, self.plant.b, self.plant.initial_state)
    }

    pub fn build_disturbance(&self) -> Result<Option<PulseDisturbance>> {
        self.disturbance
            .map(|d| PulseDisturbance::new(d.magnitude, d.start, d.end))
            .transpose()
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::reference_step()
    }
}
