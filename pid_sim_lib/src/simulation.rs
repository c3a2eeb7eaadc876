//! Fixed-step closed-loop simulation of a PID controller driving a
//! first-order plant.

use eyre::Result;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::logger::{LogVariant, TrajectoryLogger};
use crate::types::{RunSummary, ScenarioConfig, SummaryBuilder, TickRecord};
use crate::utils::{FirstOrderPlant, PIDController, PulseDisturbance};

/// Ticks between debug progress lines
const PROGRESS_INTERVAL: usize = 1000;

/// Owns the controller, plant and disturbance for one run
pub struct SimulationLoop {
    name: String,
    dt: f64,
    reference: f64,
    steps: usize,
    tick: usize,
    controller: PIDController,
    plant: FirstOrderPlant,
    disturbance: Option<PulseDisturbance>,
    log_variant: LogVariant,
    windup_warned: bool,
}

impl SimulationLoop {
    pub fn new(config: &ScenarioConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            name: config.name.clone(),
            dt: config.simulation.dt,
            reference: config.simulation.reference,
            steps: config.steps(),
            tick: 0,
            controller: config.build_controller()?,
            plant: config.build_plant(),
            disturbance: config.build_disturbance()?,
            log_variant: config.log.variant,
            windup_warned: false,
        })
    }

    /// Total number of ticks in the run
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Ticks left before the run is complete
    pub fn remaining(&self) -> usize {
        self.steps.saturating_sub(self.tick)
    }

    pub fn controller(&self) -> &PIDController {
        &self.controller
    }

    pub fn plant(&self) -> &FirstOrderPlant {
        &self.plant
    }

    /// Advance one tick: control, disturbance, plant update
    pub fn step(&mut self) -> TickRecord {
        let time = self.tick as f64 * self.dt;

        let disturbance = self
            .disturbance
            .as_ref()
            .map_or(0.0, |d| d.value_at(time));

        let u = self.controller.compute(self.reference, self.plant.output());
        let output = self.plant.step(u + disturbance, self.dt);

        self.tick += 1;

        TickRecord {
            time,
            reference: self.reference,
            output,
            u_sat: u,
            u_unsat: self.controller.last_unsaturated(),
            integrator: self.controller.integrator(),
            disturbance,
        }
    }

    /// Run all remaining ticks, optionally logging each one
    pub fn run<W: Write>(
        &mut self,
        mut logger: Option<&mut TrajectoryLogger<W>>,
    ) -> Result<RunSummary> {
        let (kp, ki, kd) = self.controller.gains();
        info!("Running scenario '{}'", self.name);
        info!("  dt={}s, steps={}, reference={}", self.dt, self.steps, self.reference);
        info!("  PID: Kp={}, Ki={}, Kd={}, Kaw={}", kp, ki, kd, self.controller.anti_windup_gain());
        match self.controller.saturation() {
            Some((u_min, u_max)) => info!("  Actuator limits: [{}, {}]", u_min, u_max),
            None => info!("  Actuator limits: none"),
        }
        if let Some(d) = &self.disturbance {
            info!("  Disturbance: {} on [{}, {})", d.magnitude, d.start, d.end);
        }

        let mut summary = SummaryBuilder::new(self.name.clone(), self.dt, self.reference);

        while self.tick < self.steps {
            let record = self.step();

            if let Some(logger) = logger.as_deref_mut() {
                logger.write_record(&record)?;
            }
            summary.record(&record);

            self.check_windup(&record);

            if self.tick % PROGRESS_INTERVAL == 0 {
                debug!(
                    "t={:.3}s y={:.4} u={:.4} I={:.4}",
                    record.time, record.output, record.u_sat, record.integrator
                );
            }
        }

        let summary = summary.finish(None);
        info!(
            "Finished '{}': {} ticks, final output {:.4}, overshoot {:.4}, {} saturated ticks",
            summary.scenario,
            summary.steps,
            summary.final_output,
            summary.overshoot,
            summary.saturated_ticks
        );

        Ok(summary)
    }

    /// Create (or overwrite) the CSV log at `path` and run to completion
    pub fn run_to_file(&mut self, path: impl AsRef<Path>) -> Result<RunSummary> {
        let path = path.as_ref();
        let mut logger = TrajectoryLogger::create(path, self.log_variant)?;

        let mut summary = self.run(Some(&mut logger))?;
        let rows = logger.rows();
        logger.finish()?;

        info!("Wrote {} rows to {}", rows, path.display());
        summary.log_path = Some(path.display().to_string());
        Ok(summary)
    }

    fn check_windup(&mut self, record: &TickRecord) {
        if self.windup_warned || !record.is_saturated() {
            return;
        }
        if self.controller.anti_windup_gain() != 0.0 {
            return;
        }

        // Integrator term alone already exceeds what the actuator can realize
        let (_, ki, _) = self.controller.gains();
        if let Some((u_min, u_max)) = self.controller.saturation() {
            let integral_term = ki * record.integrator;
            if integral_term > u_max || integral_term < u_min {
                warn!(
                    "Integrator windup at t={:.3}s: Ki*I={:.4} outside [{}, {}] with anti-windup disabled",
                    record.time, integral_term, u_min, u_max
                );
                self.windup_warned = true;
            }
        }
    }
}
