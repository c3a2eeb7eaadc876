use eyre::Result;

/// Discrete-time PID controller with output saturation and
/// back-calculation anti-windup.
///
/// The controller runs at a fixed step `dt`. Each call to [`compute`](Self::compute)
/// uses the integrator value from the previous step, then advances the
/// integrator with the back-calculation correction:
///
/// ```text
/// I += (e + kaw * (u_sat - u_unsat)) * dt
/// ```
///
/// With `kaw = 0` the correction vanishes and the integrator winds up freely
/// while the output is clamped.
#[derive(Debug, Clone)]
pub struct PIDController {
    kp: f64,  // Proportional gain
    ki: f64,  // Integral gain
    kd: f64,  // Derivative gain
    kaw: f64, // Anti-windup back-calculation gain

    dt: f64,

    // Output limits (None = unsaturated)
    limits: Option<(f64, f64)>,

    // State
    integral: f64,
    previous_error: f64,

    // Last outputs, kept for logging only
    last_unsaturated: f64,
    last_saturated: f64,
    ticks: u64,
}

impl PIDController {
    /// Create a new PID controller with a fixed time step.
    ///
    /// Fails if `dt` is not a positive finite number.
    pub fn new(kp: f64, ki: f64, kd: f64, dt: f64) -> Result<Self> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(eyre::eyre!(
                "Invalid controller time step dt={} (must be positive and finite)",
                dt
            ));
        }

        Ok(Self {
            kp,
            ki,
            kd,
            kaw: 0.0,
            dt,
            limits: None,
            integral: 0.0,
            previous_error: 0.0,
            last_unsaturated: 0.0,
            last_saturated: 0.0,
            ticks: 0,
        })
    }

    /// Enable output clamping to `[u_min, u_max]`.
    ///
    /// Must be called before the first `compute`.
    pub fn set_saturation(&mut self, u_min: f64, u_max: f64) -> Result<()> {
        self.ensure_unstarted("saturation limits")?;

        // Also rejects NaN bounds
        if !(u_min <= u_max) {
            return Err(eyre::eyre!(
                "Invalid saturation limits: u_min ({}) must not exceed u_max ({})",
                u_min,
                u_max
            ));
        }

        self.limits = Some((u_min, u_max));
        Ok(())
    }

    /// Set the back-calculation gain. Zero disables anti-windup.
    ///
    /// Must be called before the first `compute`.
    pub fn set_anti_windup_gain(&mut self, kaw: f64) -> Result<()> {
        self.ensure_unstarted("anti-windup gain")?;
        self.kaw = kaw;
        Ok(())
    }

    /// Advance the controller by one step and return the saturated output.
    pub fn compute(&mut self, reference: f64, measurement: f64) -> f64 {
        let error = reference - measurement;

        // Backward difference; on the first call previous_error is 0
        let derivative = (error - self.previous_error) / self.dt;

        // Integral term uses the integrator from the previous step
        let u_unsat = self.kp * error + self.ki * self.integral + self.kd * derivative;

        let u_sat = match self.limits {
            Some((u_min, u_max)) => u_unsat.clamp(u_min, u_max),
            None => u_unsat,
        };

        self.integral += (error + self.kaw * (u_sat - u_unsat)) * self.dt;
        self.previous_error = error;

        self.last_unsaturated = u_unsat;
        self.last_saturated = u_sat;
        self.ticks += 1;

        u_sat
    }

    /// Current integrator value (after the most recent `compute`)
    pub fn integrator(&self) -> f64 {
        self.integral
    }

    /// Raw PID sum from the most recent `compute`
    pub fn last_unsaturated(&self) -> f64 {
        self.last_unsaturated
    }

    /// Clamped output from the most recent `compute`
    pub fn last_saturated(&self) -> f64 {
        self.last_saturated
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Whether the most recent output was clamped. A NaN output is never
    /// counted as clamped.
    pub fn is_saturated(&self) -> bool {
        self.limits.is_some()
            && self.last_saturated != self.last_unsaturated
            && !self.last_unsaturated.is_nan()
    }

    /// Get current gains
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    pub fn anti_windup_gain(&self) -> f64 {
        self.kaw
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn saturation(&self) -> Option<(f64, f64)> {
        self.limits
    }

    /// Number of `compute` calls so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn ensure_unstarted(&self, what: &str) -> Result<()> {
        if self.ticks > 0 {
            return Err(eyre::eyre!(
                "Cannot change {} after {} compute call(s)",
                what,
                self.ticks
            ));
        }
        Ok(())
    }
}
