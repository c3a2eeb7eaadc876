// First-order linear plant: x_dot = -a * x + b * u, output y = x

use serde::{Deserialize, Serialize};

/// Scalar first-order plant advanced with forward Euler
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FirstOrderPlant {
    pub a: f64, // Pole coefficient
    pub b: f64, // Input gain
    x: f64,     // State
}

impl FirstOrderPlant {
    pub fn new(a: f64, b: f64, initial_state: f64) -> Self {
        Self {
            a,
            b,
            x: initial_state,
        }
    }

    /// State derivative for the given input
    pub fn derivative(&self, u: f64) -> f64 {
        -self.a * self.x + self.b * u
    }

    /// Integrate one step of length `dt` and return the new output
    pub fn step(&mut self, u: f64, dt: f64) -> f64 {
        self.x += self.derivative(u) * dt;
        self.output()
    }

    /// Direct state feedback, no measurement model
    pub fn output(&self) -> f64 {
        self.x
    }

    pub fn state(&self) -> f64 {
        self.x
    }
}

impl Default for FirstOrderPlant {
    /// x_dot = -x + u, starting at rest
    fn default() -> Self {
        Self::new(1.0, 1.0, 0.0)
    }
}
