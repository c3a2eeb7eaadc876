//! # PID Simulation Library
//!
//! Discrete PID controller with saturation and back-calculation anti-windup,
//! a first-order plant, scenario configuration and trajectory logging.
//! Used by the `pid_simulator` binary.

pub mod logger;
pub mod simulation;
pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use logger::*;
pub use simulation::*;
pub use types::*;
pub use utils::*;
