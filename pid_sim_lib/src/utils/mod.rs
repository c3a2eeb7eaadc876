pub mod disturbance;
pub mod pid;
pub mod plant;
pub mod tracing;

pub use disturbance::*;
pub use pid::*;
pub use plant::*;
pub use self::tracing::*;
