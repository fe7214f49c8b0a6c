//! Shared utilities: timing helpers, random-variate generators and telemetry.

pub mod clock;
pub mod distribution;
pub mod telemetry;

pub use clock::*;
pub use distribution::*;
pub use telemetry::*;
