//! Configuration models for the simulated fleet.

pub mod simulation;

pub use simulation::{DistributionConfig, RoleConfig, SimulationConfig};
