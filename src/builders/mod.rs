//! Builders to construct the simulated fleet from configuration.

pub mod fleet_builder;

pub use fleet_builder::{build_fleet, Fleet};
