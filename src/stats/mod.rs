//! Statistics collected from scheduler events and the final run report.

pub mod collector;
pub mod metrics;
pub mod report;

pub use collector::SimulationStatistics;
pub use metrics::{DurationMetric, LevelMetric, SampleMetric};
pub use report::{RoleReport, SimulationReport};
