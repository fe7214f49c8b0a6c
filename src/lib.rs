//! # fleet_sim
//!
//! A discrete-event simulator of a multi-tier job-processing fleet.
//!
//! Jobs arrive stochastically at a gateway tier, are admitted into bounded
//! priority queues, dispatched to pools of workers grouped by role (gateway,
//! inventory, shipment, payments) and routed between roles. Every state
//! transition is published on an [`core::EventBus`], which is where the
//! statistics come from.
//!
//! ## Scheduling model
//!
//! - **Bounded priority queue**: a full queue admits a newcomer only by
//!   evicting a strictly less urgent job; otherwise the newcomer is rejected.
//! - **Load manager**: one lock per role covers both direct assignment to the
//!   first idle worker and queue admission, and a drain loop hands queued jobs
//!   to workers as they free up.
//! - **Workers**: one OS thread each, one job at a time. Gateway workers
//!   forward non-gateway jobs to the manager of the job's role.
//! - **Shutdown**: tier by tier, gateway first; every queued job is either
//!   processed or explicitly rejected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fleet_sim::config::SimulationConfig;
//! use fleet_sim::core::EventBus;
//! use fleet_sim::runtime::Simulation;
//! use fleet_sim::stats::SimulationStatistics;
//! use parking_lot::Mutex;
//!
//! # fn main() -> fleet_sim::core::AppResult<()> {
//! let cfg = SimulationConfig::from_path("fleet.json").map_err(anyhow::Error::msg)?;
//! let bus = Arc::new(EventBus::new());
//! let stats = Arc::new(Mutex::new(SimulationStatistics::from_config(&cfg)));
//! bus.subscribe(Box::new(Arc::clone(&stats)));
//!
//! let mut sim = Simulation::from_config(&cfg, bus)?;
//! sim.run()?;
//! println!("{}", stats.lock().report()?);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Configuration models for the simulated fleet.
pub mod config;
/// Builders to construct the fleet from configuration.
pub mod builders;
/// Jobs, queues, workers, load managers, routing and events.
pub mod core;
/// Loop threads and the simulation driver.
pub mod runtime;
/// Event-driven statistics and the run report.
pub mod stats;
/// Shared utilities.
pub mod util;
