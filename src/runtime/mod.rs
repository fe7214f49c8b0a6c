//! Thread management and the simulation driver.

pub mod driver;
pub mod threads;

pub use driver::{DriverState, RunSummary, Simulation};
pub use threads::{spawn_loop, ThreadExit};
