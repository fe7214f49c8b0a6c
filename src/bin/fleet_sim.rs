//! Command-line entry point: run one simulation and print its report.
//!
//! Usage: `fleet_sim [CONFIG.json] [--json]`. Without a path the config is
//! read from `FLEET_SIM_CONFIG`, falling back to `fleet.json`. A `.env` file
//! in the working directory is loaded first.

use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use tracing::info;

use fleet_sim::config::SimulationConfig;
use fleet_sim::core::{AppResult, EventBus, LogListener};
use fleet_sim::runtime::Simulation;
use fleet_sim::stats::SimulationStatistics;
use fleet_sim::util::init_tracing;

const CONFIG_ENV: &str = "FLEET_SIM_CONFIG";
const DEFAULT_CONFIG: &str = "fleet.json";

fn main() -> AppResult<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut json = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            path = Some(arg);
        }
    }
    let path = path
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = SimulationConfig::from_path(&path)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("loading configuration from {path}"))?;
    info!(path = %path, seed = cfg.seed, "configuration loaded");

    let bus = Arc::new(EventBus::new());
    let stats = Arc::new(Mutex::new(SimulationStatistics::from_config(&cfg)));
    bus.subscribe(Box::new(Arc::clone(&stats)));
    bus.subscribe(Box::new(LogListener));

    let mut simulation = Simulation::from_config(&cfg, bus)?;
    let summary = simulation.run()?;
    info!(%summary, "run complete");

    let report = stats.lock().report()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}
