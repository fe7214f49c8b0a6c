//! Simulation driver: arrival generation, loop threads and tiered shutdown.
//!
//! The arrival loop runs on the caller's thread. Every worker and every drain
//! loop gets its own named thread, which reports back on an exit channel when
//! it ends. Shutdown goes tier by tier, gateway first, so jobs forwarded by an
//! upstream worker always find a live downstream manager.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

use crate::builders::{build_fleet, Fleet};
use crate::config::SimulationConfig;
use crate::core::{
    AtomicIdSource, EventBus, JobFactory, LoadManager, SchedulerError, SimEvent, WorkerId,
};
use crate::runtime::threads::{spawn_loop, ThreadExit};
use crate::util::clock::{millis, Stopwatch};
use crate::util::distribution::{Distribution, SeedStream};

/// Lifecycle of a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Built, not started.
    Configured,
    /// Arrival loop running.
    Running,
    /// Arrivals over, tiers shutting down.
    Draining,
    /// Every thread has exited. Terminal.
    Stopped,
}

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Identifier attached to the run's tracing span.
    pub run_id: Uuid,
    /// Jobs generated by the arrival loop.
    pub arrived: u64,
    /// Arrivals the gateway admitted (directly or queued).
    pub admitted: u64,
    /// Arrivals the gateway turned away.
    pub rejected: u64,
    /// Wall-clock time from start to the final drain.
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} arrived, {} admitted at the gateway, {} rejected at the gateway, {} ms",
            self.run_id,
            self.arrived,
            self.admitted,
            self.rejected,
            self.elapsed.as_millis()
        )
    }
}

/// Owns the fleet and drives one simulation run.
pub struct Simulation {
    run_id: Uuid,
    duration: Duration,
    bus: Arc<EventBus>,
    fleet: Fleet,
    arrivals: Box<dyn Distribution>,
    jobs: JobFactory,
    state: DriverState,
}

impl Simulation {
    /// Build every tier from `cfg` and wire it to `bus`. Subscribe listeners
    /// to `bus` before calling [`Simulation::run`].
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `cfg` fails validation.
    pub fn from_config(cfg: &SimulationConfig, bus: Arc<EventBus>) -> Result<Self, SchedulerError> {
        let mut seeds = SeedStream::new(cfg.seed);
        let arrivals = cfg.arrival.build(seeds.next_seed());
        let jobs = JobFactory::new(
            Arc::new(AtomicIdSource::new()),
            cfg.priority_levels,
            cfg.weights(),
            seeds.next_seed(),
        );
        let fleet = build_fleet(cfg, &bus, &mut seeds)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            duration: cfg.duration(),
            bus,
            fleet,
            arrivals,
            jobs,
            state: DriverState::Configured,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The simulated fleet.
    #[must_use]
    pub const fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// The bus every component publishes to.
    #[must_use]
    pub const fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Run arrivals for the configured duration, then drain every tier.
    ///
    /// Publishes `AllJobsDrained` as the last event of a successful run.
    ///
    /// # Errors
    ///
    /// - `AlreadyRan` if called a second time.
    /// - `Thread` if a loop thread cannot be spawned or panics.
    /// - Any invariant violation raised by a loop; the remaining loops are
    ///   aborted and joined before it is returned.
    pub fn run(&mut self) -> Result<RunSummary, SchedulerError> {
        if self.state != DriverState::Configured {
            return Err(SchedulerError::AlreadyRan);
        }
        let span = info_span!("simulation", run_id = %self.run_id);
        let _guard = span.enter();
        info!(
            duration_ms = self.duration.as_millis(),
            workers = self.fleet.worker_count(),
            "simulation started"
        );

        let clock = Stopwatch::start();
        let (exit_tx, exit_rx) = unbounded();
        let mut handles = Vec::new();
        let mut watcher = ExitWatcher::new(exit_rx);

        self.state = DriverState::Running;
        let outcome = self.execute(&clock, exit_tx, &mut handles, &mut watcher);

        match outcome {
            Ok((arrived, admitted, rejected)) => {
                self.bus.publish(&SimEvent::AllJobsDrained);
                join_all(handles);
                self.state = DriverState::Stopped;
                let summary = RunSummary {
                    run_id: self.run_id,
                    arrived,
                    admitted,
                    rejected,
                    elapsed: clock.elapsed(),
                };
                info!(
                    arrived,
                    admitted,
                    rejected,
                    elapsed_ms = summary.elapsed.as_millis(),
                    "simulation finished"
                );
                Ok(summary)
            }
            Err(err) => {
                error!(error = %err, "simulation aborted");
                for manager in self.fleet.tiers() {
                    manager.abort();
                    manager.stop_workers();
                }
                join_all(handles);
                self.state = DriverState::Stopped;
                Err(err)
            }
        }
    }

    fn execute(
        &mut self,
        clock: &Stopwatch,
        exits: Sender<ThreadExit>,
        handles: &mut Vec<JoinHandle<()>>,
        watcher: &mut ExitWatcher,
    ) -> Result<(u64, u64, u64), SchedulerError> {
        self.spawn_loops(&exits, handles)?;
        // Only the loop threads keep the channel open from here on.
        drop(exits);
        let counts = self.generate_arrivals(clock, watcher)?;
        self.state = DriverState::Draining;
        self.drain(watcher)?;
        Ok(counts)
    }

    fn spawn_loops(
        &self,
        exits: &Sender<ThreadExit>,
        handles: &mut Vec<JoinHandle<()>>,
    ) -> Result<(), SchedulerError> {
        for manager in self.fleet.tiers() {
            for worker in manager.workers() {
                let worker = Arc::clone(worker);
                let name = worker_thread_name(manager, worker.id());
                handles.push(spawn_loop(name, exits.clone(), move || worker.run())?);
            }
            let runner = Arc::clone(manager);
            let name = manager_thread_name(manager);
            handles.push(spawn_loop(name, exits.clone(), move || runner.run())?);
        }
        debug!(threads = handles.len(), "loop threads spawned");
        Ok(())
    }

    /// Arrival loop. Returns `(arrived, admitted, rejected)`.
    fn generate_arrivals(
        &self,
        clock: &Stopwatch,
        watcher: &mut ExitWatcher,
    ) -> Result<(u64, u64, u64), SchedulerError> {
        let gateway = self.fleet.gateway();
        let (mut arrived, mut admitted, mut rejected) = (0, 0, 0);
        loop {
            watcher.poll()?;
            thread::sleep(millis(self.arrivals.sample()));
            if clock.is_elapsed(self.duration) {
                break;
            }
            let job = self.jobs.next_job();
            self.bus.publish(&SimEvent::JobArrived { job });
            arrived += 1;
            if gateway.schedule(job)? {
                admitted += 1;
            } else {
                rejected += 1;
            }
        }
        info!(arrived, admitted, rejected, "arrivals finished, draining");
        Ok((arrived, admitted, rejected))
    }

    /// Stop tiers in order, each one fully before the next.
    fn drain(&self, watcher: &mut ExitWatcher) -> Result<(), SchedulerError> {
        for manager in self.fleet.tiers() {
            manager.stop();
            watcher.wait_for(&manager_thread_name(manager))?;

            manager.stop_workers();
            for worker in manager.workers() {
                watcher.wait_for(&worker_thread_name(manager, worker.id()))?;
            }
            info!(role = %manager.role(), "tier drained");
        }
        Ok(())
    }
}

fn manager_thread_name(manager: &LoadManager) -> String {
    format!("{}-manager", manager.role())
}

fn worker_thread_name(manager: &LoadManager, worker: WorkerId) -> String {
    format!("{}-worker-{worker}", manager.role())
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        // Loop bodies never unwind past `spawn_loop`.
        let _ = handle.join();
    }
}

/// Tracks which loop threads have ended and surfaces the first failure.
struct ExitWatcher {
    exits: Receiver<ThreadExit>,
    exited: HashSet<String>,
}

impl ExitWatcher {
    fn new(exits: Receiver<ThreadExit>) -> Self {
        Self {
            exits,
            exited: HashSet::new(),
        }
    }

    fn record(&mut self, exit: ThreadExit) -> Result<(), SchedulerError> {
        debug!(thread = %exit.name, ok = exit.result.is_ok(), "loop thread exited");
        self.exited.insert(exit.name);
        exit.result
    }

    /// Consume reports that already arrived without blocking.
    fn poll(&mut self) -> Result<(), SchedulerError> {
        while let Ok(exit) = self.exits.try_recv() {
            self.record(exit)?;
        }
        Ok(())
    }

    /// Block until `name` has exited.
    fn wait_for(&mut self, name: &str) -> Result<(), SchedulerError> {
        while !self.exited.contains(name) {
            let exit = self
                .exits
                .recv()
                .map_err(|_| SchedulerError::Thread(format!("exit channel closed before {name} ended")))?;
            self.record(exit)?;
        }
        Ok(())
    }
}
