//! Worker state machine and execution loop.
//!
//! A worker holds at most one job. The owning manager assigns jobs under its
//! own lock; the worker's loop, running on a dedicated thread, is the only
//! place that releases a job again. Waiting for work uses a condvar, never
//! polling, and no lock is held while service time elapses.

use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info};

use crate::core::events::{EventBus, SimEvent};
use crate::core::job::{Job, Role, WorkerId};
use crate::core::manager::WakeSignal;
use crate::core::routing::RouteTable;
use crate::core::SchedulerError;
use crate::util::clock::millis;
use crate::util::distribution::Distribution;

/// Observable state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Ready for a job.
    Idle,
    /// Holding a job (processing or forwarding it).
    Busy,
    /// Loop exited after a stop request. Terminal.
    Stopped,
}

/// What a worker does with the jobs it receives.
#[derive(Clone)]
pub enum WorkerKind {
    /// Processes every job itself for a sampled service time.
    Processor,
    /// Processes gateway jobs itself and forwards every other job to the
    /// manager registered for its role, then waits a sampled dispatch latency.
    Gateway(Arc<RouteTable>),
}

/// Construction parameters for one worker, consumed by its manager.
pub struct WorkerSpec {
    kind: WorkerKind,
    timing: Box<dyn Distribution>,
}

impl WorkerSpec {
    /// A processing worker whose service time is drawn from `timing` (ms).
    #[must_use]
    pub fn processor(timing: Box<dyn Distribution>) -> Self {
        Self {
            kind: WorkerKind::Processor,
            timing,
        }
    }

    /// A gateway worker routing through `routes`; `timing` (ms) gives both the
    /// dispatch latency and the service time of gateway jobs.
    #[must_use]
    pub fn gateway(routes: Arc<RouteTable>, timing: Box<dyn Distribution>) -> Self {
        Self {
            kind: WorkerKind::Gateway(routes),
            timing,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<Job>,
    stop_requested: bool,
    running: bool,
    exited: bool,
}

/// Single-job processing unit owned by one manager.
pub struct Worker {
    id: WorkerId,
    role: Role,
    kind: WorkerKind,
    timing: Box<dyn Distribution>,
    bus: Arc<EventBus>,
    slot: Mutex<Slot>,
    assigned: Condvar,
    /// Wakes the owning manager's drain loop when this worker frees up.
    manager_wake: Arc<WakeSignal>,
}

impl Worker {
    pub(crate) fn new(
        id: WorkerId,
        role: Role,
        params: WorkerSpec,
        bus: Arc<EventBus>,
        manager_wake: Arc<WakeSignal>,
    ) -> Self {
        Self {
            id,
            role,
            kind: params.kind,
            timing: params.timing,
            bus,
            slot: Mutex::new(Slot::default()),
            assigned: Condvar::new(),
            manager_wake,
        }
    }

    /// Worker id, unique within its role.
    #[must_use]
    pub const fn id(&self) -> WorkerId {
        self.id
    }

    /// Role of the owning manager.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// True for gateway workers.
    #[must_use]
    pub const fn is_gateway(&self) -> bool {
        matches!(self.kind, WorkerKind::Gateway(_))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        let slot = self.slot.lock();
        if slot.exited {
            WorkerState::Stopped
        } else if slot.current.is_some() {
            WorkerState::Busy
        } else {
            WorkerState::Idle
        }
    }

    /// True when the worker can accept a job right now.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let slot = self.slot.lock();
        slot.current.is_none() && !slot.stop_requested && !slot.exited
    }

    /// The job currently held, if any.
    #[must_use]
    pub fn current_job(&self) -> Option<Job> {
        self.slot.lock().current
    }

    /// True while the execution loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.slot.lock().running
    }

    /// True once a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.slot.lock().stop_requested
    }

    /// Hand a job to this worker.
    ///
    /// # Errors
    ///
    /// - `DoubleAssignment` if a job is already held; the held job is untouched.
    /// - `WorkerStopping` if a stop has been requested.
    pub fn assign(&self, job: Job) -> Result<(), SchedulerError> {
        let mut slot = self.slot.lock();
        if let Some(held) = slot.current {
            return Err(SchedulerError::DoubleAssignment {
                worker: self.id,
                role: self.role,
                held: held.id(),
                incoming: job.id(),
            });
        }
        if slot.stop_requested || slot.exited {
            return Err(SchedulerError::WorkerStopping {
                worker: self.id,
                role: self.role,
            });
        }
        slot.current = Some(job);
        drop(slot);
        self.assigned.notify_one();
        Ok(())
    }

    /// Request the loop to exit once any in-flight job completes. Idempotent.
    pub fn stop(&self) {
        let mut slot = self.slot.lock();
        if !slot.stop_requested {
            slot.stop_requested = true;
            debug!(role = %self.role, worker = self.id, "worker stop requested");
        }
        drop(slot);
        self.assigned.notify_all();
    }

    /// Execution loop. Blocks the calling thread until a stop is requested and
    /// the held job (if any) is finished.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations raised while forwarding a job.
    pub fn run(&self) -> Result<(), SchedulerError> {
        self.slot.lock().running = true;
        info!(role = %self.role, worker = self.id, "worker loop started");

        let result = self.serve();

        {
            let mut slot = self.slot.lock();
            slot.running = false;
            slot.exited = true;
        }
        // The manager may be waiting for this worker during shutdown.
        self.manager_wake.notify();
        info!(role = %self.role, worker = self.id, "worker loop finished");
        result
    }

    fn serve(&self) -> Result<(), SchedulerError> {
        while let Some(job) = self.next_assignment() {
            let outcome = self.handle(job);
            self.release();
            outcome?;
        }
        Ok(())
    }

    /// Block until a job is held or a stop is requested with nothing held.
    fn next_assignment(&self) -> Option<Job> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(job) = slot.current {
                return Some(job);
            }
            if slot.stop_requested {
                return None;
            }
            self.assigned.wait(&mut slot);
        }
    }

    fn handle(&self, job: Job) -> Result<(), SchedulerError> {
        match &self.kind {
            WorkerKind::Gateway(routes) if job.role() != Role::Gateway => {
                self.forward(routes, job)
            }
            _ => {
                self.process(job);
                Ok(())
            }
        }
    }

    fn process(&self, job: Job) {
        self.bus.publish(&SimEvent::JobProcessingStarted {
            role: self.role,
            job,
            worker: self.id,
        });
        let service = millis(self.timing.sample());
        debug!(
            role = %self.role,
            worker = self.id,
            job = job.id(),
            service_ms = service.as_millis(),
            "processing job"
        );
        thread::sleep(service);
        self.bus.publish(&SimEvent::JobProcessed {
            role: self.role,
            job,
            worker: self.id,
        });
    }

    fn forward(&self, routes: &RouteTable, job: Job) -> Result<(), SchedulerError> {
        match routes.route(&job) {
            Ok(manager) => {
                self.bus.publish(&SimEvent::JobForwarded {
                    from: self.role,
                    to: job.role(),
                    job,
                    worker: self.id,
                });
                debug!(worker = self.id, job = job.id(), to = %job.role(), "forwarding job");
                manager.schedule(job)?;
            }
            Err(err) => {
                error!(worker = self.id, job = job.id(), error = %err, "dropping unroutable job");
                self.bus.publish(&SimEvent::JobUnroutable {
                    role: self.role,
                    job,
                    worker: self.id,
                });
            }
        }
        thread::sleep(millis(self.timing.sample()));
        Ok(())
    }

    /// Clear the held job and tell the manager this worker is free.
    fn release(&self) {
        self.slot.lock().current = None;
        self.manager_wake.notify();
    }
}
