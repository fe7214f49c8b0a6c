//! Per-role load manager: direct assignment, queue admission and the drain loop.
//!
//! One mutex (the one around the queue) guards every scheduling decision, so
//! `schedule` and the drain loop can never both see the same worker idle and
//! double-assign it. The critical section only moves jobs around; simulated
//! waiting happens on worker threads, outside of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::core::events::{EventBus, SimEvent};
use crate::core::job::{Job, JobId, Role, WorkerId};
use crate::core::queue::{AdmitResult, PriorityJobQueue};
use crate::core::worker::{Worker, WorkerSpec};
use crate::core::SchedulerError;

/// Default pause between drain-loop passes when nothing wakes it earlier.
pub const DEFAULT_DRAIN_TICK: Duration = Duration::from_millis(1);

/// Shared state for Condvar-based wake notifications.
#[derive(Debug, Default)]
struct WakeState {
    /// Set when a worker may have become idle or a stop was requested.
    pending: bool,
}

/// Wake-up signal for a drain loop. Workers notify it when they free up.
#[derive(Debug, Default)]
pub(crate) struct WakeSignal {
    state: Mutex<WakeState>,
    condvar: Condvar,
}

impl WakeSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn notify(&self) {
        self.state.lock().pending = true;
        self.condvar.notify_one();
    }

    /// Wait until notified or `timeout` elapses, then clear the flag.
    pub(crate) fn wait(&self, timeout: Duration) {
        let mut state = self.state.lock();
        if !state.pending {
            let _ = self.condvar.wait_for(&mut state, timeout);
        }
        state.pending = false;
    }
}

/// Scheduler for one role: owns that role's workers and queue.
pub struct LoadManager {
    role: Role,
    workers: Vec<Arc<Worker>>,
    /// The manager lock. Guards the queue and every worker hand-off.
    queue: Mutex<PriorityJobQueue>,
    queue_capacity: usize,
    bus: Arc<EventBus>,
    wake: Arc<WakeSignal>,
    tick: Duration,
    stopping: AtomicBool,
    aborted: AtomicBool,
    stopped: AtomicBool,
}

impl LoadManager {
    /// Create a manager with a queue of `queue_capacity` and one worker per
    /// entry of `workers`. Worker ids are assigned from 1 in that order, which
    /// is also the order idle workers are picked in.
    #[must_use]
    pub fn new(
        role: Role,
        queue_capacity: usize,
        bus: Arc<EventBus>,
        workers: Vec<WorkerSpec>,
    ) -> Self {
        let wake = Arc::new(WakeSignal::new());
        let workers = (1..)
            .zip(workers)
            .map(|(id, params)| {
                Arc::new(Worker::new(
                    id,
                    role,
                    params,
                    Arc::clone(&bus),
                    Arc::clone(&wake),
                ))
            })
            .collect();
        Self {
            role,
            workers,
            queue: Mutex::new(PriorityJobQueue::new(queue_capacity)),
            queue_capacity,
            bus,
            wake,
            tick: DEFAULT_DRAIN_TICK,
            stopping: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Override the drain-loop tick.
    #[must_use]
    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Role this manager schedules for.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Workers in assignment order.
    #[must_use]
    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    /// Current queue occupancy.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queue capacity.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Ids of the jobs currently queued, most urgent first.
    #[must_use]
    pub fn queued_job_ids(&self) -> Vec<JobId> {
        self.queue.lock().iter().map(Job::id).collect()
    }

    /// True once `stop` has been called.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// True once the drain loop has emptied the queue and exited.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Offer a job to this manager.
    ///
    /// Under the manager lock: the first idle worker in assignment order gets
    /// the job directly; otherwise the queue decides admission, possibly
    /// evicting a less urgent job. Once the drain loop has exited, jobs that
    /// cannot be assigned directly are rejected rather than queued where
    /// nothing would drain them.
    ///
    /// Returns `Ok(true)` if the job was admitted somewhere, `Ok(false)` if it
    /// was rejected.
    ///
    /// # Errors
    ///
    /// Only invariant violations (a worker refusing an assignment it looked
    /// ready for).
    pub fn schedule(&self, job: Job) -> Result<bool, SchedulerError> {
        let mut queue = self.queue.lock();

        if let Some(worker) = self.workers.iter().find(|w| w.is_idle()) {
            debug!(role = %self.role, job = job.id(), worker = worker.id(), "assigning job directly");
            self.bus.publish(&SimEvent::JobScheduled {
                role: self.role,
                job,
                direct: true,
            });
            worker.assign(job)?;
            return Ok(true);
        }

        if self.is_stopped() {
            warn!(role = %self.role, job = job.id(), "rejecting job: drain loop already stopped");
            self.bus.publish(&SimEvent::JobRejected {
                role: self.role,
                job,
                queue_len: queue.len(),
            });
            return Ok(false);
        }

        match queue.try_admit(job) {
            AdmitResult::Admitted => {
                debug!(role = %self.role, job = job.id(), queue_len = queue.len(), "job queued");
                self.publish_queued(job, queue.len());
                Ok(true)
            }
            AdmitResult::AdmittedWithEviction(evicted) => {
                debug!(
                    role = %self.role,
                    job = job.id(),
                    evicted = evicted.id(),
                    queue_len = queue.len(),
                    "job queued, less urgent job evicted"
                );
                self.bus.publish(&SimEvent::JobEvicted {
                    role: self.role,
                    job: evicted,
                    queue_len: queue.len(),
                });
                self.publish_queued(job, queue.len());
                Ok(true)
            }
            AdmitResult::Rejected(job) => {
                debug!(role = %self.role, job = job.id(), queue_len = queue.len(), "job rejected: queue full");
                self.bus.publish(&SimEvent::JobRejected {
                    role: self.role,
                    job,
                    queue_len: queue.len(),
                });
                Ok(false)
            }
        }
    }

    fn publish_queued(&self, job: Job, queue_len: usize) {
        self.bus.publish(&SimEvent::JobQueued {
            role: self.role,
            job,
            queue_len,
        });
        self.bus.publish(&SimEvent::JobScheduled {
            role: self.role,
            job,
            direct: false,
        });
    }

    /// Drain loop. Hands queued jobs to idle workers until a stop has been
    /// requested and the queue is empty, then marks the manager stopped.
    ///
    /// A manager without workers cannot drain; once stopping, it rejects its
    /// remaining backlog so shutdown terminates. An aborted manager does the
    /// same regardless of its workers.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations from worker assignment.
    pub fn run(&self) -> Result<(), SchedulerError> {
        info!(
            role = %self.role,
            workers = self.workers.len(),
            queue_capacity = self.queue_capacity,
            "drain loop started"
        );
        loop {
            {
                let mut queue = self.queue.lock();
                self.dispatch_idle(&mut queue)?;
                if self.is_stopping() {
                    if self.workers.is_empty() || self.aborted.load(Ordering::Acquire) {
                        self.reject_backlog(&mut queue);
                    }
                    if queue.is_empty() {
                        self.stopped.store(true, Ordering::Release);
                        break;
                    }
                }
            }
            self.wake.wait(self.tick);
        }
        info!(role = %self.role, "queue drained, drain loop stopped");
        Ok(())
    }

    /// Give the best queued job to every idle worker. Caller holds the lock.
    fn dispatch_idle(&self, queue: &mut PriorityJobQueue) -> Result<(), SchedulerError> {
        for worker in &self.workers {
            if queue.is_empty() {
                break;
            }
            if !worker.is_idle() {
                continue;
            }
            if let Some(job) = queue.try_remove_best() {
                self.publish_popped(job, worker.id(), queue.len());
                worker.assign(job)?;
            }
        }
        Ok(())
    }

    fn publish_popped(&self, job: Job, worker: WorkerId, queue_len: usize) {
        debug!(role = %self.role, job = job.id(), worker, queue_len, "job taken from queue");
        self.bus.publish(&SimEvent::JobPopped {
            role: self.role,
            job,
            worker,
            queue_len,
        });
    }

    fn reject_backlog(&self, queue: &mut PriorityJobQueue) {
        while let Some(job) = queue.try_remove_best() {
            warn!(role = %self.role, job = job.id(), "rejecting queued job: nothing left to drain it");
            self.bus.publish(&SimEvent::JobRejected {
                role: self.role,
                job,
                queue_len: queue.len(),
            });
        }
    }

    /// Ask the drain loop to exit once the queue is empty. Idempotent.
    pub fn stop(&self) {
        if !self.stopping.swap(true, Ordering::AcqRel) {
            info!(role = %self.role, queue_len = self.queue_len(), "manager stop requested");
        }
        self.wake.notify();
    }

    /// Stop without draining: the loop rejects whatever is still queued and
    /// exits on its next pass. Used when another loop failed.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        if !self.stopping.swap(true, Ordering::AcqRel) {
            warn!(role = %self.role, queue_len = self.queue_len(), "manager aborted");
        }
        self.wake.notify();
    }

    /// Ask every worker to stop after its in-flight job.
    pub fn stop_workers(&self) {
        for worker in &self.workers {
            worker.stop();
        }
    }
}
