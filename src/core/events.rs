//! Event bus fanning scheduler lifecycle events out to listeners.
//!
//! Publishing holds the bus lock while every listener runs, so all producers
//! (managers, workers, the driver) share one total order of delivered events.
//! A listener must never publish from inside a handler: the bus lock is not
//! re-entrant and the publishing thread would deadlock.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::job::{Job, Role, WorkerId};

/// Scheduler lifecycle event.
///
/// Events carry everything listeners need (role, queue length after the
/// transition, worker id) so no listener has to call back into a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// A job was generated by the arrival loop.
    JobArrived {
        /// The new job.
        job: Job,
    },
    /// A job was admitted by a manager, directly or through its queue.
    JobScheduled {
        /// Manager role.
        role: Role,
        /// The job.
        job: Job,
        /// True when handed straight to an idle worker.
        direct: bool,
    },
    /// A job entered a queue.
    JobQueued {
        /// Manager role.
        role: Role,
        /// The job.
        job: Job,
        /// Queue length after insertion.
        queue_len: usize,
    },
    /// A queued job was displaced by a more urgent arrival.
    JobEvicted {
        /// Manager role.
        role: Role,
        /// The displaced job.
        job: Job,
        /// Queue length once the newcomer has taken its place.
        queue_len: usize,
    },
    /// A queued job was handed to a worker by the drain loop.
    JobPopped {
        /// Manager role.
        role: Role,
        /// The job.
        job: Job,
        /// Worker receiving the job.
        worker: WorkerId,
        /// Queue length after removal.
        queue_len: usize,
    },
    /// A job was turned away and is gone.
    JobRejected {
        /// Manager role.
        role: Role,
        /// The job.
        job: Job,
        /// Queue length at the time of rejection.
        queue_len: usize,
    },
    /// A worker started its simulated service time.
    JobProcessingStarted {
        /// Worker role.
        role: Role,
        /// The job.
        job: Job,
        /// Worker processing it.
        worker: WorkerId,
    },
    /// A worker finished processing a job.
    JobProcessed {
        /// Worker role.
        role: Role,
        /// The job.
        job: Job,
        /// Worker that processed it.
        worker: WorkerId,
    },
    /// A gateway worker handed a job to the manager of its role.
    JobForwarded {
        /// Role of the forwarding worker.
        from: Role,
        /// Destination role.
        to: Role,
        /// The job.
        job: Job,
        /// Forwarding worker.
        worker: WorkerId,
    },
    /// A gateway worker found no manager for the job's role.
    JobUnroutable {
        /// Role of the worker that held the job.
        role: Role,
        /// The job.
        job: Job,
        /// Worker that held it.
        worker: WorkerId,
    },
    /// Arrivals stopped and every manager and worker has drained.
    AllJobsDrained,
}

impl SimEvent {
    /// Short kebab-case name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JobArrived { .. } => "job-arrived",
            Self::JobScheduled { .. } => "job-scheduled",
            Self::JobQueued { .. } => "job-queued",
            Self::JobEvicted { .. } => "job-evicted",
            Self::JobPopped { .. } => "job-popped",
            Self::JobRejected { .. } => "job-rejected",
            Self::JobProcessingStarted { .. } => "job-processing-started",
            Self::JobProcessed { .. } => "job-processed",
            Self::JobForwarded { .. } => "job-forwarded",
            Self::JobUnroutable { .. } => "job-unroutable",
            Self::AllJobsDrained => "all-jobs-drained",
        }
    }

    /// The job the event is about, if any.
    #[must_use]
    pub const fn job(&self) -> Option<&Job> {
        match self {
            Self::JobArrived { job }
            | Self::JobScheduled { job, .. }
            | Self::JobQueued { job, .. }
            | Self::JobEvicted { job, .. }
            | Self::JobPopped { job, .. }
            | Self::JobRejected { job, .. }
            | Self::JobProcessingStarted { job, .. }
            | Self::JobProcessed { job, .. }
            | Self::JobForwarded { job, .. }
            | Self::JobUnroutable { job, .. } => Some(job),
            Self::AllJobsDrained => None,
        }
    }
}

/// Receiver of scheduler events. Every handler defaults to a no-op.
///
/// The bus calls [`Listener::on_event`], which dispatches to the per-kind
/// handlers; override either level.
pub trait Listener: Send {
    /// A job arrived.
    fn job_arrived(&mut self, _job: &Job) {}
    /// A job was admitted by `role`'s manager.
    fn job_scheduled(&mut self, _role: Role, _job: &Job, _direct: bool) {}
    /// A job entered `role`'s queue.
    fn job_queued(&mut self, _role: Role, _job: &Job, _queue_len: usize) {}
    /// A job was evicted from `role`'s queue.
    fn job_evicted(&mut self, _role: Role, _job: &Job, _queue_len: usize) {}
    /// A job left `role`'s queue for a worker.
    fn job_popped(&mut self, _role: Role, _job: &Job, _worker: WorkerId, _queue_len: usize) {}
    /// A job was rejected by `role`'s manager.
    fn job_rejected(&mut self, _role: Role, _job: &Job, _queue_len: usize) {}
    /// A worker started processing a job.
    fn job_processing_started(&mut self, _role: Role, _job: &Job, _worker: WorkerId) {}
    /// A worker finished processing a job.
    fn job_processed(&mut self, _role: Role, _job: &Job, _worker: WorkerId) {}
    /// A gateway worker forwarded a job.
    fn job_forwarded(&mut self, _from: Role, _to: Role, _job: &Job, _worker: WorkerId) {}
    /// A gateway worker could not route a job.
    fn job_unroutable(&mut self, _role: Role, _job: &Job, _worker: WorkerId) {}
    /// The simulation drained completely.
    fn all_jobs_drained(&mut self) {}

    /// Entry point used by the bus.
    fn on_event(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::JobArrived { ref job } => self.job_arrived(job),
            SimEvent::JobScheduled { role, ref job, direct } => self.job_scheduled(role, job, direct),
            SimEvent::JobQueued { role, ref job, queue_len } => self.job_queued(role, job, queue_len),
            SimEvent::JobEvicted { role, ref job, queue_len } => {
                self.job_evicted(role, job, queue_len);
            }
            SimEvent::JobPopped { role, ref job, worker, queue_len } => {
                self.job_popped(role, job, worker, queue_len);
            }
            SimEvent::JobRejected { role, ref job, queue_len } => {
                self.job_rejected(role, job, queue_len);
            }
            SimEvent::JobProcessingStarted { role, ref job, worker } => {
                self.job_processing_started(role, job, worker);
            }
            SimEvent::JobProcessed { role, ref job, worker } => self.job_processed(role, job, worker),
            SimEvent::JobForwarded { from, to, ref job, worker } => {
                self.job_forwarded(from, to, job, worker);
            }
            SimEvent::JobUnroutable { role, ref job, worker } => {
                self.job_unroutable(role, job, worker);
            }
            SimEvent::AllJobsDrained => self.all_jobs_drained(),
        }
    }
}

/// A shared listener stays readable by its owner after being subscribed.
impl<L: Listener> Listener for Arc<Mutex<L>> {
    fn on_event(&mut self, event: &SimEvent) {
        self.lock().on_event(event);
    }
}

/// Synchronous fan-out of events to every subscribed listener.
///
/// Listeners are added during setup and never removed.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<Box<dyn Listener>>>,
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it receives events after the ones already registered.
    pub fn subscribe(&self, listener: Box<dyn Listener>) {
        self.listeners.lock().push(listener);
    }

    /// Deliver an event to every listener, in registration order.
    pub fn publish(&self, event: &SimEvent) {
        let mut listeners = self.listeners.lock();
        for listener in listeners.iter_mut() {
            listener.on_event(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Bounded in-memory listener that keeps the most recent events.
///
/// Clones share the same buffer, so a test can subscribe one clone and read
/// the other.
#[derive(Clone)]
pub struct EventRecorder {
    events: Arc<Mutex<VecDeque<SimEvent>>>,
    max_events: usize,
}

impl EventRecorder {
    /// Create a recorder keeping at most `max_events` events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(4096)))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().iter().copied().collect()
    }

    /// Kinds of the stored events, oldest first.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SimEvent::kind).collect()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Listener for EventRecorder {
    fn on_event(&mut self, event: &SimEvent) {
        let mut events = self.events.lock();
        if self.max_events == 0 {
            return;
        }
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(*event);
    }
}

/// Listener that mirrors every event into `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl Listener for LogListener {
    fn on_event(&mut self, event: &SimEvent) {
        match event.job() {
            Some(job) => tracing::debug!(
                kind = event.kind(),
                job = job.id(),
                priority = job.priority(),
                role = %job.role(),
                "scheduler event"
            ),
            None => tracing::debug!(kind = event.kind(), "scheduler event"),
        }
    }
}
