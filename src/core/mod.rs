//! Core scheduling: jobs, the bounded priority queue, workers, load managers,
//! role routing and the event bus.

pub mod error;
pub mod events;
pub mod job;
pub mod manager;
pub mod queue;
pub mod routing;
pub mod worker;

pub use error::{AppResult, SchedulerError};
pub use events::{EventBus, EventRecorder, Listener, LogListener, SimEvent};
pub use job::{AtomicIdSource, IdSource, Job, JobFactory, JobId, Priority, Role, WorkerId};
pub use manager::{LoadManager, DEFAULT_DRAIN_TICK};
pub use queue::{AdmitResult, PriorityJobQueue};
pub use routing::RouteTable;
pub use worker::{Worker, WorkerKind, WorkerSpec, WorkerState};
