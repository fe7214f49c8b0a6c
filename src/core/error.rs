//! Error types for scheduler operations.

use thiserror::Error;

use crate::core::job::{JobId, Role, WorkerId};

/// Errors produced by scheduler components.
///
/// Admission rejections are not errors: they are steady-state outcomes
/// reported through `AdmitResult` and the event bus. Everything here is either
/// a broken invariant or a setup problem and must not be swallowed.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job was assigned to a worker that already holds one.
    #[error("worker {role}/{worker} already holds job {held}, refusing job {incoming}")]
    DoubleAssignment {
        /// Worker that refused the job.
        worker: WorkerId,
        /// Role of that worker.
        role: Role,
        /// Job the worker is processing.
        held: JobId,
        /// Job that was offered.
        incoming: JobId,
    },
    /// A job was assigned to a worker with a pending stop request.
    #[error("worker {role}/{worker} is stopping and refuses new jobs")]
    WorkerStopping {
        /// Worker that refused the job.
        worker: WorkerId,
        /// Role of that worker.
        role: Role,
    },
    /// A gateway worker holds a job whose role has no registered manager.
    #[error("no manager registered for role {role} (job {job})")]
    UnroutableJob {
        /// Job that could not be forwarded.
        job: JobId,
        /// Role the job asked for.
        role: Role,
    },
    /// A job left a queue without a matching enqueue record.
    #[error("job {job} left the {role} queue without a matching enqueue record")]
    MissingQueueBookkeeping {
        /// Job whose record is missing.
        job: JobId,
        /// Role of the queue it left.
        role: Role,
    },
    /// The simulation was asked to run more than once.
    #[error("simulation already ran")]
    AlreadyRan,
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A loop thread could not be spawned or panicked.
    #[error("thread error: {0}")]
    Thread(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
