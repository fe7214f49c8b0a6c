//! Bounded priority queue with eviction-based admission control.

use std::collections::BTreeMap;

use crate::core::job::{Job, JobId, Priority};

/// Outcome of offering a job to a [`PriorityJobQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitResult {
    /// The queue had room and the job was inserted.
    Admitted,
    /// The queue was full; the carried job was evicted to make room.
    AdmittedWithEviction(Job),
    /// The queue was full and the job was not more urgent than the worst
    /// queued job. The job is handed back untouched.
    Rejected(Job),
}

impl AdmitResult {
    /// True when the offered job now sits in the queue.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// The job displaced by this admission, if any.
    #[must_use]
    pub const fn evicted(&self) -> Option<&Job> {
        match self {
            Self::AdmittedWithEviction(job) => Some(job),
            _ => None,
        }
    }
}

/// Bounded multiset of jobs ordered by priority.
///
/// Entries are keyed by `(priority, insertion sequence)`, which gives
/// O(log n) access to both ends: the best job (smallest priority, oldest
/// first) and the worst one. Among several jobs sharing the worst priority the
/// oldest is the one evicted.
///
/// The queue has no lock of its own: it lives inside its manager's mutex, so
/// each call is one critical section.
#[derive(Debug)]
pub struct PriorityJobQueue {
    capacity: usize,
    entries: BTreeMap<(Priority, u64), Job>,
    next_seq: u64,
}

impl PriorityJobQueue {
    /// Create an empty queue holding at most `capacity` jobs.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Offer a job, evicting the worst queued job if the newcomer is strictly
    /// more urgent and the queue is full.
    pub fn try_admit(&mut self, job: Job) -> AdmitResult {
        if self.entries.len() < self.capacity {
            self.insert(job);
            return AdmitResult::Admitted;
        }

        let Some(worst) = self.worst_key() else {
            // Zero capacity.
            return AdmitResult::Rejected(job);
        };
        if worst.0 <= job.priority() {
            return AdmitResult::Rejected(job);
        }

        match self.entries.remove(&worst) {
            Some(evicted) => {
                self.insert(job);
                AdmitResult::AdmittedWithEviction(evicted)
            }
            None => AdmitResult::Rejected(job),
        }
    }

    /// Remove and return the most urgent job, oldest first among equals.
    pub fn try_remove_best(&mut self) -> Option<Job> {
        self.entries.pop_first().map(|(_, job)| job)
    }

    /// True when no job is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of queued jobs.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// True if a job with this id is queued.
    #[must_use]
    pub fn contains(&self, id: JobId) -> bool {
        self.entries.values().any(|job| job.id() == id)
    }

    /// Queued jobs, most urgent first.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.entries.values()
    }

    fn insert(&mut self, job: Job) {
        self.entries.insert((job.priority(), self.next_seq), job);
        self.next_seq += 1;
    }

    /// Key of the oldest job among those with the largest priority value.
    fn worst_key(&self) -> Option<(Priority, u64)> {
        let (&(worst, _), _) = self.entries.last_key_value()?;
        self.entries.range((worst, 0)..).next().map(|(key, _)| *key)
    }
}
