//! Event-driven statistics for a simulation run.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::error;

use crate::config::SimulationConfig;
use crate::core::events::Listener;
use crate::core::job::{Job, JobId, Role, WorkerId};
use crate::core::SchedulerError;
use crate::stats::metrics::{DurationMetric, LevelMetric};
use crate::stats::report::{RoleReport, SimulationReport};

/// Counters and timers for one role's tier.
#[derive(Debug, Default)]
struct RoleStats {
    scheduled_direct: u64,
    queued: u64,
    evicted: u64,
    rejected: u64,
    /// Rejections of jobs that never sat in this tier's queue.
    rejected_on_arrival: u64,
    forwarded: u64,
    unroutable: u64,
    processed: u64,
    processing: DurationMetric,
    queue_wait: DurationMetric,
    queue_len: LevelMetric,
}

impl RoleStats {
    fn report(&self, role: Role, now: Instant) -> RoleReport {
        RoleReport {
            role,
            processed: self.processed,
            scheduled_direct: self.scheduled_direct,
            queued: self.queued,
            evicted: self.evicted,
            rejected: self.rejected,
            forwarded: self.forwarded,
            unroutable: self.unroutable,
            average_processing_ms: self.processing.samples().mean(),
            average_queue_wait_ms: self.queue_wait.samples().mean(),
            average_queue_len: self.queue_len.average(now),
        }
    }
}

/// Listener aggregating per-role and system-wide statistics.
///
/// Everything is derived from events; the collector never looks at a manager.
/// A job leaving a queue it was never recorded in poisons the collector and
/// [`SimulationStatistics::report`] then fails rather than report skewed numbers.
#[derive(Debug)]
pub struct SimulationStatistics {
    count_rejected_as_arrived: bool,
    roles: BTreeMap<Role, RoleStats>,
    arrived: u64,
    run_started: Option<Instant>,
    in_system: LevelMetric,
    drained: bool,
    poisoned: Option<(JobId, Role)>,
}

impl SimulationStatistics {
    /// Collector with no pre-registered roles; roles appear as events arrive.
    #[must_use]
    pub const fn new(count_rejected_as_arrived: bool) -> Self {
        Self {
            count_rejected_as_arrived,
            roles: BTreeMap::new(),
            arrived: 0,
            run_started: None,
            in_system: LevelMetric::new(),
            drained: false,
            poisoned: None,
        }
    }

    /// Collector reporting on every role configured in `cfg`, even idle ones.
    #[must_use]
    pub fn from_config(cfg: &SimulationConfig) -> Self {
        let mut stats = Self::new(cfg.count_rejected_as_arrived);
        for role in cfg.roles.keys() {
            stats.roles.entry(*role).or_default();
        }
        stats
    }

    /// True once `AllJobsDrained` has been seen.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.drained
    }

    /// True when bookkeeping broke and no report can be produced.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Build the report from everything observed so far.
    ///
    /// # Errors
    ///
    /// `MissingQueueBookkeeping` when a job left a queue without having
    /// entered it.
    pub fn report(&self) -> Result<SimulationReport, SchedulerError> {
        if let Some((job, role)) = self.poisoned {
            return Err(SchedulerError::MissingQueueBookkeeping { job, role });
        }
        let now = Instant::now();
        let roles: Vec<RoleReport> = self
            .roles
            .iter()
            .map(|(role, stats)| stats.report(*role, now))
            .collect();

        let rejected: u64 = roles.iter().map(|r| r.rejected).sum();
        let evicted: u64 = roles.iter().map(|r| r.evicted).sum();
        let unroutable: u64 = roles.iter().map(|r| r.unroutable).sum();
        let processed: u64 = roles.iter().map(|r| r.processed).sum();
        let rejected_on_arrival = self
            .roles
            .get(&Role::Gateway)
            .map_or(0, |s| s.rejected_on_arrival);

        let (dropped, considered) = if self.count_rejected_as_arrived {
            (rejected + evicted + unroutable, self.arrived)
        } else {
            (
                rejected - rejected_on_arrival + evicted + unroutable,
                self.arrived.saturating_sub(rejected_on_arrival),
            )
        };

        Ok(SimulationReport {
            arrived: self.arrived,
            processed,
            rejected,
            evicted,
            unroutable,
            drop_probability: ratio(dropped, considered),
            average_jobs_in_system: self.in_system.average(now),
            idle_probability: self.in_system.empty_fraction(now),
            roles,
        })
    }

    /// Stats for `role`; a tier first seen mid-run still averages from the run start.
    fn role(&mut self, role: Role) -> &mut RoleStats {
        let run_started = self.run_started;
        self.roles.entry(role).or_insert_with(|| {
            let mut stats = RoleStats::default();
            if let Some(at) = run_started {
                stats.queue_len.start(at);
            }
            stats
        })
    }

    /// A job is gone for good (processed, rejected, evicted or unroutable).
    fn job_left(&mut self, now: Instant) {
        self.in_system.decrement(now);
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl Listener for SimulationStatistics {
    fn job_arrived(&mut self, _job: &Job) {
        let now = Instant::now();
        if self.run_started.is_none() {
            self.run_started = Some(now);
            for stats in self.roles.values_mut() {
                stats.queue_len.start(now);
            }
        }
        self.arrived += 1;
        self.in_system.increment(now);
    }

    fn job_scheduled(&mut self, role: Role, _job: &Job, direct: bool) {
        if direct {
            self.role(role).scheduled_direct += 1;
        }
    }

    fn job_queued(&mut self, role: Role, job: &Job, queue_len: usize) {
        let now = Instant::now();
        let stats = self.role(role);
        stats.queued += 1;
        stats.queue_wait.start(job.id(), now);
        stats.queue_len.set(queue_len, now);
    }

    fn job_evicted(&mut self, role: Role, job: &Job, queue_len: usize) {
        let now = Instant::now();
        let stats = self.role(role);
        stats.evicted += 1;
        stats.queue_wait.cancel(job.id());
        stats.queue_len.set(queue_len, now);
        self.job_left(now);
    }

    fn job_popped(&mut self, role: Role, job: &Job, _worker: WorkerId, queue_len: usize) {
        let now = Instant::now();
        let stats = self.role(role);
        stats.queue_len.set(queue_len, now);
        if !stats.queue_wait.finish(job.id(), now) && self.poisoned.is_none() {
            error!(role = %role, job = job.id(), "job left a queue it was never recorded in");
            self.poisoned = Some((job.id(), role));
        }
    }

    fn job_rejected(&mut self, role: Role, job: &Job, queue_len: usize) {
        let now = Instant::now();
        let stats = self.role(role);
        stats.rejected += 1;
        // Backlog rejected at shutdown was queued; a fresh arrival was not.
        if stats.queue_wait.cancel(job.id()) {
            stats.queue_len.set(queue_len, now);
        } else {
            stats.rejected_on_arrival += 1;
        }
        self.job_left(now);
    }

    fn job_processing_started(&mut self, role: Role, job: &Job, _worker: WorkerId) {
        self.role(role).processing.start(job.id(), Instant::now());
    }

    fn job_processed(&mut self, role: Role, job: &Job, _worker: WorkerId) {
        let now = Instant::now();
        let stats = self.role(role);
        stats.processed += 1;
        stats.processing.finish(job.id(), now);
        self.job_left(now);
    }

    fn job_forwarded(&mut self, from: Role, _to: Role, _job: &Job, _worker: WorkerId) {
        self.role(from).forwarded += 1;
    }

    fn job_unroutable(&mut self, role: Role, _job: &Job, _worker: WorkerId) {
        self.role(role).unroutable += 1;
        self.job_left(Instant::now());
    }

    fn all_jobs_drained(&mut self) {
        let now = Instant::now();
        self.drained = true;
        self.in_system.finish(now);
        for stats in self.roles.values_mut() {
            stats.queue_len.finish(now);
        }
    }
}
