//! Running aggregates used by the statistics collector.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::job::JobId;

/// Count and mean of a stream of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleMetric {
    count: u64,
    total: f64,
}

impl SampleMetric {
    /// Record one sample.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
    }

    /// Number of samples.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean of all samples, zero when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Per-job stopwatches whose elapsed times feed a [`SampleMetric`] in ms.
#[derive(Debug, Default)]
pub struct DurationMetric {
    started: HashMap<JobId, Instant>,
    samples: SampleMetric,
}

impl DurationMetric {
    /// Start timing `job`. Restarting replaces the earlier start.
    pub fn start(&mut self, job: JobId, now: Instant) {
        self.started.insert(job, now);
    }

    /// Stop timing `job` and record the elapsed time. Returns false when
    /// `job` was never started.
    pub fn finish(&mut self, job: JobId, now: Instant) -> bool {
        match self.started.remove(&job) {
            Some(start) => {
                self.samples.add(millis_f64(now.saturating_duration_since(start)));
                true
            }
            None => false,
        }
    }

    /// Forget `job` without recording a sample.
    pub fn cancel(&mut self, job: JobId) -> bool {
        self.started.remove(&job).is_some()
    }

    /// Jobs currently being timed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.started.len()
    }

    /// Completed measurements.
    #[must_use]
    pub const fn samples(&self) -> &SampleMetric {
        &self.samples
    }
}

/// Time-weighted average of a piecewise-constant level, such as a queue
/// length or the number of jobs in the system.
#[derive(Debug, Clone, Default)]
pub struct LevelMetric {
    level: usize,
    started: Option<Instant>,
    last_change: Option<Instant>,
    finished: Option<Instant>,
    /// Integral of the level over time, in level-seconds.
    area: f64,
    /// Time spent at level zero.
    empty: Duration,
}

impl LevelMetric {
    /// Level zero, observation window not yet started.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 0,
            started: None,
            last_change: None,
            finished: None,
            area: 0.0,
            empty: Duration::ZERO,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Open the observation window at `at` with level zero. No-op once the
    /// window is already open.
    pub fn start(&mut self, at: Instant) {
        if self.started.is_none() {
            self.started = Some(at);
            self.last_change = Some(at);
        }
    }

    /// Move to `level` at `now`. Opens the window if `start` was never called.
    pub fn set(&mut self, level: usize, now: Instant) {
        if self.finished.is_some() {
            return;
        }
        self.accumulate(now);
        self.started.get_or_insert(now);
        self.level = level;
    }

    /// Raise the level by one.
    pub fn increment(&mut self, now: Instant) {
        self.set(self.level + 1, now);
    }

    /// Lower the level by one, saturating at zero.
    pub fn decrement(&mut self, now: Instant) {
        self.set(self.level.saturating_sub(1), now);
    }

    /// Close the observation window. Later changes are ignored.
    pub fn finish(&mut self, now: Instant) {
        if self.finished.is_none() {
            self.accumulate(now);
            self.finished = Some(now);
        }
    }

    /// Time-weighted mean level up to `now` (or the end of the window).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self, now: Instant) -> f64 {
        let Some(window) = self.window(now) else {
            return self.level as f64;
        };
        let (area, _) = self.totals(now);
        if window.is_zero() {
            self.level as f64
        } else {
            area / window.as_secs_f64()
        }
    }

    /// Fraction of the window spent at level zero, in `[0, 1]`.
    #[must_use]
    pub fn empty_fraction(&self, now: Instant) -> f64 {
        let Some(window) = self.window(now) else {
            return if self.level == 0 { 1.0 } else { 0.0 };
        };
        if window.is_zero() {
            return if self.level == 0 { 1.0 } else { 0.0 };
        }
        let (_, empty) = self.totals(now);
        (empty.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn window(&self, now: Instant) -> Option<Duration> {
        let start = self.started?;
        Some(self.finished.unwrap_or(now).saturating_duration_since(start))
    }

    /// Area and empty time including the still-open segment.
    #[allow(clippy::cast_precision_loss)]
    fn totals(&self, now: Instant) -> (f64, Duration) {
        let (mut area, mut empty) = (self.area, self.empty);
        if self.finished.is_none() {
            if let Some(last) = self.last_change {
                let open = now.saturating_duration_since(last);
                area += self.level as f64 * open.as_secs_f64();
                if self.level == 0 {
                    empty += open;
                }
            }
        }
        (area, empty)
    }

    #[allow(clippy::cast_precision_loss)]
    fn accumulate(&mut self, now: Instant) {
        if let Some(last) = self.last_change {
            let segment = now.saturating_duration_since(last);
            self.area += self.level as f64 * segment.as_secs_f64();
            if self.level == 0 {
                self.empty += segment;
            }
        }
        self.last_change = Some(now);
    }
}

fn millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}
