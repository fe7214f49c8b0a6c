//! Wall-clock helpers used by the simulation loops.

use std::time::{Duration, Instant};

/// Convert a sampled value in milliseconds into a `Duration`.
///
/// Negative, NaN and infinite samples collapse to zero; values too large for
/// a `Duration` saturate.
#[must_use]
pub fn millis(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Measures elapsed time since it was started.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Start a new stopwatch at the current instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Time elapsed since the stopwatch was started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once strictly more than `duration` has elapsed.
    #[must_use]
    pub fn is_elapsed(&self, duration: Duration) -> bool {
        self.elapsed() > duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_conversion() {
        assert_eq!(millis(250.0), Duration::from_millis(250));
        assert_eq!(millis(0.0), Duration::ZERO);
        assert_eq!(millis(-3.0), Duration::ZERO);
        assert_eq!(millis(f64::NAN), Duration::ZERO);
        assert_eq!(millis(f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn test_stopwatch_elapsed() {
        let stopwatch = Stopwatch::start();
        assert!(!stopwatch.is_elapsed(Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(stopwatch.elapsed() >= Duration::from_millis(5));
    }
}
