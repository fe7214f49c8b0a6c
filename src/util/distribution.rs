//! Random-variate generators for inter-arrival and service times.
//!
//! Every generator returns values in milliseconds. Random generators own a
//! seeded `StdRng` behind a `parking_lot::Mutex` so one instance can be shared
//! by reference across threads and a run is reproducible in its samples.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Exp, Gamma as GammaSampler};

/// Source of non-negative samples.
pub trait Distribution: Send + Sync {
    /// Draw the next sample. Implementations never return a negative value.
    fn sample(&self) -> f64;
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct Constant {
    value: f64,
}

impl Constant {
    /// A distribution that always samples `value` (clamped at zero).
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: if value > 0.0 { value } else { 0.0 },
        }
    }
}

impl Distribution for Constant {
    fn sample(&self) -> f64 {
        self.value
    }
}

/// Exponential distribution parameterised by its mean (`scale`).
pub struct Exponential {
    /// `None` when the mean is not positive; every sample is then zero.
    sampler: Option<Exp<f64>>,
    rng: Mutex<StdRng>,
}

impl Exponential {
    /// Exponential with mean `scale`, seeded with `seed`.
    #[must_use]
    pub fn new(scale: f64, seed: u64) -> Self {
        let sampler = if scale > 0.0 { Exp::new(1.0 / scale).ok() } else { None };
        Self {
            sampler,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Distribution for Exponential {
    fn sample(&self) -> f64 {
        self.sampler
            .as_ref()
            .map_or(0.0, |exp| exp.sample(&mut *self.rng.lock()).max(0.0))
    }
}

/// Gamma draws with a fallback to zero for parameters the sampler refuses.
fn gamma_sampler(shape: f64, scale: f64) -> Option<GammaSampler<f64>> {
    if shape > 0.0 && scale > 0.0 {
        GammaSampler::new(shape, scale).ok()
    } else {
        None
    }
}

/// Erlang distribution: sum of `shape` exponentials with total mean `scale`.
pub struct Erlang {
    sampler: Option<GammaSampler<f64>>,
    rng: Mutex<StdRng>,
}

impl Erlang {
    /// Erlang of order `shape` and mean `scale`, seeded with `seed`.
    #[must_use]
    pub fn new(shape: u32, scale: f64, seed: u64) -> Self {
        let shape = f64::from(shape.max(1));
        Self {
            sampler: gamma_sampler(shape, scale / shape),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Distribution for Erlang {
    fn sample(&self) -> f64 {
        self.sampler
            .as_ref()
            .map_or(0.0, |gamma| gamma.sample(&mut *self.rng.lock()).max(0.0))
    }
}

/// Gamma distribution with shape `k` and scale `theta`.
pub struct Gamma {
    sampler: Option<GammaSampler<f64>>,
    rng: Mutex<StdRng>,
}

impl Gamma {
    /// Gamma with the given shape and scale, seeded with `seed`.
    #[must_use]
    pub fn new(shape: f64, scale: f64, seed: u64) -> Self {
        Self {
            sampler: gamma_sampler(shape, scale),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Distribution for Gamma {
    fn sample(&self) -> f64 {
        self.sampler
            .as_ref()
            .map_or(0.0, |gamma| gamma.sample(&mut *self.rng.lock()).max(0.0))
    }
}

/// Continuous uniform distribution on `[low, high)`.
pub struct Uniform {
    low: f64,
    high: f64,
    rng: Mutex<StdRng>,
}

impl Uniform {
    /// Uniform on `[low, high)`, seeded with `seed`. Bounds are clamped at zero.
    #[must_use]
    pub fn new(low: f64, high: f64, seed: u64) -> Self {
        let low = low.max(0.0);
        Self {
            low,
            high: high.max(low),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Distribution for Uniform {
    fn sample(&self) -> f64 {
        let u = self.rng.lock().random::<f64>();
        (self.high - self.low).mul_add(u, self.low)
    }
}

/// Deterministic stream of seeds (splitmix64) so every generator in a run
/// gets its own independent, reproducible seed.
#[derive(Debug, Clone)]
pub struct SeedStream {
    state: u64,
}

impl SeedStream {
    /// Start a stream from a base seed.
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self { state: base }
    }

    /// Produce the next seed.
    pub fn next_seed(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(dist: &dyn Distribution, n: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let total = n as f64;
        (0..n).map(|_| dist.sample()).sum::<f64>() / total
    }

    #[test]
    fn test_constant() {
        let dist = Constant::new(12.5);
        assert!((dist.sample() - 12.5).abs() < f64::EPSILON);
        assert!(Constant::new(-1.0).sample().abs() < f64::EPSILON);
    }

    #[test]
    fn test_exponential_mean() {
        let dist = Exponential::new(10.0, 7);
        let m = mean(&dist, 20_000);
        assert!((m - 10.0).abs() < 1.0, "mean was {m}");
    }

    #[test]
    fn test_erlang_mean() {
        let dist = Erlang::new(3, 9.0, 11);
        let m = mean(&dist, 20_000);
        assert!((m - 9.0).abs() < 0.9, "mean was {m}");
    }

    #[test]
    fn test_gamma_mean() {
        let dist = Gamma::new(2.0, 3.0, 13);
        let m = mean(&dist, 20_000);
        assert!((m - 6.0).abs() < 0.6, "mean was {m}");

        let small_shape = Gamma::new(0.5, 4.0, 17);
        let m = mean(&small_shape, 20_000);
        assert!((m - 2.0).abs() < 0.3, "mean was {m}");
    }

    #[test]
    fn test_degenerate_parameters_sample_zero() {
        assert!(Exponential::new(0.0, 1).sample().abs() < f64::EPSILON);
        assert!(Gamma::new(0.0, 2.0, 1).sample().abs() < f64::EPSILON);
        assert!(Gamma::new(2.0, -1.0, 1).sample().abs() < f64::EPSILON);
        assert!(Erlang::new(4, 0.0, 1).sample().abs() < f64::EPSILON);

        // High orders concentrate around the mean instead of underflowing.
        let m = mean(&Erlang::new(400, 8.0, 5), 2_000);
        assert!((m - 8.0).abs() < 0.2, "mean was {m}");
    }

    #[test]
    fn test_samples_are_non_negative() {
        let dists: Vec<Box<dyn Distribution>> = vec![
            Box::new(Exponential::new(5.0, 1)),
            Box::new(Erlang::new(2, 5.0, 2)),
            Box::new(Gamma::new(1.5, 2.0, 3)),
            Box::new(Uniform::new(1.0, 2.0, 4)),
        ];
        for dist in &dists {
            for _ in 0..1_000 {
                assert!(dist.sample() >= 0.0);
            }
        }
    }

    #[test]
    fn test_same_seed_same_samples() {
        let a = Exponential::new(5.0, 42);
        let b = Exponential::new(5.0, 42);
        for _ in 0..100 {
            assert!((a.sample() - b.sample()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_seed_stream_is_deterministic() {
        let mut a = SeedStream::new(1);
        let mut b = SeedStream::new(1);
        let first = a.next_seed();
        assert_eq!(first, b.next_seed());
        assert_ne!(first, a.next_seed());
    }
}
