//! Tests for utility functions

use std::time::Duration;

use fleet_sim::util::{millis, Constant, Distribution, Erlang, SeedStream, Stopwatch, Uniform};

#[test]
fn test_millis_conversion() {
    assert_eq!(millis(1.5), Duration::from_micros(1_500));
    assert_eq!(millis(0.0), Duration::ZERO);
    assert_eq!(millis(-3.0), Duration::ZERO);
    assert_eq!(millis(f64::NAN), Duration::ZERO);
    assert_eq!(millis(f64::INFINITY), Duration::ZERO);
    assert_eq!(millis(f64::MAX), Duration::MAX);
}

#[test]
fn test_stopwatch() {
    let watch = Stopwatch::start();
    std::thread::sleep(Duration::from_millis(5));
    assert!(watch.elapsed() >= Duration::from_millis(5));
    assert!(watch.is_elapsed(Duration::from_millis(1)));
    assert!(!watch.is_elapsed(Duration::from_secs(60)));
}

#[test]
fn test_uniform_stays_in_bounds() {
    let dist = Uniform::new(2.0, 4.0, 3);
    for _ in 0..1_000 {
        let sample = dist.sample();
        assert!((2.0..4.0).contains(&sample), "sample {sample} out of range");
    }
}

#[test]
fn test_erlang_shape_zero_is_clamped() {
    let dist = Erlang::new(0, 5.0, 1);
    assert!(dist.sample() >= 0.0);
}

#[test]
fn test_distributions_are_object_safe() {
    let dists: Vec<Box<dyn Distribution>> = vec![Box::new(Constant::new(3.0)), Box::new(Uniform::new(1.0, 1.0, 0))];
    let total: f64 = dists.iter().map(|d| d.sample()).sum();
    assert!((total - 4.0).abs() < 1e-9);
}

#[test]
fn test_seed_streams_diverge_by_base() {
    let mut a = SeedStream::new(1);
    let mut b = SeedStream::new(2);
    assert_ne!(a.next_seed(), b.next_seed());
}
