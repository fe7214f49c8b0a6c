//! Component tests for configuration, errors, builders, utilities and statistics.

mod unit;
