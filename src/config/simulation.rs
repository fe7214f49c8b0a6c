//! Simulation configuration structures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::job::Role;
use crate::util::distribution::{Constant, Distribution, Erlang, Exponential, Gamma, Uniform};

/// Random-variate generator selection. All values are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionConfig {
    /// Exponential with mean `scale`.
    Exponential {
        /// Mean value.
        scale: f64,
    },
    /// Erlang of order `shape` with total mean `scale`.
    Erlang {
        /// Number of exponential phases.
        shape: u32,
        /// Mean value.
        scale: f64,
    },
    /// Gamma with shape `shape` and scale `scale`.
    Gamma {
        /// Shape parameter.
        shape: f64,
        /// Scale parameter.
        scale: f64,
    },
    /// Uniform on `[low, high)`.
    Uniform {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Always `value`.
    Constant {
        /// The value.
        value: f64,
    },
}

impl DistributionConfig {
    /// Validate distribution parameters.
    pub fn validate(&self) -> Result<(), String> {
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be a finite non-negative number, got {value}"))
            }
        };
        match *self {
            Self::Exponential { scale } => non_negative("scale", scale),
            Self::Erlang { shape, scale } => {
                if shape == 0 {
                    return Err("erlang shape must be greater than 0".into());
                }
                non_negative("scale", scale)
            }
            Self::Gamma { shape, scale } => {
                if !(shape.is_finite() && shape > 0.0) {
                    return Err(format!("gamma shape must be positive, got {shape}"));
                }
                non_negative("scale", scale)
            }
            Self::Uniform { low, high } => {
                non_negative("low", low)?;
                non_negative("high", high)?;
                if high < low {
                    return Err(format!("uniform high ({high}) is below low ({low})"));
                }
                Ok(())
            }
            Self::Constant { value } => non_negative("value", value),
        }
    }

    /// Mean of the configured distribution, in milliseconds.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Exponential { scale } | Self::Erlang { scale, .. } => scale,
            Self::Gamma { shape, scale } => shape * scale,
            Self::Uniform { low, high } => (low + high) / 2.0,
            Self::Constant { value } => value,
        }
    }

    /// Build the generator, seeding random ones with `seed`.
    #[must_use]
    pub fn build(&self, seed: u64) -> Box<dyn Distribution> {
        match *self {
            Self::Exponential { scale } => Box::new(Exponential::new(scale, seed)),
            Self::Erlang { shape, scale } => Box::new(Erlang::new(shape, scale, seed)),
            Self::Gamma { shape, scale } => Box::new(Gamma::new(shape, scale, seed)),
            Self::Uniform { low, high } => Box::new(Uniform::new(low, high, seed)),
            Self::Constant { value } => Box::new(Constant::new(value)),
        }
    }
}

/// One role's tier: worker pool size, queue capacity and service time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Number of workers.
    pub workers: usize,
    /// Maximum queued jobs before admission control kicks in.
    pub queue_capacity: usize,
    /// Service time per job; for the gateway also the dispatch latency.
    pub service_time: DistributionConfig,
}

impl RoleConfig {
    /// Validate role configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.service_time
            .validate()
            .map_err(|e| format!("service_time invalid: {e}"))
    }
}

/// Root simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// How long the arrival loop runs, in milliseconds.
    pub simulation_duration_ms: u64,
    /// Inter-arrival time between consecutive jobs.
    pub arrival: DistributionConfig,
    /// Priorities are drawn uniformly from `0..priority_levels`.
    #[serde(default = "default_priority_levels")]
    pub priority_levels: u32,
    /// Relative frequency of each job role. Empty means gateway jobs only.
    #[serde(default)]
    pub role_weights: BTreeMap<Role, f64>,
    /// Tier per role. The gateway tier is mandatory.
    pub roles: BTreeMap<Role, RoleConfig>,
    /// Base seed for every random generator in the run.
    #[serde(default)]
    pub seed: u64,
    /// Fallback wake-up period of the drain loops, in milliseconds.
    #[serde(default = "default_drain_tick_ms")]
    pub drain_tick_ms: u64,
    /// Whether rejected jobs stay in the arrival count used for the drop rate.
    #[serde(default = "default_count_rejected_as_arrived")]
    pub count_rejected_as_arrived: bool,
}

const fn default_priority_levels() -> u32 {
    10
}

const fn default_drain_tick_ms() -> u64 {
    1
}

const fn default_count_rejected_as_arrived() -> bool {
    true
}

impl SimulationConfig {
    /// Validate all tiers and the cross-field constraints between them.
    pub fn validate(&self) -> Result<(), String> {
        if self.simulation_duration_ms == 0 {
            return Err("simulation_duration_ms must be greater than 0".into());
        }
        if self.priority_levels == 0 {
            return Err("priority_levels must be greater than 0".into());
        }
        if self.drain_tick_ms == 0 {
            return Err("drain_tick_ms must be greater than 0".into());
        }
        self.arrival
            .validate()
            .map_err(|e| format!("arrival invalid: {e}"))?;
        if self.arrival.mean() <= 0.0 {
            return Err("arrival mean must be greater than 0".into());
        }
        if !self.roles.contains_key(&Role::Gateway) {
            return Err("a gateway role must be configured".into());
        }
        for (role, tier) in &self.roles {
            tier.validate()
                .map_err(|e| format!("role `{role}` invalid: {e}"))?;
        }
        for (role, weight) in &self.role_weights {
            if !(weight.is_finite() && *weight >= 0.0) {
                return Err(format!("role weight for `{role}` must be non-negative, got {weight}"));
            }
            if *weight > 0.0 && !self.roles.contains_key(role) {
                return Err(format!("role `{role}` has a weight but no tier configured"));
            }
        }
        Ok(())
    }

    /// Parse simulation configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&input)
    }

    /// Arrival-loop duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.simulation_duration_ms)
    }

    /// Drain-loop tick.
    #[must_use]
    pub const fn drain_tick(&self) -> Duration {
        Duration::from_millis(self.drain_tick_ms)
    }

    /// Role weights as `(role, weight)` pairs, in role order.
    pub fn weights(&self) -> impl Iterator<Item = (Role, f64)> + '_ {
        self.role_weights.iter().map(|(role, weight)| (*role, *weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(workers: usize) -> RoleConfig {
        RoleConfig {
            workers,
            queue_capacity: 4,
            service_time: DistributionConfig::Constant { value: 1.0 },
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            simulation_duration_ms: 100,
            arrival: DistributionConfig::Exponential { scale: 5.0 },
            priority_levels: 10,
            role_weights: BTreeMap::new(),
            roles: BTreeMap::from([(Role::Gateway, tier(2))]),
            seed: 0,
            drain_tick_ms: 1,
            count_rejected_as_arrived: true,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_gateway_is_required() {
        let mut cfg = config();
        cfg.roles = BTreeMap::from([(Role::Inventory, tier(1))]);
        assert!(cfg.validate().unwrap_err().contains("gateway"));
    }

    #[test]
    fn test_weighted_role_needs_tier() {
        let mut cfg = config();
        cfg.role_weights.insert(Role::Payments, 1.0);
        assert!(cfg.validate().unwrap_err().contains("payments"));

        cfg.role_weights.insert(Role::Payments, 0.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_distribution_validation() {
        assert!(DistributionConfig::Erlang { shape: 0, scale: 1.0 }.validate().is_err());
        assert!(DistributionConfig::Gamma { shape: 0.0, scale: 1.0 }.validate().is_err());
        assert!(DistributionConfig::Uniform { low: 3.0, high: 1.0 }.validate().is_err());
        assert!(DistributionConfig::Exponential { scale: -1.0 }.validate().is_err());
        assert!(DistributionConfig::Constant { value: 0.0 }.validate().is_ok());
    }

    #[test]
    fn test_json_defaults() {
        let cfg = SimulationConfig::from_json_str(
            r#"{
                "simulation_duration_ms": 50,
                "arrival": { "kind": "erlang", "shape": 2, "scale": 4.0 },
                "roles": {
                    "gateway": {
                        "workers": 1,
                        "queue_capacity": 3,
                        "service_time": { "kind": "exponential", "scale": 2.0 }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.priority_levels, 10);
        assert_eq!(cfg.drain_tick(), Duration::from_millis(1));
        assert!(cfg.count_rejected_as_arrived);
        assert!(cfg.role_weights.is_empty());
        assert_eq!(cfg.arrival, DistributionConfig::Erlang { shape: 2, scale: 4.0 });
    }
}
