//! Tests for configuration validation

use std::collections::BTreeMap;

use fleet_sim::config::{DistributionConfig, RoleConfig, SimulationConfig};
use fleet_sim::core::Role;

fn gateway_only() -> SimulationConfig {
    SimulationConfig {
        simulation_duration_ms: 1_000,
        arrival: DistributionConfig::Exponential { scale: 2.0 },
        priority_levels: 10,
        role_weights: BTreeMap::new(),
        roles: BTreeMap::from([(
            Role::Gateway,
            RoleConfig {
                workers: 3,
                queue_capacity: 10,
                service_time: DistributionConfig::Exponential { scale: 1.0 },
            },
        )]),
        seed: 1,
        drain_tick_ms: 1,
        count_rejected_as_arrived: true,
    }
}

#[test]
fn test_simulation_config_validation() {
    assert!(gateway_only().validate().is_ok());
}

#[test]
fn test_zero_duration_is_invalid() {
    let mut cfg = gateway_only();
    cfg.simulation_duration_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_priority_levels_is_invalid() {
    let mut cfg = gateway_only();
    cfg.priority_levels = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_mean_arrival_is_invalid() {
    let mut cfg = gateway_only();
    cfg.arrival = DistributionConfig::Constant { value: 0.0 };
    assert!(cfg.validate().unwrap_err().contains("arrival"));
}

#[test]
fn test_invalid_service_time_names_role() {
    let mut cfg = gateway_only();
    cfg.roles.insert(
        Role::Shipment,
        RoleConfig {
            workers: 1,
            queue_capacity: 1,
            service_time: DistributionConfig::Gamma { shape: -1.0, scale: 1.0 },
        },
    );
    assert!(cfg.validate().unwrap_err().contains("shipment"));
}

#[test]
fn test_zero_workers_and_capacity_are_allowed() {
    let mut cfg = gateway_only();
    cfg.roles.insert(
        Role::Payments,
        RoleConfig {
            workers: 0,
            queue_capacity: 0,
            service_time: DistributionConfig::Constant { value: 1.0 },
        },
    );
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_from_json_str_rejects_garbage() {
    let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_from_json_str_rejects_unknown_distribution() {
    let err = SimulationConfig::from_json_str(
        r#"{
            "simulation_duration_ms": 10,
            "arrival": { "kind": "pareto", "scale": 1.0 },
            "roles": {}
        }"#,
    )
    .unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_json_round_trip_preserves_tiers() {
    let cfg = gateway_only();
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains(r#""kind":"exponential""#));
    assert_eq!(SimulationConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_sample_config_file_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fleet.json");
    let cfg = SimulationConfig::from_path(path).unwrap();
    assert_eq!(cfg.roles.len(), 4);
    assert!(cfg.role_weights.contains_key(&Role::Inventory));
}

#[test]
fn test_missing_file_is_reported() {
    let err = SimulationConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.contains("cannot read"));
}
