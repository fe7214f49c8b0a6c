//! Tests for builder modules

use std::collections::BTreeMap;
use std::sync::Arc;

use fleet_sim::builders::build_fleet;
use fleet_sim::config::{DistributionConfig, RoleConfig, SimulationConfig};
use fleet_sim::core::{EventBus, Role, SchedulerError};
use fleet_sim::util::SeedStream;

fn tier(workers: usize, queue_capacity: usize) -> RoleConfig {
    RoleConfig {
        workers,
        queue_capacity,
        service_time: DistributionConfig::Constant { value: 1.0 },
    }
}

fn config() -> SimulationConfig {
    SimulationConfig {
        simulation_duration_ms: 10,
        arrival: DistributionConfig::Constant { value: 1.0 },
        priority_levels: 10,
        role_weights: BTreeMap::new(),
        roles: BTreeMap::from([
            (Role::Gateway, tier(2, 5)),
            (Role::Payments, tier(1, 3)),
            (Role::Inventory, tier(3, 7)),
        ]),
        seed: 0,
        drain_tick_ms: 2,
        count_rejected_as_arrived: true,
    }
}

#[test]
fn test_fleet_tiers_follow_config() {
    let fleet = build_fleet(&config(), &Arc::new(EventBus::new()), &mut SeedStream::new(0)).unwrap();

    let roles: Vec<Role> = fleet.tiers().map(|m| m.role()).collect();
    assert_eq!(roles, vec![Role::Gateway, Role::Inventory, Role::Payments]);
    assert_eq!(fleet.worker_count(), 6);

    let inventory = fleet.manager(Role::Inventory).unwrap();
    assert_eq!(inventory.queue_capacity(), 7);
    let ids: Vec<u32> = inventory.workers().iter().map(|w| w.id()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(fleet.manager(Role::Shipment).is_none());
}

#[test]
fn test_only_gateway_workers_route() {
    let fleet = build_fleet(&config(), &Arc::new(EventBus::new()), &mut SeedStream::new(0)).unwrap();

    assert!(fleet.gateway().workers().iter().all(|w| w.is_gateway()));
    assert!(fleet
        .tiers()
        .skip(1)
        .flat_map(|m| m.workers())
        .all(|w| !w.is_gateway()));

    let routed: Vec<Role> = fleet.routes().roles().collect();
    assert_eq!(routed, vec![Role::Inventory, Role::Payments]);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut cfg = config();
    cfg.drain_tick_ms = 0;
    let result = build_fleet(&cfg, &Arc::new(EventBus::new()), &mut SeedStream::new(0));
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
