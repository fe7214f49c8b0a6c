//! Builds the manager tiers and route table described by a [`SimulationConfig`].

use std::sync::Arc;

use tracing::debug;

use crate::config::{RoleConfig, SimulationConfig};
use crate::core::{EventBus, LoadManager, Role, RouteTable, SchedulerError, WorkerSpec};
use crate::util::distribution::SeedStream;

/// Every manager of one simulated fleet.
pub struct Fleet {
    gateway: Arc<LoadManager>,
    downstream: Vec<Arc<LoadManager>>,
    routes: Arc<RouteTable>,
}

impl Fleet {
    /// The manager receiving every arrival.
    #[must_use]
    pub const fn gateway(&self) -> &Arc<LoadManager> {
        &self.gateway
    }

    /// Managers in shutdown order: gateway first, then downstream roles.
    pub fn tiers(&self) -> impl Iterator<Item = &Arc<LoadManager>> {
        std::iter::once(&self.gateway).chain(&self.downstream)
    }

    /// Manager for `role`, if that tier exists.
    #[must_use]
    pub fn manager(&self, role: Role) -> Option<&Arc<LoadManager>> {
        self.tiers().find(|m| m.role() == role)
    }

    /// Route table the gateway workers forward through.
    #[must_use]
    pub const fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Total number of workers across all tiers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.tiers().map(|m| m.workers().len()).sum()
    }
}

/// Build every tier of `cfg`, wiring all of them to `bus`.
///
/// Downstream managers are built first so the route table handed to gateway
/// workers is complete and immutable. Each worker's distribution draws its
/// seed from `seeds`.
///
/// # Errors
///
/// `InvalidConfig` when `cfg` fails validation.
pub fn build_fleet(
    cfg: &SimulationConfig,
    bus: &Arc<EventBus>,
    seeds: &mut SeedStream,
) -> Result<Fleet, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let mut downstream = Vec::new();
    let mut routes = RouteTable::new();
    for (role, tier) in cfg.roles.iter().filter(|(role, _)| **role != Role::Gateway) {
        let specs = (0..tier.workers)
            .map(|_| WorkerSpec::processor(tier.service_time.build(seeds.next_seed())))
            .collect();
        let manager = Arc::new(build_manager(*role, tier, bus, specs, cfg));
        routes = routes.with_route(Arc::clone(&manager));
        downstream.push(manager);
    }
    let routes = Arc::new(routes);

    let gateway_tier = cfg
        .roles
        .get(&Role::Gateway)
        .ok_or_else(|| SchedulerError::InvalidConfig("a gateway role must be configured".into()))?;
    let specs = (0..gateway_tier.workers)
        .map(|_| {
            WorkerSpec::gateway(
                Arc::clone(&routes),
                gateway_tier.service_time.build(seeds.next_seed()),
            )
        })
        .collect();
    let gateway = Arc::new(build_manager(Role::Gateway, gateway_tier, bus, specs, cfg));

    Ok(Fleet {
        gateway,
        downstream,
        routes,
    })
}

fn build_manager(
    role: Role,
    tier: &RoleConfig,
    bus: &Arc<EventBus>,
    specs: Vec<WorkerSpec>,
    cfg: &SimulationConfig,
) -> LoadManager {
    debug!(
        role = %role,
        workers = tier.workers,
        queue_capacity = tier.queue_capacity,
        "building tier"
    );
    LoadManager::new(role, tier.queue_capacity, Arc::clone(bus), specs).with_tick(cfg.drain_tick())
}
