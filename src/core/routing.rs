//! Immutable role-to-manager lookup used by gateway workers.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::job::{Job, Role};
use crate::core::manager::LoadManager;
use crate::core::SchedulerError;

/// Table mapping each downstream role to the manager responsible for it.
///
/// Built once during setup, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct RouteTable {
    routes: BTreeMap<Role, Arc<LoadManager>>,
}

impl RouteTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `manager` for its role, replacing any previous entry.
    #[must_use]
    pub fn with_route(mut self, manager: Arc<LoadManager>) -> Self {
        self.routes.insert(manager.role(), manager);
        self
    }

    /// Manager registered for `role`, if any.
    #[must_use]
    pub fn get(&self, role: Role) -> Option<&Arc<LoadManager>> {
        self.routes.get(&role)
    }

    /// Manager responsible for `job`'s role.
    ///
    /// # Errors
    ///
    /// `UnroutableJob` when no manager is registered for that role.
    pub fn route(&self, job: &Job) -> Result<&Arc<LoadManager>, SchedulerError> {
        self.get(job.role()).ok_or(SchedulerError::UnroutableJob {
            job: job.id(),
            role: job.role(),
        })
    }

    /// Registered roles in ascending order.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.routes.keys().copied()
    }

    /// Number of registered roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no role is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
