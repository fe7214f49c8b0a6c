//! Jobs, roles, and the sources that number and generate them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Globally unique, monotonic job identifier.
pub type JobId = u64;
/// Job priority; lower values are more urgent.
pub type Priority = u32;
/// Worker identifier, unique within one role.
pub type WorkerId = u32;

/// Category of work a worker or manager handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Entry tier: receives every arrival and routes it onwards.
    Gateway,
    /// Inventory servers.
    Inventory,
    /// Shipment servers.
    Shipment,
    /// Payment servers.
    Payments,
}

impl Role {
    /// Every role, gateway first.
    pub const ALL: [Self; 4] = [Self::Gateway, Self::Inventory, Self::Shipment, Self::Payments];

    /// Lowercase name used in logs and thread names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Inventory => "inventory",
            Self::Shipment => "shipment",
            Self::Payments => "payments",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    priority: Priority,
    role: Role,
}

impl Job {
    /// Create a job.
    #[must_use]
    pub const fn new(id: JobId, priority: Priority, role: Role) -> Self {
        Self { id, priority, role }
    }

    /// Job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Job priority (lower is more urgent).
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Role that must eventually process the job.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Job(id: {}, priority: {}, role: {})",
            self.id, self.priority, self.role
        )
    }
}

/// Thread-safe source of monotonic job ids.
pub trait IdSource: Send + Sync {
    /// Return the next id. Never returns the same value twice.
    fn next_id(&self) -> JobId;
}

/// Lock-free id counter starting at 1.
#[derive(Debug)]
pub struct AtomicIdSource {
    next: AtomicU64,
}

impl AtomicIdSource {
    /// Counter whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for AtomicIdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for AtomicIdSource {
    fn next_id(&self) -> JobId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Generates arriving jobs: fresh id, uniform priority and weighted role.
pub struct JobFactory {
    ids: Arc<dyn IdSource>,
    priority_levels: Priority,
    /// Roles with cumulative weights, ascending.
    roles: Vec<(Role, f64)>,
    rng: Mutex<StdRng>,
}

impl JobFactory {
    /// Build a factory.
    ///
    /// Priorities are drawn uniformly from `0..priority_levels`. Roles are
    /// drawn proportionally to their weights; non-positive weights are
    /// ignored and an empty table produces gateway jobs only.
    #[must_use]
    pub fn new(
        ids: Arc<dyn IdSource>,
        priority_levels: Priority,
        role_weights: impl IntoIterator<Item = (Role, f64)>,
        seed: u64,
    ) -> Self {
        let mut total = 0.0;
        let roles = role_weights
            .into_iter()
            .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
            .map(|(role, weight)| {
                total += weight;
                (role, total)
            })
            .collect();
        Self {
            ids,
            priority_levels: priority_levels.max(1),
            roles,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate the next job.
    pub fn next_job(&self) -> Job {
        let id = self.ids.next_id();
        let mut rng = self.rng.lock();
        let priority = rng.random_range(0..self.priority_levels);
        let role = match self.roles.last() {
            Some(&(_, total)) => {
                let pick = rng.random::<f64>() * total;
                self.roles
                    .iter()
                    .find(|(_, cumulative)| pick < *cumulative)
                    .map_or(self.roles[self.roles.len() - 1].0, |(role, _)| *role)
            }
            None => Role::Gateway,
        };
        Job::new(id, priority, role)
    }
}
