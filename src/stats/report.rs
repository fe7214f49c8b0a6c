//! Final report of a simulation run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::job::Role;

/// Statistics of one role's tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleReport {
    /// The role.
    pub role: Role,
    /// Jobs processed by this tier's workers.
    pub processed: u64,
    /// Jobs handed straight to an idle worker.
    pub scheduled_direct: u64,
    /// Jobs that entered the queue.
    pub queued: u64,
    /// Jobs displaced from the queue by more urgent ones.
    pub evicted: u64,
    /// Jobs turned away.
    pub rejected: u64,
    /// Jobs this tier's workers forwarded elsewhere.
    pub forwarded: u64,
    /// Jobs this tier's workers could not route.
    pub unroutable: u64,
    /// Mean service time in milliseconds.
    pub average_processing_ms: f64,
    /// Mean time from queueing to being picked up, in milliseconds.
    pub average_queue_wait_ms: f64,
    /// Time-weighted mean queue length.
    pub average_queue_len: f64,
}

/// Whole-system statistics plus one entry per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Jobs generated.
    pub arrived: u64,
    /// Jobs processed by any tier.
    pub processed: u64,
    /// Rejections across all tiers.
    pub rejected: u64,
    /// Evictions across all tiers.
    pub evicted: u64,
    /// Jobs no tier could take.
    pub unroutable: u64,
    /// Share of jobs lost to rejection, eviction or routing.
    pub drop_probability: f64,
    /// Time-weighted mean number of jobs between arrival and departure.
    pub average_jobs_in_system: f64,
    /// Share of time with no job in the system.
    pub idle_probability: f64,
    /// Per-role statistics, in role order.
    pub roles: Vec<RoleReport>,
}

impl SimulationReport {
    /// Statistics for `role`, if it was observed.
    #[must_use]
    pub fn role(&self, role: Role) -> Option<&RoleReport> {
        self.roles.iter().find(|r| r.role == role)
    }

    /// Jobs neither processed nor lost. Zero after a complete drain.
    #[must_use]
    pub fn unaccounted(&self) -> i128 {
        let gone = self.processed + self.rejected + self.evicted + self.unroutable;
        i128::from(self.arrived) - i128::from(gone)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------------- system --------------------")?;
        row(f, "Jobs arrived", self.arrived, "jobs")?;
        row(f, "Jobs processed", self.processed, "jobs")?;
        row(f, "Jobs rejected", self.rejected, "jobs")?;
        row(f, "Jobs evicted", self.evicted, "jobs")?;
        row(f, "Jobs unroutable", self.unroutable, "jobs")?;
        row(f, "Average jobs in the system", format!("{:.3}", self.average_jobs_in_system), "jobs")?;
        row(f, "Chance of system being idle", format!("{:.2}", self.idle_probability * 100.0), "%")?;
        row(f, "Chance of drop", format!("{:.2}", self.drop_probability * 100.0), "%")?;
        for role in &self.roles {
            writeln!(f, "-------------------- {} --------------------", role.role)?;
            row(f, "Jobs processed", role.processed, "jobs")?;
            row(f, "Jobs assigned directly", role.scheduled_direct, "jobs")?;
            row(f, "Jobs queued", role.queued, "jobs")?;
            row(f, "Jobs evicted", role.evicted, "jobs")?;
            row(f, "Jobs rejected", role.rejected, "jobs")?;
            row(f, "Jobs forwarded", role.forwarded, "jobs")?;
            row(f, "Average job processing time", format!("{:.3}", role.average_processing_ms), "ms")?;
            row(f, "Average time in queue", format!("{:.3}", role.average_queue_wait_ms), "ms")?;
            row(f, "Average queue size", format!("{:.3}", role.average_queue_len), "jobs in queue")?;
        }
        Ok(())
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: impl fmt::Display, unit: &str) -> fmt::Result {
    writeln!(f, "{label:<34} {value:>12}  {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SimulationReport {
        SimulationReport {
            arrived: 10,
            processed: 7,
            rejected: 2,
            evicted: 1,
            unroutable: 0,
            drop_probability: 0.3,
            average_jobs_in_system: 1.5,
            idle_probability: 0.25,
            roles: vec![RoleReport {
                role: Role::Gateway,
                processed: 7,
                scheduled_direct: 5,
                queued: 4,
                evicted: 1,
                rejected: 2,
                forwarded: 0,
                unroutable: 0,
                average_processing_ms: 3.0,
                average_queue_wait_ms: 1.25,
                average_queue_len: 0.5,
            }],
        }
    }

    #[test]
    fn test_display_lists_every_role() {
        let text = report().to_string();
        assert!(text.contains("system"));
        assert!(text.contains("gateway"));
        assert!(text.contains("Chance of drop"));
        assert!(text.contains("30.00"));
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["arrived"], 10);
        assert_eq!(json["roles"][0]["role"], "gateway");
    }

    #[test]
    fn test_accounting() {
        assert_eq!(report().unaccounted(), 0);
        assert!(report().role(Role::Payments).is_none());
    }
}
