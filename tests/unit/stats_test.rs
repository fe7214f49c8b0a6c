//! Tests for the statistics collector and report

use fleet_sim::core::{EventBus, Job, Listener, Role, SimEvent};
use fleet_sim::stats::SimulationStatistics;
use parking_lot::Mutex;
use std::sync::Arc;

fn job(id: u64, role: Role) -> Job {
    Job::new(id, 1, role)
}

#[test]
fn test_forwarded_job_counts_once() {
    let mut stats = SimulationStatistics::new(true);
    let j = job(1, Role::Shipment);
    for event in [
        SimEvent::JobArrived { job: j },
        SimEvent::JobScheduled { role: Role::Gateway, job: j, direct: true },
        SimEvent::JobForwarded { from: Role::Gateway, to: Role::Shipment, job: j, worker: 1 },
        SimEvent::JobScheduled { role: Role::Shipment, job: j, direct: true },
        SimEvent::JobProcessingStarted { role: Role::Shipment, job: j, worker: 2 },
        SimEvent::JobProcessed { role: Role::Shipment, job: j, worker: 2 },
        SimEvent::AllJobsDrained,
    ] {
        stats.on_event(&event);
    }

    let report = stats.report().unwrap();
    assert_eq!(report.arrived, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.unaccounted(), 0);
    assert_eq!(report.role(Role::Gateway).unwrap().forwarded, 1);
    assert_eq!(report.role(Role::Gateway).unwrap().processed, 0);
    assert_eq!(report.role(Role::Shipment).unwrap().scheduled_direct, 1);
}

#[test]
fn test_backlog_rejected_at_shutdown_is_not_a_bookkeeping_error() {
    let mut stats = SimulationStatistics::new(true);
    let j = job(5, Role::Payments);
    stats.on_event(&SimEvent::JobArrived { job: j });
    stats.on_event(&SimEvent::JobQueued { role: Role::Payments, job: j, queue_len: 1 });
    stats.on_event(&SimEvent::JobRejected { role: Role::Payments, job: j, queue_len: 0 });

    let report = stats.report().unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(report.unaccounted(), 0);
    assert!(!stats.is_poisoned());
}

#[test]
fn test_evicted_job_cannot_be_popped_later() {
    let mut stats = SimulationStatistics::new(true);
    let j = job(3, Role::Inventory);
    stats.on_event(&SimEvent::JobQueued { role: Role::Inventory, job: j, queue_len: 1 });
    stats.on_event(&SimEvent::JobEvicted { role: Role::Inventory, job: j, queue_len: 1 });
    stats.on_event(&SimEvent::JobPopped { role: Role::Inventory, job: j, worker: 1, queue_len: 0 });
    assert!(stats.report().is_err());
}

#[test]
fn test_unroutable_counts_as_drop() {
    let mut stats = SimulationStatistics::new(true);
    let j = job(2, Role::Payments);
    stats.on_event(&SimEvent::JobArrived { job: j });
    stats.on_event(&SimEvent::JobUnroutable { role: Role::Gateway, job: j, worker: 1 });

    let report = stats.report().unwrap();
    assert_eq!(report.unroutable, 1);
    assert!((report.drop_probability - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_shared_collector_on_bus() {
    let stats = Arc::new(Mutex::new(SimulationStatistics::new(false)));
    let bus = EventBus::new();
    bus.subscribe(Box::new(Arc::clone(&stats)));

    bus.publish(&SimEvent::JobArrived { job: job(1, Role::Gateway) });
    bus.publish(&SimEvent::JobRejected { role: Role::Gateway, job: job(1, Role::Gateway), queue_len: 0 });

    let report = stats.lock().report().unwrap();
    assert_eq!(report.arrived, 1);
    assert_eq!(report.rejected, 1);
    // Rejected arrivals are excluded from both sides of the ratio.
    assert!(report.drop_probability.abs() < f64::EPSILON);
}

#[test]
fn test_empty_run_reports_zeros() {
    let report = SimulationStatistics::new(true).report().unwrap();
    assert_eq!(report.arrived, 0);
    assert!(report.drop_probability.abs() < f64::EPSILON);
    assert!((report.idle_probability - 1.0).abs() < f64::EPSILON);
    assert!(report.roles.is_empty());
}
