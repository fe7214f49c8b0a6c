//! Tests for error types

use fleet_sim::core::{AppResult, Role, SchedulerError};

#[test]
fn test_double_assignment_error() {
    let err = SchedulerError::DoubleAssignment {
        worker: 2,
        role: Role::Inventory,
        held: 10,
        incoming: 11,
    };
    assert_eq!(
        format!("{err}"),
        "worker inventory/2 already holds job 10, refusing job 11"
    );
}

#[test]
fn test_worker_stopping_error() {
    let err = SchedulerError::WorkerStopping {
        worker: 1,
        role: Role::Payments,
    };
    assert_eq!(format!("{err}"), "worker payments/1 is stopping and refuses new jobs");
}

#[test]
fn test_unroutable_job_error() {
    let err = SchedulerError::UnroutableJob {
        job: 4,
        role: Role::Shipment,
    };
    assert_eq!(format!("{err}"), "no manager registered for role shipment (job 4)");
}

#[test]
fn test_missing_bookkeeping_error() {
    let err = SchedulerError::MissingQueueBookkeeping {
        job: 8,
        role: Role::Gateway,
    };
    assert_eq!(
        format!("{err}"),
        "job 8 left the gateway queue without a matching enqueue record"
    );
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("priority_levels must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: priority_levels must be greater than 0"
    );
}

#[test]
fn test_converts_into_app_result() {
    fn run() -> AppResult<()> {
        Err::<(), _>(SchedulerError::AlreadyRan)?;
        Ok(())
    }
    let err = run().unwrap_err();
    assert_eq!(err.to_string(), "simulation already ran");
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
