//! Named loop threads that report how they ended.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, error};

use crate::core::SchedulerError;

/// Exit report sent by every loop thread, success or not.
#[derive(Debug)]
pub struct ThreadExit {
    /// Name the thread was spawned with.
    pub name: String,
    /// How the loop ended. Panics are reported as `SchedulerError::Thread`.
    pub result: Result<(), SchedulerError>,
}

/// Spawn `body` on a named OS thread. When it returns (or panics) an exit
/// report is sent on `exits`.
///
/// # Errors
///
/// `SchedulerError::Thread` when the OS refuses to spawn the thread.
pub fn spawn_loop<F>(
    name: String,
    exits: Sender<ThreadExit>,
    body: F,
) -> Result<JoinHandle<()>, SchedulerError>
where
    F: FnOnce() -> Result<(), SchedulerError> + Send + 'static,
{
    let thread_name = name.clone();
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            debug!(thread = %name, "loop thread started");
            let result = panic::catch_unwind(AssertUnwindSafe(body))
                .unwrap_or_else(|payload| Err(SchedulerError::Thread(panic_message(&name, &*payload))));
            if let Err(err) = &result {
                error!(thread = %name, error = %err, "loop thread failed");
            }
            // The driver may already be gone after an abort.
            let _ = exits.send(ThreadExit { name, result });
        })
        .map_err(|e| SchedulerError::Thread(format!("failed to spawn thread: {e}")))
}

fn panic_message(name: &str, payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("{name} panicked: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_reports_success() {
        let (tx, rx) = unbounded();
        let handle = spawn_loop("ok-loop".into(), tx, || Ok(())).unwrap();
        handle.join().unwrap();
        let exit = rx.recv().unwrap();
        assert_eq!(exit.name, "ok-loop");
        assert!(exit.result.is_ok());
    }

    #[test]
    fn test_reports_error() {
        let (tx, rx) = unbounded();
        spawn_loop("bad-loop".into(), tx, || Err(SchedulerError::AlreadyRan))
            .unwrap()
            .join()
            .unwrap();
        assert!(matches!(rx.recv().unwrap().result, Err(SchedulerError::AlreadyRan)));
    }

    #[test]
    fn test_panic_becomes_thread_error() {
        let (tx, rx) = unbounded();
        spawn_loop("panicky".into(), tx, || panic!("boom"))
            .unwrap()
            .join()
            .unwrap();
        match rx.recv().unwrap().result {
            Err(SchedulerError::Thread(message)) => {
                assert!(message.contains("panicky"));
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
