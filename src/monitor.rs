//! Connection health monitoring.
//!
//! Converts the driver's raw connect/disconnect notifications into a staged
//! tri-state health status. Two independent thresholds run whenever the
//! device is disconnected: when the warning threshold elapses the status
//! becomes [`HealthStatus::Warning`]; when the error threshold elapses it
//! becomes [`HealthStatus::Error`]. A reconnect at any point snaps the
//! status back to [`HealthStatus::Ok`] and disarms both timers.
//!
//! The monitor owns a single task: it holds the only `watch::Sender`, so
//! status writes are serialized by construction even though both timers and
//! the connectivity handler logically race.
//!
//! The relative ordering of the two thresholds is not validated. An error
//! threshold shorter than the warning threshold is permitted, degenerate
//! configuration: the error state is reached first and then overwritten when
//! the warning timer fires.

use crate::driver::{DisplayDriver, StateCategory, StateEvent};
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Default warning threshold used by device factories.
pub const DEFAULT_WARNING_AFTER: Duration = Duration::from_millis(12_000);
/// Default error threshold used by device factories.
pub const DEFAULT_ERROR_AFTER: Duration = Duration::from_millis(30_000);

/// Staged connectivity classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    /// The driver reports a live connection.
    Ok,
    /// Disconnected longer than the warning threshold.
    Warning,
    /// Disconnected longer than the error threshold.
    Error,
}

impl HealthStatus {
    /// Numeric code projected to the status slot. Zero stays reserved for
    /// "unknown" in the bus schema; the monitor never publishes it.
    pub fn code(self) -> u16 {
        match self {
            HealthStatus::Ok => 1,
            HealthStatus::Warning => 2,
            HealthStatus::Error => 3,
        }
    }
}

/// Timer-driven state machine over the driver's connectivity signal.
pub struct CommunicationMonitor {
    driver: Arc<dyn DisplayDriver>,
    warning_after: Duration,
    error_after: Duration,
    status_tx: watch::Sender<HealthStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CommunicationMonitor {
    /// Creates a stopped monitor.
    ///
    /// The status channel starts at `Ok`; [`start`](Self::start) re-evaluates
    /// from real connectivity immediately, so observers never act on the
    /// placeholder.
    pub fn new(driver: Arc<dyn DisplayDriver>, warning_after: Duration, error_after: Duration) -> Self {
        let (status_tx, _) = watch::channel(HealthStatus::Ok);
        Self {
            driver,
            warning_after,
            error_after,
            status_tx,
            task: Mutex::new(None),
        }
    }

    /// Current status.
    pub fn status(&self) -> HealthStatus {
        *self.status_tx.borrow()
    }

    /// Watches status transitions.
    pub fn subscribe(&self) -> watch::Receiver<HealthStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribes to the driver's connectivity events and starts the timer
    /// task. Calling `start` on a running monitor is a no-op, so repeated
    /// activation cannot stack subscriptions.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        // Subscribe before spawning so the first evaluation cannot miss an
        // event raised between start() and the task's first poll.
        let events = self.driver.subscribe();
        let driver = Arc::clone(&self.driver);
        let status_tx = self.status_tx.clone();
        let warning_after = self.warning_after;
        let error_after = self.error_after;

        *task = Some(tokio::spawn(run(
            driver,
            events,
            status_tx,
            warning_after,
            error_after,
        )));
    }

    /// Unsubscribes by aborting the timer task. Best-effort: an in-flight
    /// evaluation already dispatched is allowed to complete; pending timers
    /// die with the task.
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    /// Whether the timer task is currently installed.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for CommunicationMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    driver: Arc<dyn DisplayDriver>,
    mut events: broadcast::Receiver<StateEvent>,
    status_tx: watch::Sender<HealthStatus>,
    warning_after: Duration,
    error_after: Duration,
) {
    let mut warn_at = Instant::now();
    let mut err_at = Instant::now();
    let mut warn_armed = false;
    let mut err_armed = false;

    let evaluate = |warn_at: &mut Instant,
                        err_at: &mut Instant,
                        warn_armed: &mut bool,
                        err_armed: &mut bool| {
        if driver.connected() {
            // Repeated connect notifications while already Ok are no-ops;
            // send_if_modified keeps the channel quiet.
            status_tx.send_if_modified(|status| {
                if *status != HealthStatus::Ok {
                    *status = HealthStatus::Ok;
                    true
                } else {
                    false
                }
            });
            *warn_armed = false;
            *err_armed = false;
        } else {
            // Disconnected: both timers restart from zero, even if they
            // were already running.
            let now = Instant::now();
            *warn_at = now + warning_after;
            *err_at = now + error_after;
            *warn_armed = true;
            *err_armed = true;
        }
    };

    // Immediate evaluation on start.
    evaluate(&mut warn_at, &mut err_at, &mut warn_armed, &mut err_armed);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(StateEvent { category: StateCategory::Connection }) => {
                    evaluate(&mut warn_at, &mut err_at, &mut warn_armed, &mut err_armed);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Missed notifications may include connectivity flips;
                    // re-evaluate from the current flag.
                    warn!("health monitor lagged {} events, re-evaluating", missed);
                    evaluate(&mut warn_at, &mut err_at, &mut warn_armed, &mut err_armed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("driver event stream closed, health monitor exiting");
                    break;
                }
            },
            _ = sleep_until(warn_at), if warn_armed => {
                warn_armed = false;
                status_tx.send_replace(HealthStatus::Warning);
            }
            _ = sleep_until(err_at), if err_armed => {
                err_armed = false;
                status_tx.send_replace(HealthStatus::Error);
            }
        }
    }
}
