use crate::{CoreResult, RecorderError, RecorderHandle, audio::SessionSignal};

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread::JoinHandle,
    time::Duration,
};

use tracing::{debug, info, warn};

/// Returns an identity for the current default input device, or `None` when
/// no input is present.
pub type InputProbe = Box<dyn Fn() -> Option<String> + Send + 'static>;

/// Watches the default input device and reports route changes to a recorder.
///
/// Desktop hosts have no route-change notification that `cpal` exposes, so the
/// monitor polls. Dropping the monitor stops the polling thread.
pub struct RouteMonitor {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RouteMonitor {
    /// Start polling `probe` every `interval`.
    #[track_caller]
    pub fn spawn(recorder: RecorderHandle, probe: InputProbe, interval: Duration) -> CoreResult<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name("route-monitor".to_string())
            .spawn(move || {
                let mut current = probe();
                info!(device = ?current, "Route monitor started");

                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let next = probe();
                    if next == current {
                        continue;
                    }

                    info!(previous = ?current, next = ?next, "Input route changed");
                    for signal in route_signals(current.as_deref(), next.as_deref()) {
                        if let Err(e) = recorder.notify(signal) {
                            warn!(error = %e, "Recorder gone, route monitor exiting");
                            return;
                        }
                    }
                    current = next;
                }

                debug!("Route monitor stopped");
            })
            .map_err(|e| {
                RecorderError::hardware(format!("Failed to spawn route monitor thread: {}", e))
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Stop polling and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop_tx.take());
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("Route monitor thread panicked");
        }
    }
}

impl Drop for RouteMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Signals for a change of default input from `previous` to `next`.
///
/// Moving between two devices is a switch, so a live session keeps recording
/// on the new default instead of pausing.
pub fn route_signals(previous: Option<&str>, next: Option<&str>) -> Vec<SessionSignal> {
    match (previous, next) {
        (Some(a), Some(b)) if a == b => Vec::new(),
        (None, None) => Vec::new(),
        (Some(_), None) => vec![SessionSignal::RouteChanged {
            input_available: false,
        }],
        (None, Some(_)) => vec![SessionSignal::RouteChanged {
            input_available: true,
        }],
        (Some(_), Some(_)) => vec![SessionSignal::InputSwitched],
    }
}
