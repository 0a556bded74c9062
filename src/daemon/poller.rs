//! Change poller: turns state-file changes into surface notifications.
//!
//! The poller thread wakes every `interval`, asks its [`ChangeSource`]
//! whether anything changed (or a refresh was forced) and, if so, raises a
//! notification on the surface handle.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};

use crate::client::state_file::StateFileMonitor;
use crate::core::errors::{Result, StatusError};

/// Something that can tell whether the client status may have changed.
pub trait ChangeSource: Send + Sync {
    /// True when a notification should be raised. May clear internal flags.
    fn poll_changed(&self) -> bool;
}

impl ChangeSource for StateFileMonitor {
    fn poll_changed(&self) -> bool {
        Self::poll_changed(self)
    }
}

/// Running poller. Dropping it stops the thread.
pub struct PollerHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<thread::JoinHandle<u64>>,
}

impl PollerHandle {
    /// Stop the thread and return how many notifications it raised.
    pub fn stop(mut self) -> u64 {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> u64 {
        drop(self.stop_tx.take());
        self.join
            .take()
            .and_then(|join| join.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop_inner();
    }
}

/// Spawn the poller. `notify` returns false once the surface is gone, which
/// also ends the thread.
pub fn spawn_poller<N>(
    source: Arc<dyn ChangeSource>,
    interval: Duration,
    notify: N,
) -> Result<PollerHandle>
where
    N: Fn() -> bool + Send + 'static,
{
    let (stop_tx, stop_rx) = bounded::<()>(1);
    let join = thread::Builder::new()
        .name("cstat-poller".to_string())
        .spawn(move || {
            let mut raised = 0u64;
            loop {
                if source.poll_changed() {
                    if !notify() {
                        break;
                    }
                    raised += 1;
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            raised
        })
        .map_err(|e| StatusError::Runtime {
            details: format!("failed to spawn poller thread: {e}"),
        })?;

    Ok(PollerHandle {
        stop_tx: Some(stop_tx),
        join: Some(join),
    })
}
