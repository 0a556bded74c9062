//! Signal handling for `cstat watch`: SIGTERM/SIGINT request shutdown and
//! SIGUSR1 forces a status refresh.
//!
//! Uses `signal-hook` flag registration; the watch loop polls the flags.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Signal state shared between the OS hooks and the watch loop.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    refresh_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register the OS hooks. Registration failures are
    /// reported on stderr and otherwise ignored.
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    /// Handler without OS hooks; flags change only programmatically.
    pub fn unregistered() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            refresh_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Check and clear a pending refresh request.
    pub fn should_refresh(&self) -> bool {
        self.refresh_flag.swap(false, Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    pub fn request_refresh(&self) {
        self.refresh_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[CST-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[CST-SIGNAL] failed to register SIGINT: {e}");
        }

        #[cfg(unix)]
        {
            use signal_hook::consts::SIGUSR1;
            if let Err(e) = signal_hook::flag::register(SIGUSR1, Arc::clone(&self.refresh_flag)) {
                eprintln!("[CST-SIGNAL] failed to register SIGUSR1: {e}");
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
