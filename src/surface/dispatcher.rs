//! Action dispatcher: runs `set_run_mode` off the surface thread.
//!
//! The worker owns no surface state. Each completion is handed to the
//! `on_complete` callback, which the runtime wires back into its own channel
//! so completions serialize with status notifications.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::client::monitor::ClientMonitor;
use crate::client::status::RunMode;
use crate::core::errors::{Result, StatusError};

const QUEUE_CAPACITY: usize = 4;

enum Job {
    SetRunMode(RunMode),
    Shutdown,
}

/// Handle to the dispatcher worker thread.
pub struct ActionDispatcher {
    tx: Sender<Job>,
    join: Option<thread::JoinHandle<()>>,
}

impl ActionDispatcher {
    /// Spawn the worker.
    pub fn spawn<F>(monitor: Arc<dyn ClientMonitor>, on_complete: F) -> Result<Self>
    where
        F: Fn(RunMode, bool) + Send + 'static,
    {
        let (tx, rx) = bounded::<Job>(QUEUE_CAPACITY);
        let join = thread::Builder::new()
            .name("cstat-dispatch".to_string())
            .spawn(move || worker_main(&rx, monitor.as_ref(), &on_complete))
            .map_err(|e| StatusError::Runtime {
                details: format!("failed to spawn dispatcher thread: {e}"),
            })?;
        Ok(Self {
            tx,
            join: Some(join),
        })
    }

    /// Queue a run-mode request. Returns false when the queue is full or the
    /// worker is gone; the user may simply retry.
    pub fn dispatch(&self, mode: RunMode) -> bool {
        match self.tx.try_send(Job::SetRunMode(mode)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                eprintln!("[CST-DISPATCH] queue full, dropping run mode {mode}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stop the worker after the queued jobs finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Job::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_main(rx: &Receiver<Job>, monitor: &dyn ClientMonitor, on_complete: &dyn Fn(RunMode, bool)) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::SetRunMode(mode) => {
                let ok = monitor.set_run_mode(mode);
                on_complete(mode, ok);
            }
            Job::Shutdown => break,
        }
    }
}
