//! Activity logger thread.
//!
//! A dedicated thread owns the [`JsonlWriter`]. The surface runtime sends
//! [`ActivityEvent`] values over a bounded crossbeam channel with `try_send()`,
//! so rendering is never blocked by logging back-pressure.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::client::status::{ComputingStatus, RunMode, SetupStatus, SuspendReason};
use crate::core::errors::{Result, StatusError};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

const CHANNEL_CAPACITY: usize = 256;
/// Minimum gap between attempts to reopen the primary log after a degradation.
const RECOVERY_INTERVAL: Duration = Duration::from_secs(30);

// ──────────────────── public event type ────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    SurfaceAttached {
        width: u32,
        height: u32,
        config_hash: String,
    },
    SurfaceDetached,
    Rendered {
        computing_status: ComputingStatus,
        suspend_reason: Option<SuspendReason>,
        view: &'static str,
    },
    RenderSuppressed {
        computing_status: ComputingStatus,
        suspend_reason: Option<SuspendReason>,
    },
    ClientUnavailable {
        setup_status: SetupStatus,
    },
    RunModeRequested {
        mode: RunMode,
    },
    RunModeCompleted {
        mode: RunMode,
        ok: bool,
    },
    ForceRefresh,
    BatteryProbeFailed {
        code: String,
        message: String,
    },
    SlideSelected {
        index: usize,
        caption: String,
    },
    Error {
        code: String,
        message: String,
    },
    /// Sentinel to stop the logger thread.
    Shutdown,
}

impl ActivityEvent {
    /// Error event from a [`StatusError`].
    #[must_use]
    pub fn error(err: &StatusError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ──────────────────── public handle ────────────────────

/// Cloneable, non-blocking sender for activity events.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Send an event. A full channel drops the event and bumps the counter.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

// ──────────────────── configuration ────────────────────

pub struct ActivityLoggerConfig {
    pub jsonl_config: JsonlConfig,
    pub channel_capacity: usize,
}

impl Default for ActivityLoggerConfig {
    fn default() -> Self {
        Self {
            jsonl_config: JsonlConfig::default(),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

// ──────────────────── spawn ────────────────────

/// Spawn the logger thread. It runs until `shutdown()` or until every
/// handle is dropped.
pub fn spawn_logger(
    config: ActivityLoggerConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(config.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("cstat-logger".to_string())
        .spawn(move || logger_thread_main(rx, config.jsonl_config, dropped_clone))
        .map_err(|e| StatusError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

#[allow(clippy::needless_pass_by_value)]
fn logger_thread_main(rx: Receiver<ActivityEvent>, config: JsonlConfig, dropped: Arc<AtomicU64>) {
    let mut jsonl = JsonlWriter::open(config);
    let mut last_recovery = Instant::now();

    while let Ok(event) = rx.recv() {
        if jsonl.state() != "normal" && last_recovery.elapsed() >= RECOVERY_INTERVAL {
            jsonl.try_recover();
            last_recovery = Instant::now();
        }

        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new(EventType::Error, Severity::Warning);
            warn.details = Some(format!("{d} log events dropped due to back-pressure"));
            jsonl.write_entry(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            break;
        }

        jsonl.write_entry(&event_to_log_entry(&event));
    }

    jsonl.flush();
    jsonl.fsync();
}

// ──────────────────── event conversion ────────────────────

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::SurfaceAttached {
            width,
            height,
            config_hash,
        } => {
            let mut e = LogEntry::new(EventType::SurfaceAttach, Severity::Info);
            e.details = Some(format!("viewport={width}x{height} config_hash={config_hash}"));
            e
        }
        ActivityEvent::SurfaceDetached => LogEntry::new(EventType::SurfaceDetach, Severity::Info),
        ActivityEvent::Rendered {
            computing_status,
            suspend_reason,
            view,
        } => {
            let mut e = LogEntry::new(EventType::Render, Severity::Info);
            e.computing_status = Some(computing_status.to_string());
            e.suspend_reason = suspend_reason.map(|r| r.to_string());
            e.view = Some((*view).to_string());
            e
        }
        ActivityEvent::RenderSuppressed {
            computing_status,
            suspend_reason,
        } => {
            let mut e = LogEntry::new(EventType::RenderSuppressed, Severity::Debug);
            e.computing_status = Some(computing_status.to_string());
            e.suspend_reason = suspend_reason.map(|r| r.to_string());
            e
        }
        ActivityEvent::ClientUnavailable { setup_status } => {
            let mut e = LogEntry::new(EventType::ClientUnavailable, Severity::Warning);
            e.details = Some(format!("setup_status={setup_status:?}"));
            e
        }
        ActivityEvent::RunModeRequested { mode } => {
            let mut e = LogEntry::new(EventType::RunModeDispatch, Severity::Info);
            e.run_mode = Some(mode.to_string());
            e
        }
        ActivityEvent::RunModeCompleted { mode, ok } => {
            let severity = if *ok { Severity::Info } else { Severity::Warning };
            let mut e = LogEntry::new(EventType::RunModeComplete, severity);
            e.run_mode = Some(mode.to_string());
            e.ok = Some(*ok);
            e
        }
        ActivityEvent::ForceRefresh => LogEntry::new(EventType::ForceRefresh, Severity::Debug),
        ActivityEvent::BatteryProbeFailed { code, message } => {
            let mut e = LogEntry::new(EventType::BatteryProbe, Severity::Debug);
            e.ok = Some(false);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e
        }
        ActivityEvent::SlideSelected { index, caption } => {
            let mut e = LogEntry::new(EventType::SlideSelect, Severity::Debug);
            e.slide = Some(*index);
            e.details = Some(caption.clone());
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogEntry::new(EventType::Error, Severity::Critical);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e.ok = Some(false);
            e
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::SurfaceDetach, Severity::Info),
    }
}
