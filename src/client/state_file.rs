//! File-backed client monitor.
//!
//! The client (or a bridge in front of it) publishes its status as a JSON
//! document:
//!
//! ```json
//! {
//!   "status": {
//!     "setup_status": "available",
//!     "computing_status": "suspended",
//!     "computing_suspend_reason": 4098,
//!     "preferences": {"battery_charge_min_pct": 90.0}
//!   },
//!   "slideshow": [{"project_name": "Einstein@Home", "image": "slides/einstein.png"}]
//! }
//! ```
//!
//! Run-mode requests are written atomically to a separate control file that
//! the client picks up. Slideshow image paths resolve relative to the state
//! file's directory.

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::client::monitor::ClientMonitor;
use crate::client::status::{ImageHandle, RunMode, SlideshowAsset, StatusSnapshot};
use crate::core::errors::{Result, StatusError};

// ──────────────────── on-disk documents ────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StateDocument {
    status: StatusSnapshot,
    slideshow: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    project_name: String,
    image: PathBuf,
}

/// Request written to the control file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunModeRequest {
    pub run_mode: RunMode,
    pub code: i32,
    pub requested_at: String,
}

// ──────────────────── monitor ────────────────────

/// [`ClientMonitor`] reading a state file and writing a control file.
pub struct StateFileMonitor {
    state_file: PathBuf,
    control_file: PathBuf,
    refresh_requested: AtomicBool,
    /// Modification time and length seen by the last poll.
    last_seen: Mutex<Option<(SystemTime, u64)>>,
    last_error: Mutex<Option<String>>,
}

impl StateFileMonitor {
    #[must_use]
    pub fn new(state_file: impl Into<PathBuf>, control_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            control_file: control_file.into(),
            refresh_requested: AtomicBool::new(false),
            last_seen: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    #[must_use]
    pub fn control_file(&self) -> &Path {
        &self.control_file
    }

    /// Parse the status part of the state file.
    pub fn read_status(&self) -> Result<StatusSnapshot> {
        self.read_document().map(|doc| doc.status)
    }

    /// Load slideshow assets; entries whose image cannot be read are skipped.
    pub fn read_assets(&self) -> Result<Vec<SlideshowAsset>> {
        let doc = self.read_document()?;
        let base = self
            .state_file
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let mut assets = Vec::with_capacity(doc.slideshow.len());
        for entry in doc.slideshow {
            let path = if entry.image.is_absolute() {
                entry.image
            } else {
                base.join(&entry.image)
            };
            match fs::read(&path) {
                Ok(bytes) => {
                    let label = path.display().to_string();
                    assets.push(SlideshowAsset::new(
                        entry.project_name,
                        ImageHandle::new(label, bytes),
                    ));
                }
                Err(e) => {
                    eprintln!(
                        "[CST-CLIENT] skipping slideshow image {}: {e}",
                        path.display()
                    );
                }
            }
        }
        Ok(assets)
    }

    /// Write a run-mode request atomically: write to .tmp, then rename.
    pub fn write_run_mode(&self, mode: RunMode) -> Result<()> {
        let request = RunModeRequest {
            run_mode: mode,
            code: mode.code(),
            requested_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        let json = serde_json::to_string_pretty(&request)?;
        write_atomic(&self.control_file, json.as_bytes())
            .map_err(|source| StatusError::io(&self.control_file, source))
    }

    /// Whether a notification should be raised: the state file changed since
    /// the last poll, or a refresh was forced. Clears the forced flag.
    pub fn poll_changed(&self) -> bool {
        let forced = self.refresh_requested.swap(false, Ordering::Relaxed);
        // Coarse mtimes can miss a rewrite within the same tick; the length
        // catches most of those.
        let seen = fs::metadata(&self.state_file)
            .and_then(|m| Ok((m.modified()?, m.len())))
            .ok();

        let mut last = self.last_seen.lock();
        let changed = *last != seen;
        *last = seen;
        forced || changed
    }

    /// Whether a forced refresh is pending (not cleared).
    pub fn refresh_pending(&self) -> bool {
        self.refresh_requested.load(Ordering::Relaxed)
    }

    fn read_document(&self) -> Result<StateDocument> {
        let raw = fs::read_to_string(&self.state_file).map_err(|e| StatusError::ClientState {
            path: self.state_file.clone(),
            details: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| StatusError::ClientState {
            path: self.state_file.clone(),
            details: e.to_string(),
        })
    }

    /// Report a read failure once per distinct message.
    fn note_error(&self, err: &StatusError) {
        let message = err.to_string();
        let mut last = self.last_error.lock();
        if last.as_deref() != Some(message.as_str()) {
            eprintln!("[CST-CLIENT] {message}");
            *last = Some(message);
        }
    }

    fn clear_error(&self) {
        *self.last_error.lock() = None;
    }
}

impl ClientMonitor for StateFileMonitor {
    fn status(&self) -> StatusSnapshot {
        match self.read_status() {
            Ok(status) => {
                self.clear_error();
                status
            }
            Err(e) => {
                self.note_error(&e);
                StatusSnapshot::unavailable()
            }
        }
    }

    fn slideshow_assets(&self) -> Vec<SlideshowAsset> {
        self.read_assets().unwrap_or_else(|e| {
            self.note_error(&e);
            Vec::new()
        })
    }

    fn set_run_mode(&self, mode: RunMode) -> bool {
        match self.write_run_mode(mode) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[CST-CLIENT] run mode {mode} not written: {e}");
                false
            }
        }
    }

    fn force_refresh(&self) {
        self.refresh_requested.store(true, Ordering::Relaxed);
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = (|| {
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
