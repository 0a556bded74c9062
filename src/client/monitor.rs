//! Collaborator contracts consumed by the surface.
//!
//! The surface reads the client through [`ClientMonitor`] and samples the
//! device through [`BatteryProbe`]. Both are implemented by adapters in this
//! crate (`state_file`, `battery`) and by test doubles.

#![allow(missing_docs)]

use crate::client::status::{RunMode, SlideshowAsset, StatusSnapshot};
use crate::core::errors::Result;

/// Read/write contract with the compute-client monitor.
///
/// Implementations must be shareable across the surface thread and the
/// action dispatcher worker.
pub trait ClientMonitor: Send + Sync {
    /// Current client status. Returns the not-available sentinel when the
    /// client cannot be reached.
    fn status(&self) -> StatusSnapshot;

    /// Slideshow assets in render order. May be empty.
    fn slideshow_assets(&self) -> Vec<SlideshowAsset>;

    /// Request a run mode change. May block; called off the surface thread.
    fn set_run_mode(&self, mode: RunMode) -> bool;

    /// Ask the monitor to re-poll the client and raise a fresh notification.
    fn force_refresh(&self);
}

/// Best-effort live battery reading.
pub trait BatteryProbe: Send + Sync {
    /// Current charge in percent (0..=100).
    fn sample_battery_percent(&self) -> Result<u8>;
}

/// Probe for hosts without a battery. Always fails, which keeps the
/// battery-charging message at its reason-only form.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBattery;

impl BatteryProbe for NoBattery {
    fn sample_battery_percent(&self) -> Result<u8> {
        Err(crate::core::errors::StatusError::BatteryProbe {
            details: "no battery present".to_string(),
        })
    }
}

/// Probe returning a fixed reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery(pub u8);

impl BatteryProbe for FixedBattery {
    fn sample_battery_percent(&self) -> Result<u8> {
        Ok(self.0.min(100))
    }
}
