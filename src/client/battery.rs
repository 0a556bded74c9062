//! Sysfs-backed battery probe.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::client::monitor::BatteryProbe;
use crate::core::errors::{Result, StatusError};

/// Reads the charge percentage from a power-supply capacity file
/// (`/sys/class/power_supply/BAT0/capacity` on Linux).
#[derive(Debug, Clone)]
pub struct SysfsBatteryProbe {
    capacity_path: PathBuf,
}

impl SysfsBatteryProbe {
    #[must_use]
    pub fn new(capacity_path: impl Into<PathBuf>) -> Self {
        Self {
            capacity_path: capacity_path.into(),
        }
    }

    #[must_use]
    pub fn capacity_path(&self) -> &Path {
        &self.capacity_path
    }
}

impl BatteryProbe for SysfsBatteryProbe {
    fn sample_battery_percent(&self) -> Result<u8> {
        let raw = fs::read_to_string(&self.capacity_path)
            .map_err(|source| StatusError::io(&self.capacity_path, source))?;
        parse_capacity(&raw)
    }
}

fn parse_capacity(raw: &str) -> Result<u8> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<u16>()
        .map_err(|error| StatusError::BatteryProbe {
            details: format!("capacity {trimmed:?}: {error}"),
        })?;
    if value > 100 {
        return Err(StatusError::BatteryProbe {
            details: format!("capacity {value} out of range"),
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as u8)
}
