//! Status snapshot model published by the compute client on every poll.
//!
//! Snapshots are plain values: the surface receives them by value, compares
//! them against what it last rendered, and never writes back into them.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

// ──────────────────── setup / computing status ────────────────────

/// Whether the client connection is established far enough to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    /// Client not bound or RPC not yet established.
    #[default]
    NotAvailable,
    Available,
    Error,
    NoProjects,
}

impl SetupStatus {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Top-level mode of the compute client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputingStatus {
    /// Computing disabled by the user.
    #[default]
    Never,
    Suspended,
    Idle,
    Computing,
}

impl ComputingStatus {
    pub const ALL: [Self; 4] = [Self::Never, Self::Suspended, Self::Idle, Self::Computing];

    /// Client wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Never => 0,
            Self::Suspended => 1,
            Self::Idle => 2,
            Self::Computing => 3,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Suspended => "suspended",
            Self::Idle => "idle",
            Self::Computing => "computing",
        }
    }
}

impl fmt::Display for ComputingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ──────────────────── suspend reasons ────────────────────

/// Why computing (or network activity) is paused.
///
/// Serialized as the client's integer code so unknown future reasons survive
/// a round trip as [`SuspendReason::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SuspendReason {
    #[default]
    NotSuspended,
    Batteries,
    UserActive,
    UserRequested,
    TimeOfDay,
    Benchmarks,
    DiskSize,
    CpuThrottle,
    NoRecentInput,
    InitialDelay,
    ExclusiveAppRunning,
    CpuUsage,
    NetworkQuotaExceeded,
    Os,
    WifiState,
    BatteryCharging,
    BatteryOverheated,
    Unknown(i32),
}

impl SuspendReason {
    /// Every reason the client defines, in wire-code order.
    pub const KNOWN: [Self; 16] = [
        Self::Batteries,
        Self::UserActive,
        Self::UserRequested,
        Self::TimeOfDay,
        Self::Benchmarks,
        Self::DiskSize,
        Self::CpuThrottle,
        Self::NoRecentInput,
        Self::InitialDelay,
        Self::ExclusiveAppRunning,
        Self::CpuUsage,
        Self::NetworkQuotaExceeded,
        Self::Os,
        Self::WifiState,
        Self::BatteryCharging,
        Self::BatteryOverheated,
    ];

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::NotSuspended => 0,
            Self::Batteries => 1,
            Self::UserActive => 2,
            Self::UserRequested => 4,
            Self::TimeOfDay => 8,
            Self::Benchmarks => 16,
            Self::DiskSize => 32,
            Self::CpuThrottle => 64,
            Self::NoRecentInput => 128,
            Self::InitialDelay => 256,
            Self::ExclusiveAppRunning => 512,
            Self::CpuUsage => 1024,
            Self::NetworkQuotaExceeded => 2048,
            Self::Os => 4096,
            Self::WifiState => 4097,
            Self::BatteryCharging => 4098,
            Self::BatteryOverheated => 4099,
            Self::Unknown(code) => code,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::NotSuspended,
            1 => Self::Batteries,
            2 => Self::UserActive,
            4 => Self::UserRequested,
            8 => Self::TimeOfDay,
            16 => Self::Benchmarks,
            32 => Self::DiskSize,
            64 => Self::CpuThrottle,
            128 => Self::NoRecentInput,
            256 => Self::InitialDelay,
            512 => Self::ExclusiveAppRunning,
            1024 => Self::CpuUsage,
            2048 => Self::NetworkQuotaExceeded,
            4096 => Self::Os,
            4097 => Self::WifiState,
            4098 => Self::BatteryCharging,
            4099 => Self::BatteryOverheated,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotSuspended => "not_suspended",
            Self::Batteries => "batteries",
            Self::UserActive => "user_active",
            Self::UserRequested => "user_requested",
            Self::TimeOfDay => "time_of_day",
            Self::Benchmarks => "benchmarks",
            Self::DiskSize => "disk_size",
            Self::CpuThrottle => "cpu_throttle",
            Self::NoRecentInput => "no_recent_input",
            Self::InitialDelay => "initial_delay",
            Self::ExclusiveAppRunning => "exclusive_app_running",
            Self::CpuUsage => "cpu_usage",
            Self::NetworkQuotaExceeded => "network_quota_exceeded",
            Self::Os => "os",
            Self::WifiState => "wifi_state",
            Self::BatteryCharging => "battery_charging",
            Self::BatteryOverheated => "battery_overheated",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl From<i32> for SuspendReason {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<SuspendReason> for i32 {
    fn from(reason: SuspendReason) -> Self {
        reason.code()
    }
}

impl fmt::Display for SuspendReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({code})"),
            other => f.write_str(other.label()),
        }
    }
}

// ──────────────────── run mode ────────────────────

/// Operating mode requested from the client by the single surface action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Always,
    Auto,
    Never,
    Restore,
}

impl RunMode {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Always => 1,
            Self::Auto => 2,
            Self::Never => 3,
            Self::Restore => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Auto => "auto",
            Self::Never => "never",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ──────────────────── snapshot ────────────────────

/// Client preferences relevant to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Minimum battery charge before computing resumes.
    pub battery_charge_min_pct: Option<f64>,
}

/// One polled view of the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSnapshot {
    pub setup_status: SetupStatus,
    pub computing_status: ComputingStatus,
    /// Meaningful only while suspended.
    pub computing_suspend_reason: SuspendReason,
    /// Meaningful only while idle. Absent means "none".
    pub network_suspend_reason: Option<SuspendReason>,
    pub preferences: Option<Preferences>,
}

impl StatusSnapshot {
    /// Sentinel returned while the client is not reachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Available snapshot with the given computing status and no reasons.
    #[must_use]
    pub fn available(computing_status: ComputingStatus) -> Self {
        Self {
            setup_status: SetupStatus::Available,
            computing_status,
            ..Self::default()
        }
    }

    /// Available, suspended snapshot.
    #[must_use]
    pub fn suspended(reason: SuspendReason) -> Self {
        Self {
            computing_suspend_reason: reason,
            ..Self::available(ComputingStatus::Suspended)
        }
    }

    #[must_use]
    pub fn battery_charge_min_pct(&self) -> Option<f64> {
        self.preferences.and_then(|p| p.battery_charge_min_pct)
    }
}

// ──────────────────── slideshow assets ────────────────────

/// Opaque, cheaply clonable bitmap handle.
///
/// The surface never decodes images; it only decides which one is bound to
/// the image view. Equality compares contents.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    label: Arc<str>,
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("label", &self.label)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Serialize for ImageHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ImageHandle", 2)?;
        s.serialize_field("label", &*self.label)?;
        s.serialize_field("bytes", &self.bytes.len())?;
        s.end()
    }
}

/// One promotional image with its project caption. Order is render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideshowAsset {
    pub project_name: String,
    pub image: ImageHandle,
}

impl SlideshowAsset {
    #[must_use]
    pub fn new(project_name: impl Into<String>, image: ImageHandle) -> Self {
        Self {
            project_name: project_name.into(),
            image,
        }
    }
}
