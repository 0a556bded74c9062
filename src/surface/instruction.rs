//! Render instructions: what the view layer must show, never how.
//!
//! One [`RenderInstruction`] is produced per accepted notification. Text is
//! carried as message keys so the view layer owns lookup; the built-in English
//! strings exist for the CLI sink.

#![allow(missing_docs)]

use serde::Serialize;

use crate::client::status::{ComputingStatus, RunMode, SuspendReason};
use crate::surface::slideshow::SlideshowLayout;

// ──────────────────── icons & messages ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Play,
    Pause,
    NotConnected,
    Watch,
    Battery,
    Cogs,
}

/// String resource identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    ComputingDisabled,
    ComputingDisabledLong,
    Paused,
    Idle,
    IdleLong,
    Running,
    RunningLong,
    SuspendBatteries,
    SuspendUserActive,
    SuspendUserRequested,
    SuspendTimeOfDay,
    SuspendBenchmarks,
    SuspendDiskSize,
    SuspendCpuThrottle,
    SuspendNoRecentInput,
    SuspendInitialDelay,
    SuspendExclusiveApp,
    SuspendCpuUsage,
    SuspendNetworkQuota,
    SuspendOs,
    SuspendWifi,
    SuspendBatteryCharging,
    SuspendBatteryOverheated,
    SuspendUnknown,
}

impl MessageKey {
    /// Built-in English text.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::ComputingDisabled => "Computing is disabled",
            Self::ComputingDisabledLong => "Tap the icon to resume computing in automatic mode.",
            Self::Paused => "Computing paused",
            Self::Idle => "Idle",
            Self::IdleLong => "No work available right now. Tasks will be fetched automatically.",
            Self::Running => "Computing",
            Self::RunningLong => "Your device is contributing to science.",
            Self::SuspendBatteries => "Device is running on batteries.",
            Self::SuspendUserActive => "Device is in use.",
            Self::SuspendUserRequested => "Restarting computation...",
            Self::SuspendTimeOfDay => "Computing is not allowed at this time of day.",
            Self::SuspendBenchmarks => "Running benchmarks.",
            Self::SuspendDiskSize => "Disk usage limit reached.",
            Self::SuspendCpuThrottle => "Computing is throttled.",
            Self::SuspendNoRecentInput => "No recent user input.",
            Self::SuspendInitialDelay => "Waiting for startup delay to pass.",
            Self::SuspendExclusiveApp => "An exclusive application is running.",
            Self::SuspendCpuUsage => "CPU is busy with other work.",
            Self::SuspendNetworkQuota => "Network transfer quota exceeded.",
            Self::SuspendOs => "Suspended by the operating system.",
            Self::SuspendWifi => "Waiting for a WiFi connection.",
            Self::SuspendBatteryCharging => "Waiting for the battery to charge.",
            Self::SuspendBatteryOverheated => "Battery is too hot.",
            Self::SuspendUnknown => "Computing is suspended.",
        }
    }
}

/// Description text: a plain message, or the battery-charging message
/// enriched with live percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Text {
    Message { key: MessageKey },
    BatteryCharging { min_pct: u8, current_pct: u8 },
}

impl Text {
    #[must_use]
    pub const fn message(key: MessageKey) -> Self {
        Self::Message { key }
    }

    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Message { key } => key.text().to_string(),
            Self::BatteryCharging {
                min_pct,
                current_pct,
            } => format!(
                "Computing resumes once the battery is charged to {min_pct}% \
                 (currently {current_pct}%). Keep the device plugged in."
            ),
        }
    }
}

// ──────────────────── panels ────────────────────

/// Header + icon + description triplet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPanel {
    /// `None` hides the header.
    pub header: Option<MessageKey>,
    pub icon: Icon,
    pub icon_label: MessageKey,
    pub description: Text,
    /// Run mode requested when the icon is activated; `None` = not clickable.
    pub action: Option<RunMode>,
}

impl StatusPanel {
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.action.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SuspendedView {
    Panel { panel: StatusPanel },
    /// Center content replaced by the "restarting" placeholder.
    Restarting { description: Text },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ComputingView {
    Slideshow { slideshow: SlideshowLayout },
    Plain { panel: StatusPanel },
}

// ──────────────────── instruction ────────────────────

/// What the surface must display for one computing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderInstruction {
    Never {
        panel: StatusPanel,
    },
    Suspended {
        reason: SuspendReason,
        view: SuspendedView,
    },
    Idle {
        panel: StatusPanel,
    },
    Computing {
        view: ComputingView,
    },
}

impl RenderInstruction {
    #[must_use]
    pub const fn computing_status(&self) -> ComputingStatus {
        match self {
            Self::Never { .. } => ComputingStatus::Never,
            Self::Suspended { .. } => ComputingStatus::Suspended,
            Self::Idle { .. } => ComputingStatus::Idle,
            Self::Computing { .. } => ComputingStatus::Computing,
        }
    }

    /// The visible header/icon/description panel, if any.
    #[must_use]
    pub const fn panel(&self) -> Option<&StatusPanel> {
        match self {
            Self::Never { panel }
            | Self::Idle { panel }
            | Self::Suspended {
                view: SuspendedView::Panel { panel },
                ..
            }
            | Self::Computing {
                view: ComputingView::Plain { panel },
            } => Some(panel),
            Self::Suspended {
                view: SuspendedView::Restarting { .. },
                ..
            }
            | Self::Computing {
                view: ComputingView::Slideshow { .. },
            } => None,
        }
    }

    #[must_use]
    pub const fn slideshow(&self) -> Option<&SlideshowLayout> {
        match self {
            Self::Computing {
                view: ComputingView::Slideshow { slideshow },
            } => Some(slideshow),
            _ => None,
        }
    }

    #[must_use]
    pub fn slideshow_mut(&mut self) -> Option<&mut SlideshowLayout> {
        match self {
            Self::Computing {
                view: ComputingView::Slideshow { slideshow },
            } => Some(slideshow),
            _ => None,
        }
    }

    /// Run mode bound to the icon, when the icon is clickable.
    #[must_use]
    pub fn icon_action(&self) -> Option<RunMode> {
        self.panel().and_then(|p| p.action)
    }

    #[must_use]
    pub const fn is_restarting(&self) -> bool {
        matches!(
            self,
            Self::Suspended {
                view: SuspendedView::Restarting { .. },
                ..
            }
        )
    }

    /// Short view label for logs.
    #[must_use]
    pub const fn view_label(&self) -> &'static str {
        match self {
            Self::Never { .. } => "disabled",
            Self::Suspended {
                view: SuspendedView::Restarting { .. },
                ..
            } => "restarting",
            Self::Suspended { .. } => "paused",
            Self::Idle { .. } => "idle",
            Self::Computing {
                view: ComputingView::Slideshow { .. },
            } => "slideshow",
            Self::Computing { .. } => "running",
        }
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Suspended {
                view: SuspendedView::Restarting { description },
                ..
            } => format!("[restarting] {}", description.render()),
            Self::Computing {
                view: ComputingView::Slideshow { slideshow },
            } => format!(
                "[slideshow/{}] {} ({} of {})",
                slideshow.density().label(),
                slideshow.caption(),
                slideshow.selected() + 1,
                slideshow.len()
            ),
            _ => match self.panel() {
                Some(panel) => {
                    let header = panel.header.map_or("", MessageKey::text);
                    let click = if panel.is_clickable() { " (tap icon)" } else { "" };
                    format!(
                        "[{}] {header}{}{}{click}",
                        self.view_label(),
                        if header.is_empty() { "" } else { " - " },
                        panel.description.render()
                    )
                }
                None => format!("[{}]", self.view_label()),
            },
        }
    }
}
