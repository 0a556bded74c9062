//! Presentation decider: maps one accepted status snapshot to exactly one
//! [`RenderInstruction`].
//!
//! The decision is pure apart from the live battery probe, which is consulted
//! only for the battery-charging suspend reason and whose failure degrades the
//! message instead of failing the render.

#![allow(missing_docs)]

use std::sync::Arc;

use crate::client::monitor::BatteryProbe;
use crate::client::status::{
    ComputingStatus, RunMode, SlideshowAsset, StatusSnapshot, SuspendReason,
};
use crate::core::errors::StatusError;
use crate::surface::instruction::{
    ComputingView, Icon, MessageKey, RenderInstruction, StatusPanel, SuspendedView, Text,
};
use crate::surface::slideshow::{self, ViewportConstraints};

// ──────────────────── suspend rule table ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendLayout {
    Panel,
    /// Center content swapped for the "restarting" placeholder.
    Restarting,
}

/// Presentation rule for one suspend reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendRule {
    pub header_visible: bool,
    pub icon: Icon,
    pub description: MessageKey,
    pub live_battery_lookup: bool,
    pub layout: SuspendLayout,
}

impl SuspendRule {
    const fn paused(description: MessageKey) -> Self {
        Self {
            header_visible: true,
            icon: Icon::Pause,
            description,
            live_battery_lookup: false,
            layout: SuspendLayout::Panel,
        }
    }

    const fn headless(icon: Icon, description: MessageKey) -> Self {
        Self {
            header_visible: false,
            icon,
            description,
            live_battery_lookup: false,
            layout: SuspendLayout::Panel,
        }
    }
}

/// Total mapping from suspend reason to its presentation rule.
#[must_use]
pub const fn suspend_rule(reason: SuspendReason) -> SuspendRule {
    match reason {
        SuspendReason::Batteries => {
            SuspendRule::headless(Icon::NotConnected, MessageKey::SuspendBatteries)
        }
        SuspendReason::UserActive => SuspendRule::paused(MessageKey::SuspendUserActive),
        SuspendReason::UserRequested => SuspendRule {
            layout: SuspendLayout::Restarting,
            ..SuspendRule::paused(MessageKey::SuspendUserRequested)
        },
        SuspendReason::TimeOfDay => SuspendRule::paused(MessageKey::SuspendTimeOfDay),
        SuspendReason::Benchmarks => {
            SuspendRule::headless(Icon::Watch, MessageKey::SuspendBenchmarks)
        }
        SuspendReason::DiskSize => SuspendRule::paused(MessageKey::SuspendDiskSize),
        SuspendReason::CpuThrottle => SuspendRule::paused(MessageKey::SuspendCpuThrottle),
        SuspendReason::NoRecentInput => SuspendRule::paused(MessageKey::SuspendNoRecentInput),
        SuspendReason::InitialDelay => SuspendRule::paused(MessageKey::SuspendInitialDelay),
        SuspendReason::ExclusiveAppRunning => SuspendRule::paused(MessageKey::SuspendExclusiveApp),
        SuspendReason::CpuUsage => SuspendRule::paused(MessageKey::SuspendCpuUsage),
        SuspendReason::NetworkQuotaExceeded => {
            SuspendRule::paused(MessageKey::SuspendNetworkQuota)
        }
        SuspendReason::Os => SuspendRule::paused(MessageKey::SuspendOs),
        SuspendReason::WifiState => SuspendRule::paused(MessageKey::SuspendWifi),
        SuspendReason::BatteryCharging => SuspendRule {
            live_battery_lookup: true,
            ..SuspendRule::headless(Icon::Battery, MessageKey::SuspendBatteryCharging)
        },
        SuspendReason::BatteryOverheated => {
            SuspendRule::headless(Icon::Battery, MessageKey::SuspendBatteryOverheated)
        }
        SuspendReason::NotSuspended | SuspendReason::Unknown(_) => {
            SuspendRule::paused(MessageKey::SuspendUnknown)
        }
    }
}

// ──────────────────── decider ────────────────────

/// Stateless mapping from status to render instruction.
#[derive(Clone)]
pub struct PresentationDecider {
    probe: Arc<dyn BatteryProbe>,
}

impl std::fmt::Debug for PresentationDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationDecider").finish_non_exhaustive()
    }
}

impl PresentationDecider {
    #[must_use]
    pub fn new(probe: Arc<dyn BatteryProbe>) -> Self {
        Self { probe }
    }

    /// Produce the instruction for `status`.
    #[must_use]
    pub fn decide(
        &self,
        status: &StatusSnapshot,
        viewport: &ViewportConstraints,
        assets: &[SlideshowAsset],
    ) -> RenderInstruction {
        self.decide_traced(status, viewport, assets).0
    }

    /// Like [`decide`](Self::decide), also returning a swallowed battery
    /// probe failure so the caller can log it.
    #[must_use]
    pub fn decide_traced(
        &self,
        status: &StatusSnapshot,
        viewport: &ViewportConstraints,
        assets: &[SlideshowAsset],
    ) -> (RenderInstruction, Option<StatusError>) {
        match status.computing_status {
            ComputingStatus::Never => (never_instruction(), None),
            ComputingStatus::Suspended => self.suspended(status),
            ComputingStatus::Idle => (idle_instruction(status), None),
            ComputingStatus::Computing => (computing_instruction(viewport, assets), None),
        }
    }

    fn suspended(&self, status: &StatusSnapshot) -> (RenderInstruction, Option<StatusError>) {
        let reason = status.computing_suspend_reason;
        let rule = suspend_rule(reason);

        let (description, probe_error) = if rule.live_battery_lookup {
            self.battery_charging_text(status, rule.description)
        } else {
            (Text::message(rule.description), None)
        };

        let view = match rule.layout {
            SuspendLayout::Restarting => SuspendedView::Restarting { description },
            SuspendLayout::Panel => SuspendedView::Panel {
                panel: StatusPanel {
                    header: rule.header_visible.then_some(MessageKey::Paused),
                    icon: rule.icon,
                    icon_label: MessageKey::Paused,
                    description,
                    action: None,
                },
            },
        };

        (RenderInstruction::Suspended { reason, view }, probe_error)
    }

    /// Enriched battery-charging text. The probe is only consulted when the
    /// minimum-charge preference is known.
    fn battery_charging_text(
        &self,
        status: &StatusSnapshot,
        fallback: MessageKey,
    ) -> (Text, Option<StatusError>) {
        let Some(min) = status.battery_charge_min_pct().filter(|v| v.is_finite()) else {
            return (Text::message(fallback), None);
        };

        match self.probe.sample_battery_percent() {
            Ok(current_pct) => (
                Text::BatteryCharging {
                    min_pct: truncate_percent(min),
                    current_pct,
                },
                None,
            ),
            Err(e) => (Text::message(fallback), Some(e)),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_percent(value: f64) -> u8 {
    value.trunc().clamp(0.0, 100.0) as u8
}

fn never_instruction() -> RenderInstruction {
    RenderInstruction::Never {
        panel: StatusPanel {
            header: Some(MessageKey::ComputingDisabled),
            icon: Icon::Play,
            icon_label: MessageKey::ComputingDisabled,
            description: Text::message(MessageKey::ComputingDisabledLong),
            action: Some(RunMode::Auto),
        },
    }
}

fn idle_instruction(status: &StatusSnapshot) -> RenderInstruction {
    let description = if status.network_suspend_reason == Some(SuspendReason::WifiState) {
        MessageKey::SuspendWifi
    } else {
        MessageKey::IdleLong
    };
    RenderInstruction::Idle {
        panel: StatusPanel {
            header: Some(MessageKey::Idle),
            icon: Icon::Pause,
            icon_label: MessageKey::Idle,
            description: Text::message(description),
            action: None,
        },
    }
}

fn computing_instruction(
    viewport: &ViewportConstraints,
    assets: &[SlideshowAsset],
) -> RenderInstruction {
    let view = match slideshow::select(viewport, assets) {
        Some(slideshow) => ComputingView::Slideshow { slideshow },
        None => ComputingView::Plain {
            panel: StatusPanel {
                header: Some(MessageKey::Running),
                icon: Icon::Cogs,
                icon_label: MessageKey::Running,
                description: Text::message(MessageKey::RunningLong),
                action: None,
            },
        },
    };
    RenderInstruction::Computing { view }
}
