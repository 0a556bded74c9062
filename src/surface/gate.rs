//! Change gate: suppresses re-evaluation when nothing observable changed.
//!
//! Every mode except "suspended" is reason-less, so an unchanged computing
//! status means an unchanged screen. Suspended carries a reason with its own
//! icon and message, so a changed reason must re-render even when the
//! top-level status stays the same.

#![allow(missing_docs)]

use serde::Serialize;

use crate::client::status::{ComputingStatus, StatusSnapshot, SuspendReason};

/// What was last rendered. `None` fields mean nothing was rendered yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayedState {
    pub last_computing_status: Option<ComputingStatus>,
    pub last_suspend_reason: Option<SuspendReason>,
}

impl DisplayedState {
    pub const UNINITIALIZED: Self = Self {
        last_computing_status: None,
        last_suspend_reason: None,
    };

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.last_computing_status.is_some()
    }

    /// Forget what was rendered so the next available status renders.
    pub fn reset(&mut self) {
        *self = Self::UNINITIALIZED;
    }

    /// Record a snapshot as rendered.
    pub fn record(&mut self, status: &StatusSnapshot) {
        self.last_computing_status = Some(status.computing_status);
        self.last_suspend_reason = Some(status.computing_suspend_reason);
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    /// Client not available; displayed state must be reset.
    Unavailable,
    /// Nothing observable changed.
    Unchanged,
    Render,
}

impl GateVerdict {
    #[must_use]
    pub const fn should_render(self) -> bool {
        matches!(self, Self::Render)
    }
}

/// Pure gate evaluation. Does not touch `prev`.
#[must_use]
pub fn evaluate(prev: &DisplayedState, status: &StatusSnapshot) -> GateVerdict {
    if !status.setup_status.is_available() {
        return GateVerdict::Unavailable;
    }

    if prev.last_computing_status == Some(status.computing_status) {
        if status.computing_status != ComputingStatus::Suspended {
            return GateVerdict::Unchanged;
        }
        if prev.last_suspend_reason == Some(status.computing_suspend_reason) {
            return GateVerdict::Unchanged;
        }
    }

    GateVerdict::Render
}

/// Whether `status` needs a render given what was last displayed.
#[must_use]
pub fn should_render(prev: &DisplayedState, status: &StatusSnapshot) -> bool {
    evaluate(prev, status).should_render()
}

/// Evaluate and apply the reset rule: an unavailable client forgets the
/// displayed state so the next available status always renders.
pub fn admit(displayed: &mut DisplayedState, status: &StatusSnapshot) -> GateVerdict {
    let verdict = evaluate(displayed, status);
    if verdict == GateVerdict::Unavailable {
        displayed.reset();
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::status::SetupStatus;

    fn shown(status: ComputingStatus, reason: SuspendReason) -> DisplayedState {
        DisplayedState {
            last_computing_status: Some(status),
            last_suspend_reason: Some(reason),
        }
    }

    #[test]
    fn uninitialized_always_renders_available_status() {
        for status in ComputingStatus::ALL {
            let snap = StatusSnapshot::available(status);
            assert!(should_render(&DisplayedState::UNINITIALIZED, &snap));
        }
    }

    #[test]
    fn unavailable_never_renders_and_resets() {
        let mut displayed = shown(ComputingStatus::Idle, SuspendReason::NotSuspended);
        let mut snap = StatusSnapshot::available(ComputingStatus::Computing);
        snap.setup_status = SetupStatus::NotAvailable;

        assert_eq!(admit(&mut displayed, &snap), GateVerdict::Unavailable);
        assert_eq!(displayed, DisplayedState::UNINITIALIZED);
    }

    #[test]
    fn error_and_no_projects_count_as_unavailable() {
        for setup in [SetupStatus::Error, SetupStatus::NoProjects] {
            let mut snap = StatusSnapshot::available(ComputingStatus::Computing);
            snap.setup_status = setup;
            assert_eq!(
                evaluate(&DisplayedState::UNINITIALIZED, &snap),
                GateVerdict::Unavailable
            );
        }
    }

    #[test]
    fn unavailable_then_available_forces_render_of_same_status() {
        let mut displayed = DisplayedState::UNINITIALIZED;
        let idle = StatusSnapshot::available(ComputingStatus::Idle);
        assert_eq!(admit(&mut displayed, &idle), GateVerdict::Render);
        displayed.record(&idle);
        assert_eq!(admit(&mut displayed, &idle), GateVerdict::Unchanged);

        assert_eq!(
            admit(&mut displayed, &StatusSnapshot::unavailable()),
            GateVerdict::Unavailable
        );
        assert_eq!(admit(&mut displayed, &idle), GateVerdict::Render);
    }

    #[test]
    fn same_reasonless_status_is_unchanged_even_if_reason_differs() {
        let displayed = shown(ComputingStatus::Idle, SuspendReason::NotSuspended);
        let mut snap = StatusSnapshot::available(ComputingStatus::Idle);
        snap.computing_suspend_reason = SuspendReason::Benchmarks;
        snap.network_suspend_reason = Some(SuspendReason::WifiState);
        assert_eq!(evaluate(&displayed, &snap), GateVerdict::Unchanged);
    }

    #[test]
    fn suspended_with_same_reason_is_unchanged() {
        let displayed = shown(ComputingStatus::Suspended, SuspendReason::TimeOfDay);
        let snap = StatusSnapshot::suspended(SuspendReason::TimeOfDay);
        assert_eq!(evaluate(&displayed, &snap), GateVerdict::Unchanged);
    }

    #[test]
    fn suspended_with_new_reason_renders() {
        let displayed = shown(ComputingStatus::Suspended, SuspendReason::TimeOfDay);
        let snap = StatusSnapshot::suspended(SuspendReason::BatteryCharging);
        assert_eq!(evaluate(&displayed, &snap), GateVerdict::Render);
    }

    #[test]
    fn status_change_renders() {
        let displayed = shown(ComputingStatus::Computing, SuspendReason::NotSuspended);
        let snap = StatusSnapshot::available(ComputingStatus::Idle);
        assert!(should_render(&displayed, &snap));
    }

    #[test]
    fn record_stores_status_and_reason() {
        let mut displayed = DisplayedState::default();
        assert!(!displayed.is_initialized());
        displayed.record(&StatusSnapshot::suspended(SuspendReason::Os));
        assert_eq!(
            displayed,
            shown(ComputingStatus::Suspended, SuspendReason::Os)
        );
    }
}
