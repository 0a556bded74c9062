//! Elm-style state model for the status surface.
//!
//! All surface state lives in [`SurfaceModel`]. Notifications, user input and
//! worker completions arrive as [`SurfaceMsg`] values; side-effects are
//! returned as [`SurfaceCmd`] values and executed by the runtime.
//!
//! The model performs no I/O.

#![allow(missing_docs)]

use serde::Serialize;

use crate::client::status::{ComputingStatus, RunMode, StatusSnapshot};
use crate::core::errors::StatusError;
use crate::logger::activity::ActivityEvent;
use crate::surface::gate::DisplayedState;
use crate::surface::instruction::RenderInstruction;
use crate::surface::slideshow::{SelectionUpdate, ViewportConstraints};

// ──────────────────── counters ────────────────────

/// Per-surface counters, returned by the runtime thread on exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceCounters {
    pub notifications: u64,
    pub renders: u64,
    pub suppressed: u64,
    pub unavailable: u64,
    pub run_mode_requests: u64,
    pub run_mode_failures: u64,
    pub force_refreshes: u64,
    pub probe_failures: u64,
}

// ──────────────────── model ────────────────────

#[derive(Debug, Clone, Default)]
pub struct SurfaceModel {
    pub displayed: DisplayedState,
    pub viewport: ViewportConstraints,
    pub attached: bool,
    /// Instruction currently on screen.
    pub current: Option<RenderInstruction>,
    pub counters: SurfaceCounters,
}

impl SurfaceModel {
    #[must_use]
    pub fn new(viewport: ViewportConstraints) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Run mode the icon would request right now, if it is clickable.
    #[must_use]
    pub fn icon_action(&self) -> Option<RunMode> {
        if !self.attached {
            return None;
        }
        self.current.as_ref().and_then(RenderInstruction::icon_action)
    }
}

// ──────────────────── messages ────────────────────

#[derive(Debug)]
pub enum SurfaceMsg {
    /// Surface became visible with the given viewport.
    Attached { viewport: ViewportConstraints },
    Detached,
    /// A fresh snapshot was read after a change notification.
    StatusChanged(StatusSnapshot),
    /// Runtime finished a [`SurfaceCmd::Decide`].
    Decided {
        status: StatusSnapshot,
        instruction: Box<RenderInstruction>,
        probe_error: Option<StatusError>,
    },
    IconActivated,
    SlideSelected(usize),
    /// Dispatcher completion; re-enters the serial path.
    RunModeFinished { mode: RunMode, ok: bool },
}

// ──────────────────── commands ────────────────────

#[derive(Debug, Clone)]
pub enum SurfaceCmd {
    None,
    /// Read the client status and feed it back as `StatusChanged`.
    FetchStatus,
    /// Gate accepted `status`: load assets if needed and run the decider.
    Decide(Box<StatusSnapshot>),
    Render(Box<RenderInstruction>),
    UpdateSlide(SelectionUpdate),
    DispatchRunMode(RunMode),
    ForceRefresh,
    /// User-visible failure notice.
    Warn(String),
    Log(ActivityEvent),
    Batch(Vec<SurfaceCmd>),
}

impl SurfaceCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

/// Whether the decider needs slideshow assets for `status`.
#[must_use]
pub fn needs_assets(status: &StatusSnapshot) -> bool {
    status.computing_status == ComputingStatus::Computing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_drops_none_and_preserves_order() {
        let cmd = SurfaceCmd::Batch(vec![
            SurfaceCmd::None,
            SurfaceCmd::ForceRefresh,
            SurfaceCmd::Batch(vec![SurfaceCmd::FetchStatus, SurfaceCmd::None]),
            SurfaceCmd::Warn("x".to_string()),
        ]);
        let flat = cmd.flatten();
        assert_eq!(flat.len(), 3);
        assert!(matches!(flat[0], SurfaceCmd::ForceRefresh));
        assert!(matches!(flat[1], SurfaceCmd::FetchStatus));
        assert!(matches!(flat[2], SurfaceCmd::Warn(_)));
    }

    #[test]
    fn only_computing_needs_assets() {
        for status in ComputingStatus::ALL {
            assert_eq!(
                needs_assets(&StatusSnapshot::available(status)),
                status == ComputingStatus::Computing
            );
        }
    }

    #[test]
    fn detached_model_has_no_icon_action() {
        let model = SurfaceModel::default();
        assert!(!model.attached);
        assert_eq!(model.icon_action(), None);
    }
}
