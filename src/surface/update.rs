//! Pure update function for the status surface.
//!
//! `update()` applies one message to the model and returns the command the
//! runtime should execute. Messages are processed strictly one at a time, so
//! the gate, the decision and the recording of the displayed state happen
//! without interleaving.

use crate::client::status::{ComputingStatus, StatusSnapshot, SuspendReason};
use crate::logger::activity::ActivityEvent;
use crate::surface::gate::{self, GateVerdict};
use crate::surface::instruction::RenderInstruction;
use crate::surface::model::{SurfaceCmd, SurfaceModel, SurfaceMsg};

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut SurfaceModel, msg: SurfaceMsg) -> SurfaceCmd {
    match msg {
        SurfaceMsg::Attached { viewport } => {
            model.attached = true;
            model.viewport = viewport;
            model.displayed.reset();
            model.current = None;
            SurfaceCmd::FetchStatus
        }

        SurfaceMsg::Detached => {
            model.attached = false;
            model.current = None;
            SurfaceCmd::Log(ActivityEvent::SurfaceDetached)
        }

        SurfaceMsg::StatusChanged(status) => {
            if !model.attached {
                return SurfaceCmd::None;
            }
            model.counters.notifications += 1;
            handle_status(model, status)
        }

        SurfaceMsg::Decided {
            status,
            instruction,
            probe_error,
        } => {
            if !model.attached {
                return SurfaceCmd::None;
            }
            model.displayed.record(&status);
            model.counters.renders += 1;

            let mut cmds = vec![
                SurfaceCmd::Render(instruction.clone()),
                SurfaceCmd::Log(rendered_event(&status, &instruction)),
            ];
            if let Some(err) = probe_error {
                model.counters.probe_failures += 1;
                cmds.push(SurfaceCmd::Log(ActivityEvent::BatteryProbeFailed {
                    code: err.code().to_string(),
                    message: err.to_string(),
                }));
            }
            model.current = Some(*instruction);
            SurfaceCmd::Batch(cmds)
        }

        SurfaceMsg::IconActivated => match model.icon_action() {
            Some(mode) => {
                model.counters.run_mode_requests += 1;
                SurfaceCmd::Batch(vec![
                    SurfaceCmd::DispatchRunMode(mode),
                    SurfaceCmd::Log(ActivityEvent::RunModeRequested { mode }),
                ])
            }
            None => SurfaceCmd::None,
        },

        SurfaceMsg::SlideSelected(index) => {
            if !model.attached {
                return SurfaceCmd::None;
            }
            let Some(selection) = model
                .current
                .as_mut()
                .and_then(RenderInstruction::slideshow_mut)
                .and_then(|layout| layout.select(index))
            else {
                return SurfaceCmd::None;
            };

            if selection.changed {
                let log = SurfaceCmd::Log(ActivityEvent::SlideSelected {
                    index: selection.index,
                    caption: selection.caption.clone(),
                });
                SurfaceCmd::Batch(vec![SurfaceCmd::UpdateSlide(selection), log])
            } else {
                SurfaceCmd::UpdateSlide(selection)
            }
        }

        SurfaceMsg::RunModeFinished { mode, ok } => {
            let completed = SurfaceCmd::Log(ActivityEvent::RunModeCompleted { mode, ok });
            if ok {
                model.counters.force_refreshes += 1;
                SurfaceCmd::Batch(vec![
                    completed,
                    SurfaceCmd::ForceRefresh,
                    SurfaceCmd::Log(ActivityEvent::ForceRefresh),
                ])
            } else {
                model.counters.run_mode_failures += 1;
                let mut cmds = vec![completed];
                if model.attached {
                    cmds.push(SurfaceCmd::Warn(format!(
                        "Could not switch the client to {mode} mode. Tap the icon to retry."
                    )));
                }
                SurfaceCmd::Batch(cmds)
            }
        }
    }
}

fn handle_status(model: &mut SurfaceModel, status: StatusSnapshot) -> SurfaceCmd {
    let was_initialized = model.displayed.is_initialized();
    match gate::admit(&mut model.displayed, &status) {
        GateVerdict::Unavailable => {
            model.counters.unavailable += 1;
            if was_initialized {
                SurfaceCmd::Log(ActivityEvent::ClientUnavailable {
                    setup_status: status.setup_status,
                })
            } else {
                SurfaceCmd::None
            }
        }
        GateVerdict::Unchanged => {
            model.counters.suppressed += 1;
            SurfaceCmd::Log(ActivityEvent::RenderSuppressed {
                computing_status: status.computing_status,
                suspend_reason: suspend_reason_of(&status),
            })
        }
        GateVerdict::Render => SurfaceCmd::Decide(Box::new(status)),
    }
}

fn rendered_event(status: &StatusSnapshot, instruction: &RenderInstruction) -> ActivityEvent {
    ActivityEvent::Rendered {
        computing_status: status.computing_status,
        suspend_reason: suspend_reason_of(status),
        view: instruction.view_label(),
    }
}

fn suspend_reason_of(status: &StatusSnapshot) -> Option<SuspendReason> {
    (status.computing_status == ComputingStatus::Suspended)
        .then_some(status.computing_suspend_reason)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::monitor::{FixedBattery, NoBattery};
    use crate::client::status::{ImageHandle, Preferences, RunMode, SetupStatus, SlideshowAsset};
    use crate::core::config::SlideshowConfig;
    use crate::surface::decider::PresentationDecider;
    use crate::surface::slideshow::ViewportConstraints;

    fn viewport(height: u32) -> ViewportConstraints {
        ViewportConstraints::new(720, height, &SlideshowConfig::default())
    }

    fn attached(height: u32) -> SurfaceModel {
        let mut model = SurfaceModel::default();
        let cmd = update(
            &mut model,
            SurfaceMsg::Attached {
                viewport: viewport(height),
            },
        );
        assert!(matches!(cmd, SurfaceCmd::FetchStatus));
        model
    }

    /// Drive a status through the gate and, when accepted, the decider,
    /// mimicking what the runtime does for `Decide`.
    fn notify(
        model: &mut SurfaceModel,
        decider: &PresentationDecider,
        status: StatusSnapshot,
        assets: &[SlideshowAsset],
    ) -> Vec<SurfaceCmd> {
        let mut out = Vec::new();
        for cmd in update(model, SurfaceMsg::StatusChanged(status)).flatten() {
            if let SurfaceCmd::Decide(status) = cmd {
                let (instruction, probe_error) =
                    decider.decide_traced(&status, &model.viewport, assets);
                out.extend(
                    update(
                        model,
                        SurfaceMsg::Decided {
                            status: *status,
                            instruction: Box::new(instruction),
                            probe_error,
                        },
                    )
                    .flatten(),
                );
            } else {
                out.push(cmd);
            }
        }
        out
    }

    fn renders(cmds: &[SurfaceCmd]) -> Vec<&RenderInstruction> {
        cmds.iter()
            .filter_map(|c| match c {
                SurfaceCmd::Render(i) => Some(i.as_ref()),
                _ => None,
            })
            .collect()
    }

    fn asset(name: &str) -> SlideshowAsset {
        SlideshowAsset::new(name, ImageHandle::new(name, vec![1u8]))
    }

    #[test]
    fn first_status_after_attach_renders() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        let cmds = notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Idle),
            &[],
        );
        assert_eq!(renders(&cmds).len(), 1);
        assert_eq!(model.counters.renders, 1);
        assert!(model.displayed.is_initialized());
    }

    #[test]
    fn repeated_status_is_suppressed() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        let idle = StatusSnapshot::available(ComputingStatus::Idle);
        notify(&mut model, &decider, idle.clone(), &[]);
        let cmds = notify(&mut model, &decider, idle, &[]);
        assert!(renders(&cmds).is_empty());
        assert_eq!(model.counters.suppressed, 1);
    }

    #[test]
    fn suspend_reason_change_renders_again() {
        let decider = PresentationDecider::new(Arc::new(FixedBattery(40)));
        let mut model = attached(2000);
        notify(
            &mut model,
            &decider,
            StatusSnapshot::suspended(SuspendReason::TimeOfDay),
            &[],
        );
        let mut charging = StatusSnapshot::suspended(SuspendReason::BatteryCharging);
        charging.preferences = Some(Preferences {
            battery_charge_min_pct: Some(90.0),
        });
        let cmds = notify(&mut model, &decider, charging, &[]);
        let shown = renders(&cmds);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].panel().expect("panel").header, None);
    }

    #[test]
    fn unavailable_resets_and_next_status_renders() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        let idle = StatusSnapshot::available(ComputingStatus::Idle);
        notify(&mut model, &decider, idle.clone(), &[]);

        let cmds = notify(&mut model, &decider, StatusSnapshot::unavailable(), &[]);
        assert!(renders(&cmds).is_empty());
        assert!(matches!(
            cmds.as_slice(),
            [SurfaceCmd::Log(ActivityEvent::ClientUnavailable {
                setup_status: SetupStatus::NotAvailable
            })]
        ));

        let cmds = notify(&mut model, &decider, idle, &[]);
        assert_eq!(renders(&cmds).len(), 1);
    }

    #[test]
    fn status_is_ignored_while_detached() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        update(&mut model, SurfaceMsg::Detached);
        let cmds = notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Idle),
            &[],
        );
        assert!(cmds.is_empty());
        assert_eq!(model.counters.notifications, 0);
    }

    #[test]
    fn reattach_resets_displayed_state() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        let idle = StatusSnapshot::available(ComputingStatus::Idle);
        notify(&mut model, &decider, idle.clone(), &[]);
        update(&mut model, SurfaceMsg::Detached);
        update(
            &mut model,
            SurfaceMsg::Attached {
                viewport: viewport(2000),
            },
        );
        assert!(!model.displayed.is_initialized());
        let cmds = notify(&mut model, &decider, idle, &[]);
        assert_eq!(renders(&cmds).len(), 1);
    }

    #[test]
    fn icon_click_dispatches_only_when_clickable() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);

        notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Idle),
            &[],
        );
        assert!(matches!(
            update(&mut model, SurfaceMsg::IconActivated),
            SurfaceCmd::None
        ));

        notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Never),
            &[],
        );
        let cmds = update(&mut model, SurfaceMsg::IconActivated).flatten();
        assert!(matches!(
            cmds.first(),
            Some(SurfaceCmd::DispatchRunMode(RunMode::Auto))
        ));
        assert_eq!(model.counters.run_mode_requests, 1);
    }

    #[test]
    fn run_mode_success_forces_exactly_one_refresh() {
        let mut model = attached(2000);
        let cmds = update(
            &mut model,
            SurfaceMsg::RunModeFinished {
                mode: RunMode::Auto,
                ok: true,
            },
        )
        .flatten();
        let refreshes = cmds
            .iter()
            .filter(|c| matches!(c, SurfaceCmd::ForceRefresh))
            .count();
        assert_eq!(refreshes, 1);
        assert!(!cmds.iter().any(|c| matches!(c, SurfaceCmd::Warn(_))));
    }

    #[test]
    fn run_mode_failure_warns_without_refresh_or_state_change() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Never),
            &[],
        );
        let before = model.displayed;

        let cmds = update(
            &mut model,
            SurfaceMsg::RunModeFinished {
                mode: RunMode::Auto,
                ok: false,
            },
        )
        .flatten();
        assert!(!cmds.iter().any(|c| matches!(c, SurfaceCmd::ForceRefresh)));
        assert!(cmds.iter().any(|c| matches!(c, SurfaceCmd::Warn(_))));
        assert_eq!(model.displayed, before);
        assert_eq!(model.counters.run_mode_failures, 1);
    }

    #[test]
    fn slide_selection_updates_current_layout() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(1200);
        notify(
            &mut model,
            &decider,
            StatusSnapshot::available(ComputingStatus::Computing),
            &[asset("A"), asset("B")],
        );

        let cmds = update(&mut model, SurfaceMsg::SlideSelected(1)).flatten();
        match cmds.first() {
            Some(SurfaceCmd::UpdateSlide(u)) => {
                assert_eq!(u.caption, "B");
                assert!(u.changed);
            }
            other => panic!("expected slide update, got {other:?}"),
        }
        let layout = model
            .current
            .as_ref()
            .and_then(RenderInstruction::slideshow)
            .expect("slideshow");
        assert_eq!(layout.selected(), 1);

        assert!(matches!(
            update(&mut model, SurfaceMsg::SlideSelected(9)),
            SurfaceCmd::None
        ));
    }

    #[test]
    fn probe_failure_is_logged_but_render_proceeds() {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let mut model = attached(2000);
        let mut charging = StatusSnapshot::suspended(SuspendReason::BatteryCharging);
        charging.preferences = Some(Preferences {
            battery_charge_min_pct: Some(80.0),
        });
        let cmds = notify(&mut model, &decider, charging, &[]);
        assert_eq!(renders(&cmds).len(), 1);
        assert!(cmds.iter().any(|c| matches!(
            c,
            SurfaceCmd::Log(ActivityEvent::BatteryProbeFailed { .. })
        )));
        assert_eq!(model.counters.probe_failures, 1);
    }
}
