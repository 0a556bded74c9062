//! Property-based tests for gate, decider and reducer invariants.

use std::sync::Arc;

use proptest::prelude::*;

use super::decider::PresentationDecider;
use super::gate::{self, DisplayedState, GateVerdict};
use super::model::{SurfaceCmd, SurfaceModel, SurfaceMsg};
use super::slideshow::ViewportConstraints;
use super::update::update;
use crate::client::monitor::{FixedBattery, NoBattery};
use crate::client::status::{
    ComputingStatus, ImageHandle, Preferences, SetupStatus, SlideshowAsset, StatusSnapshot,
    SuspendReason,
};
use crate::core::config::SlideshowConfig;

// ──────────────────── strategies ────────────────────

fn arb_setup() -> impl Strategy<Value = SetupStatus> {
    prop_oneof![
        3 => Just(SetupStatus::Available),
        1 => Just(SetupStatus::NotAvailable),
        1 => Just(SetupStatus::Error),
        1 => Just(SetupStatus::NoProjects),
    ]
}

fn arb_computing() -> impl Strategy<Value = ComputingStatus> {
    prop::sample::select(ComputingStatus::ALL.to_vec())
}

fn arb_reason() -> impl Strategy<Value = SuspendReason> {
    prop_oneof![
        4 => prop::sample::select(SuspendReason::KNOWN.to_vec()),
        1 => (5000i32..6000).prop_map(SuspendReason::Unknown),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    (
        arb_setup(),
        arb_computing(),
        arb_reason(),
        proptest::option::of(arb_reason()),
        proptest::option::of(proptest::option::of(0.0f64..100.0)),
    )
        .prop_map(|(setup, computing, reason, network, min)| StatusSnapshot {
            setup_status: setup,
            computing_status: computing,
            computing_suspend_reason: reason,
            network_suspend_reason: network,
            preferences: min.map(|battery_charge_min_pct| Preferences {
                battery_charge_min_pct,
            }),
        })
}

fn arb_viewport() -> impl Strategy<Value = ViewportConstraints> {
    (0u32..2500, 500u32..1500, 500u32..1500).prop_map(|(height, slideshow, image)| {
        ViewportConstraints::new(
            720,
            height,
            &SlideshowConfig {
                min_height_for_slideshow: slideshow,
                min_height_for_image: image,
                caption_bottom_padding_px: 5,
            },
        )
    })
}

fn assets(n: usize) -> Vec<SlideshowAsset> {
    (0..n)
        .map(|i| SlideshowAsset::new(format!("P{i}"), ImageHandle::new(format!("p{i}"), vec![0u8])))
        .collect()
}

// ──────────────────── gate ────────────────────

proptest! {
    #[test]
    fn gate_is_total_and_resets_on_unavailable(
        prev_status in proptest::option::of(arb_computing()),
        prev_reason in proptest::option::of(arb_reason()),
        snap in arb_snapshot(),
    ) {
        let mut displayed = DisplayedState {
            last_computing_status: prev_status,
            last_suspend_reason: prev_reason,
        };
        let verdict = gate::admit(&mut displayed, &snap);
        if snap.setup_status.is_available() {
            prop_assert_ne!(verdict, GateVerdict::Unavailable);
        } else {
            prop_assert_eq!(verdict, GateVerdict::Unavailable);
            prop_assert_eq!(displayed, DisplayedState::UNINITIALIZED);
        }
    }

    #[test]
    fn recorded_snapshot_is_never_rendered_twice(snap in arb_snapshot()) {
        prop_assume!(snap.setup_status.is_available());
        let mut displayed = DisplayedState::UNINITIALIZED;
        prop_assert_eq!(gate::evaluate(&displayed, &snap), GateVerdict::Render);
        displayed.record(&snap);
        prop_assert_eq!(gate::evaluate(&displayed, &snap), GateVerdict::Unchanged);
    }

    #[test]
    fn suspend_reason_change_always_renders(a in arb_reason(), b in arb_reason()) {
        prop_assume!(a != b);
        let mut displayed = DisplayedState::UNINITIALIZED;
        displayed.record(&StatusSnapshot::suspended(a));
        prop_assert!(gate::should_render(&displayed, &StatusSnapshot::suspended(b)));
    }

    #[test]
    fn status_change_always_renders(
        a in arb_computing(),
        b in arb_computing(),
        reason in arb_reason(),
    ) {
        prop_assume!(a != b);
        let mut before = StatusSnapshot::available(a);
        before.computing_suspend_reason = reason;
        let mut displayed = DisplayedState::UNINITIALIZED;
        displayed.record(&before);
        prop_assert!(gate::should_render(&displayed, &StatusSnapshot::available(b)));
    }
}

// ──────────────────── decider ────────────────────

proptest! {
    #[test]
    fn decide_is_idempotent_and_status_preserving(
        snap in arb_snapshot(),
        viewport in arb_viewport(),
        n in 0usize..4,
        battery in 0u8..=100,
    ) {
        let decider = PresentationDecider::new(Arc::new(FixedBattery(battery)));
        let assets = assets(n);
        let a = decider.decide(&snap, &viewport, &assets);
        let b = decider.decide(&snap, &viewport, &assets);
        prop_assert_eq!(a.computing_status(), snap.computing_status);
        prop_assert_eq!(&a, &b);
    }

    #[test]
    fn slideshow_only_when_computing_on_tall_screen(
        snap in arb_snapshot(),
        viewport in arb_viewport(),
        n in 0usize..4,
    ) {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let out = decider.decide(&snap, &viewport, &assets(n));
        let expected = snap.computing_status == ComputingStatus::Computing
            && viewport.allows_slideshow()
            && n > 0;
        prop_assert_eq!(out.slideshow().is_some(), expected);
    }

    #[test]
    fn only_never_is_clickable(snap in arb_snapshot(), viewport in arb_viewport()) {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let out = decider.decide(&snap, &viewport, &assets(1));
        prop_assert_eq!(
            out.icon_action().is_some(),
            snap.computing_status == ComputingStatus::Never
        );
    }
}

// ──────────────────── reducer ────────────────────

#[derive(Debug, Clone)]
enum Step {
    Attach(u32),
    Detach,
    Status(StatusSnapshot),
    Click,
    Select(usize),
    Finished(bool),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => (0u32..2000).prop_map(Step::Attach),
        1 => Just(Step::Detach),
        6 => arb_snapshot().prop_map(Step::Status),
        1 => Just(Step::Click),
        1 => (0usize..4).prop_map(Step::Select),
        1 => any::<bool>().prop_map(Step::Finished),
    ]
}

proptest! {
    #[test]
    fn reducer_sequences_keep_invariants(steps in prop::collection::vec(arb_step(), 1..60)) {
        let decider = PresentationDecider::new(Arc::new(NoBattery));
        let assets = assets(2);
        let mut model = SurfaceModel::default();

        for step in steps {
            let before = model.counters;
            let msg = match step {
                Step::Attach(h) => SurfaceMsg::Attached {
                    viewport: ViewportConstraints::new(720, h, &SlideshowConfig::default()),
                },
                Step::Detach => SurfaceMsg::Detached,
                Step::Status(s) => SurfaceMsg::StatusChanged(s),
                Step::Click => SurfaceMsg::IconActivated,
                Step::Select(i) => SurfaceMsg::SlideSelected(i),
                Step::Finished(ok) => SurfaceMsg::RunModeFinished {
                    mode: crate::client::status::RunMode::Auto,
                    ok,
                },
            };

            let mut refreshes = 0;
            for cmd in update(&mut model, msg).flatten() {
                match cmd {
                    SurfaceCmd::Decide(status) => {
                        prop_assert!(model.attached);
                        prop_assert!(status.setup_status.is_available());
                        let instruction = decider.decide(&status, &model.viewport, &assets);
                        let rendered = update(
                            &mut model,
                            SurfaceMsg::Decided {
                                status: (*status).clone(),
                                instruction: Box::new(instruction),
                                probe_error: None,
                            },
                        );
                        prop_assert!(matches!(rendered, SurfaceCmd::Batch(_)));
                        prop_assert_eq!(
                            model.displayed.last_computing_status,
                            Some(status.computing_status)
                        );
                    }
                    SurfaceCmd::ForceRefresh => refreshes += 1,
                    SurfaceCmd::Render(_) => prop_assert!(false, "render before decide"),
                    _ => {}
                }
            }
            prop_assert!(refreshes <= 1);

            let after = model.counters;
            prop_assert!(after.notifications >= before.notifications);
            prop_assert!(after.renders >= before.renders);
            prop_assert!(after.suppressed >= before.suppressed);
            if !model.attached {
                prop_assert!(model.current.is_none());
            }
        }
    }
}
