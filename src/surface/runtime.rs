//! Surface runtime: the single decision thread.
//!
//! User input and dispatcher completions arrive on one bounded channel;
//! change notifications have their own single-slot channel. Both are handled
//! to completion, one at a time, by the `cstat-surface` thread. Commands returned by [`update`] are executed here;
//! commands that produce new messages (`FetchStatus`, `Decide`) feed them back
//! through a local queue before the next channel message is taken, so a
//! decision is never interleaved with another.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, never, select_biased};

use crate::client::monitor::{BatteryProbe, ClientMonitor};
use crate::client::status::RunMode;
use crate::core::config::SlideshowConfig;
use crate::core::errors::{Result, StatusError};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::surface::decider::PresentationDecider;
use crate::surface::dispatcher::ActionDispatcher;
use crate::surface::instruction::RenderInstruction;
use crate::surface::model::{SurfaceCmd, SurfaceCounters, SurfaceModel, SurfaceMsg, needs_assets};
use crate::surface::slideshow::{SelectionUpdate, ViewportConstraints};
use crate::surface::update::update;

const CHANNEL_CAPACITY: usize = 64;

// ──────────────────── sink ────────────────────

/// View layer: applies instructions. Called only from the surface thread.
pub trait RenderSink: Send {
    fn render(&mut self, instruction: &RenderInstruction);
    fn update_slide(&mut self, update: &SelectionUpdate);
    fn warn(&mut self, message: &str);
}

// ──────────────────── config ────────────────────

#[derive(Debug, Clone)]
pub struct SurfaceRuntimeConfig {
    pub slideshow: SlideshowConfig,
    /// Hash of the loaded config, recorded on attach.
    pub config_hash: String,
    pub channel_capacity: usize,
}

impl Default for SurfaceRuntimeConfig {
    fn default() -> Self {
        Self {
            slideshow: SlideshowConfig::default(),
            config_hash: String::new(),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

// ──────────────────── handle ────────────────────

enum RuntimeMsg {
    Surface(SurfaceMsg),
    Shutdown,
}

/// Cloneable handle for feeding the surface thread.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: Sender<RuntimeMsg>,
    /// Single slot: a queued notify reads the status when it is taken.
    notify_tx: Sender<()>,
    slideshow: SlideshowConfig,
}

impl SurfaceHandle {
    /// Raise a change notification. Never blocks: a full slot means a
    /// notification is already pending and will read the latest status.
    pub fn notify(&self) -> bool {
        match self.notify_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn attach(&self, width: u32, height: u32) -> bool {
        let viewport = ViewportConstraints::new(width, height, &self.slideshow);
        self.send(SurfaceMsg::Attached { viewport })
    }

    pub fn detach(&self) -> bool {
        self.send(SurfaceMsg::Detached)
    }

    pub fn activate_icon(&self) -> bool {
        self.send(SurfaceMsg::IconActivated)
    }

    pub fn select_slide(&self, index: usize) -> bool {
        self.send(SurfaceMsg::SlideSelected(index))
    }

    /// Stop the surface thread after already-queued messages.
    pub fn shutdown(&self) {
        let _ = self.tx.send(RuntimeMsg::Shutdown);
    }

    fn send(&self, msg: SurfaceMsg) -> bool {
        self.tx.send(RuntimeMsg::Surface(msg)).is_ok()
    }
}

// ──────────────────── spawn ────────────────────

/// Spawn the surface thread and its action dispatcher.
///
/// The join handle yields the final counters once the thread exits.
pub fn spawn_surface(
    config: SurfaceRuntimeConfig,
    monitor: Arc<dyn ClientMonitor>,
    probe: Arc<dyn BatteryProbe>,
    sink: Box<dyn RenderSink>,
    logger: Option<ActivityLoggerHandle>,
) -> Result<(SurfaceHandle, thread::JoinHandle<SurfaceCounters>)> {
    let (tx, rx) = bounded::<RuntimeMsg>(config.channel_capacity.max(1));
    let (notify_tx, notify_rx) = bounded::<()>(1);

    let completion_tx = tx.clone();
    let dispatcher = ActionDispatcher::spawn(Arc::clone(&monitor), move |mode, ok| {
        let _ = completion_tx.send(RuntimeMsg::Surface(SurfaceMsg::RunModeFinished { mode, ok }));
    })?;

    let handle = SurfaceHandle {
        tx,
        notify_tx,
        slideshow: config.slideshow,
    };

    let mut runtime = SurfaceRuntime {
        model: SurfaceModel::new(ViewportConstraints::new(0, 0, &config.slideshow)),
        decider: PresentationDecider::new(probe),
        monitor,
        sink,
        logger,
        dispatcher: Some(dispatcher),
        config_hash: config.config_hash,
    };

    let join = thread::Builder::new()
        .name("cstat-surface".to_string())
        .spawn(move || {
            runtime.run(&rx, notify_rx);
            // Unblock a worker that is mid-completion before joining it.
            drop(rx);
            if let Some(dispatcher) = runtime.dispatcher.take() {
                dispatcher.shutdown();
            }
            runtime.model.counters
        })
        .map_err(|e| StatusError::Runtime {
            details: format!("failed to spawn surface thread: {e}"),
        })?;

    Ok((handle, join))
}

// ──────────────────── runtime ────────────────────

struct SurfaceRuntime {
    model: SurfaceModel,
    decider: PresentationDecider,
    monitor: Arc<dyn ClientMonitor>,
    sink: Box<dyn RenderSink>,
    logger: Option<ActivityLoggerHandle>,
    dispatcher: Option<ActionDispatcher>,
    config_hash: String,
}

impl SurfaceRuntime {
    fn run(&mut self, rx: &Receiver<RuntimeMsg>, mut notify_rx: Receiver<()>) {
        loop {
            // Queued input first, so a notify never overtakes an earlier detach.
            let (msg, pending) = select_biased! {
                recv(rx) -> msg => (Some(msg.ok()), None),
                recv(notify_rx) -> pending => (None, Some(pending.is_ok())),
            };
            match (msg, pending) {
                (Some(Some(RuntimeMsg::Surface(msg))), _) => self.process(msg),
                (Some(Some(RuntimeMsg::Shutdown) | None), _) => {
                    // A notify raised before shutdown still counts.
                    if notify_rx.try_recv().is_ok() {
                        self.notify();
                    }
                    break;
                }
                (None, Some(true)) => self.notify(),
                // Every handle is gone; keep serving completions.
                (None, _) => notify_rx = never(),
            }
        }
    }

    fn notify(&mut self) {
        if self.model.attached {
            let status = self.monitor.status();
            self.process(SurfaceMsg::StatusChanged(status));
        }
    }

    /// Handle one message and every message it causes, to completion.
    fn process(&mut self, first: SurfaceMsg) {
        let mut queue = VecDeque::from([first]);
        while let Some(msg) = queue.pop_front() {
            if let SurfaceMsg::Attached { viewport } = &msg {
                self.log(ActivityEvent::SurfaceAttached {
                    width: viewport.width,
                    height: viewport.height,
                    config_hash: self.config_hash.clone(),
                });
            }
            for cmd in update(&mut self.model, msg).flatten() {
                if let Some(next) = self.execute(cmd) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn execute(&mut self, cmd: SurfaceCmd) -> Option<SurfaceMsg> {
        match cmd {
            SurfaceCmd::None | SurfaceCmd::Batch(_) => None,
            SurfaceCmd::FetchStatus => Some(SurfaceMsg::StatusChanged(self.monitor.status())),
            SurfaceCmd::Decide(status) => {
                let assets = if needs_assets(&status) {
                    self.monitor.slideshow_assets()
                } else {
                    Vec::new()
                };
                let (instruction, probe_error) =
                    self.decider
                        .decide_traced(&status, &self.model.viewport, &assets);
                Some(SurfaceMsg::Decided {
                    status: *status,
                    instruction: Box::new(instruction),
                    probe_error,
                })
            }
            SurfaceCmd::Render(instruction) => {
                self.sink.render(&instruction);
                None
            }
            SurfaceCmd::UpdateSlide(selection) => {
                self.sink.update_slide(&selection);
                None
            }
            SurfaceCmd::DispatchRunMode(mode) => self.dispatch(mode),
            SurfaceCmd::ForceRefresh => {
                self.monitor.force_refresh();
                None
            }
            SurfaceCmd::Warn(message) => {
                self.sink.warn(&message);
                None
            }
            SurfaceCmd::Log(event) => {
                self.log(event);
                None
            }
        }
    }

    /// Hand the request to the worker. A refused request completes as a
    /// failure right away so the user gets the same notice.
    fn dispatch(&self, mode: RunMode) -> Option<SurfaceMsg> {
        let queued = self
            .dispatcher
            .as_ref()
            .is_some_and(|dispatcher| dispatcher.dispatch(mode));
        (!queued).then_some(SurfaceMsg::RunModeFinished { mode, ok: false })
    }

    fn log(&self, event: ActivityEvent) {
        if let Some(logger) = &self.logger {
            logger.send(event);
        }
    }
}
