//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use compute_status::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, StatusError};

// Client
pub use crate::client::battery::SysfsBatteryProbe;
pub use crate::client::monitor::{BatteryProbe, ClientMonitor, FixedBattery, NoBattery};
pub use crate::client::state_file::StateFileMonitor;
pub use crate::client::status::{
    ComputingStatus, ImageHandle, Preferences, RunMode, SetupStatus, SlideshowAsset,
    StatusSnapshot, SuspendReason,
};

// Surface
pub use crate::surface::decider::PresentationDecider;
pub use crate::surface::gate::{DisplayedState, GateVerdict};
pub use crate::surface::instruction::{Icon, MessageKey, RenderInstruction, Text};
pub use crate::surface::runtime::{RenderSink, SurfaceHandle, SurfaceRuntimeConfig, spawn_surface};
pub use crate::surface::slideshow::{SelectionUpdate, SlideshowLayout, ViewportConstraints};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
