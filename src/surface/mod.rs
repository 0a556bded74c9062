//! Status surface: change gate, presentation decision, slideshow selection
//! and the run-mode action, driven by one serial runtime thread.

#![allow(missing_docs)]

pub mod decider;
pub mod dispatcher;
pub mod gate;
pub mod instruction;
pub mod model;
pub mod runtime;
pub mod slideshow;
pub mod update;

#[cfg(test)]
mod test_properties;

pub use decider::PresentationDecider;
pub use instruction::RenderInstruction;
pub use runtime::{RenderSink, SurfaceHandle, SurfaceRuntimeConfig, spawn_surface};
