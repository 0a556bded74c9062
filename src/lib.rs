#![forbid(unsafe_code)]

//! compute_status: status surface for a volunteer-computing client.
//!
//! The surface turns the client's status snapshots into render instructions:
//! 1. **Change gate**: suppresses re-renders when nothing observable changed
//! 2. **Presentation decider**: one instruction per computing status and suspend reason
//! 3. **Slideshow selector**: project slides on tall enough screens
//! 4. **Action dispatcher**: the single "resume computing" action, off-thread
//!
//! # Library usage
//!
//! ```rust,no_run
//! use compute_status::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use compute_status::core::config::Config;
//! use compute_status::surface::gate::{DisplayedState, should_render};
//! ```

pub mod prelude;

pub mod client;
pub mod core;
pub mod daemon;
pub mod logger;
pub mod surface;
