//! Compute-client side: status model, collaborator contracts, and the
//! file/sysfs adapters used by the `cstat` binary.

pub mod battery;
pub mod monitor;
pub mod state_file;
pub mod status;
