//! Background plumbing for `cstat watch`: the change poller and signal flags.

pub mod poller;
#[cfg(feature = "watch")]
pub mod signals;
