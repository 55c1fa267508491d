//! Component E: the relay state machine that couples the remote
//! provisioning-server transport (D) to the local management-engine
//! transport (C) for the duration of one command.

mod jumbling;
mod state;

pub use jumbling::JumbleGuard;
pub use state::{RelaySession, RelayState};
