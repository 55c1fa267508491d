//! Component B: the application-protocol framer that turns the
//! driver's blocking byte channel into the SSH-style `direct-tcpip`
//! forwarding tunnel the "long" local transport rides on.

mod channel;
mod frame;
mod session;
mod wire;

pub use channel::ApfChannel;
pub use frame::{Inbound, Outbound};
pub use session::ApfSession;
