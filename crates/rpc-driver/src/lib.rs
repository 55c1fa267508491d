//! Component A: the driver channel — a blocking, message-oriented
//! handle to the local management-engine driver (HECI/MEI), plus the
//! small set of AMT local commands (`GetControlMode`,
//! `GetLocalSystemAccount`, `Unprovision`) that ride over the same
//! device handle.
//!
//! The HECI device itself is an external collaborator (kernel driver);
//! this crate only owns the Rust-side open/read/write/close handle to
//! it, modeled as a `DriverOps` capability trait so tests can swap in
//! a fake — the same pattern the teacher uses for `NodeTool` handlers
//! substituted into a `ToolRegistry` at construction time.

mod control_mode;
mod fake;
mod heci;

pub use control_mode::ControlMode;
pub use fake::FakeDriver;
pub use heci::HeciDriver;

use rpc_protocol::Result;

/// The local-system account credentials used to authenticate the
/// loopback WS-Management endpoint for local activation.
#[derive(Debug, Clone)]
pub struct LocalSystemAccount {
    pub username: String,
    pub password: String,
}

/// Capability interface over the driver channel. Implementations are
/// blocking; callers on the async relay/activation paths run these
/// inside `tokio::task::spawn_blocking`.
pub trait DriverOps: Send + Sync {
    /// Open the device. `use_long_lived` selects whether the caller
    /// intends to keep the handle open for an APF-forwarded session
    /// (`true`) or a single request/response (`false`); real HECI
    /// devices don't care, but the flag is threaded through so a fake
    /// can assert on caller intent.
    fn init(&mut self, use_long_lived: bool) -> Result<()>;

    /// Maximum message length the driver will accept in one `send`.
    fn buffer_size(&self) -> u32;

    /// Write one message; returns the number of bytes written.
    fn send(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read one message into `out`; returns the number of bytes read.
    fn recv(&mut self, out: &mut [u8]) -> Result<usize>;

    fn close(&mut self);

    /// Current AMT control mode (0 = unprovisioned, 1 = CCM, 2 = ACM).
    fn get_control_mode(&mut self) -> Result<ControlMode>;

    /// Local-system account used for HTTP digest auth against the
    /// loopback WS-Management endpoint.
    fn get_local_system_account(&mut self) -> Result<LocalSystemAccount>;

    /// Unprovision (CCM deactivation path). Returns the firmware's
    /// numeric status; the caller maps non-zero to `DeactivationFailed`.
    fn unprovision(&mut self) -> Result<u32>;
}
