//! Components F, G, H: the activation and deactivation engines.
//!
//! Each engine takes an already-connected [`rpc_local::LocalManager`]
//! (and, for deactivation, the driver handle) and the control mode the
//! caller already read — neither engine re-reads it, so callers can
//! report a consistent mode in logs even if it's read once up front.

mod acm;
mod ccm;
mod cert;
mod deactivate;
mod nonce;
mod sign;
mod wsman;

pub use cert::CertificateBundle;
pub use nonce::{generate_client_nonce, NONCE_LEN};

use rpc_driver::{ControlMode, DriverOps};
use rpc_local::LocalManager;
use rpc_protocol::Result;

/// Runs CCM or ACM activation depending on `acm_bundle`: `Some` runs
/// the admin-mode handshake against the supplied provisioning
/// certificate, `None` runs the simpler client-mode handshake.
pub fn activate(
    local: &mut LocalManager,
    current_mode: ControlMode,
    amt_password: &str,
    acm_bundle: Option<(&str, &str)>,
) -> Result<()> {
    match acm_bundle {
        Some((provisioning_cert_b64, provisioning_cert_passphrase)) => acm::activate(
            local,
            current_mode,
            amt_password,
            provisioning_cert_b64,
            provisioning_cert_passphrase,
        ),
        None => ccm::activate(local, current_mode, amt_password),
    }
}

/// Runs the deactivation engine, dispatching by `current_mode`.
pub fn deactivate(
    driver: &mut dyn DriverOps,
    local: &mut LocalManager,
    current_mode: ControlMode,
) -> Result<()> {
    deactivate::deactivate(driver, local, current_mode)
}
