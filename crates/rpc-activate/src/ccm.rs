//! Component G: client control mode activation. Much smaller than the
//! ACM path — no certificate chain, no signing, just a digest realm
//! and a single `HostBasedSetup.Setup` call.

use rpc_driver::ControlMode;
use rpc_local::LocalManager;
use rpc_protocol::{Operation, Result, RpcError};

use crate::wsman;

pub fn activate(local: &mut LocalManager, current_mode: ControlMode, amt_password: &str) -> Result<()> {
    if current_mode != ControlMode::Unprovisioned {
        return Err(RpcError::Mode {
            operation: Operation::Activate,
            message: format!(
                "device is already in {}, cannot activate",
                current_mode.describe()
            ),
        });
    }

    let general_settings_xml = local.post_wsman(&wsman::get_general_settings())?;
    let digest_realm = wsman::extract_field(&general_settings_xml, "DigestRealm")
        .ok_or_else(|| RpcError::Protocol("GeneralSettings response missing DigestRealm".into()))?;

    let setup_xml = local.post_wsman(&wsman::host_based_setup(&digest_realm, amt_password))?;
    let rv = wsman::extract_return_value(&setup_xml).unwrap_or(-1);
    if rv != 0 {
        return Err(RpcError::Activation(format!(
            "HostBasedSetup.Setup returned non-zero status {rv}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_when_not_unprovisioned() {
        let mut local = LocalManager::Short(rpc_local::ShortTransport::new(
            "127.0.0.1:1".into(),
            "u".into(),
            "p".into(),
        ));
        let err = activate(&mut local, ControlMode::ClientControlMode, "pw").unwrap_err();
        assert!(matches!(err, RpcError::Mode { .. }));
    }
}
