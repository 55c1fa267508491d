//! Component H: deactivation, dispatched by the device's current
//! control mode. CCM unprovisions directly through the driver; ACM
//! goes through the WS-Management `Unprovision` method instead, since
//! admin-mode deactivation is itself a management operation the
//! firmware expects over that interface.

use rpc_driver::{ControlMode, DriverOps};
use rpc_local::LocalManager;
use rpc_protocol::{Operation, Result, RpcError};

use crate::wsman;

pub fn deactivate(
    driver: &mut dyn DriverOps,
    local: &mut LocalManager,
    current_mode: ControlMode,
) -> Result<()> {
    match current_mode {
        ControlMode::Unprovisioned => Err(RpcError::Mode {
            operation: Operation::Deactivate,
            message: "device is not provisioned, nothing to deactivate".into(),
        }),
        ControlMode::ClientControlMode => {
            let status = driver.unprovision()?;
            if status != 0 {
                return Err(RpcError::Deactivation(format!(
                    "driver unprovision returned non-zero status {status}"
                )));
            }
            Ok(())
        }
        ControlMode::AdminControlMode => {
            // A transport-level failure here means the firmware's
            // WS-Management endpoint never answered; the original
            // client treats that as "unable to deactivate" rather than
            // a generic transport error, reserving DeactivationFailed
            // for a successful round-trip with a bad response.
            let response = local.post_wsman(&wsman::unprovision(1)).map_err(|e| RpcError::Mode {
                operation: Operation::Deactivate,
                message: format!("posting Unprovision to the device failed: {e}"),
            })?;
            let rv = wsman::extract_return_value(&response).unwrap_or(-1);
            if rv != 0 {
                return Err(RpcError::Deactivation(format!(
                    "SetupAndConfigurationService.Unprovision returned non-zero status {rv}"
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_driver::FakeDriver;

    #[test]
    fn unprovisioned_mode_is_rejected() {
        let mut driver = FakeDriver::new();
        let mut local = LocalManager::Short(rpc_local::ShortTransport::new(
            "127.0.0.1:1".into(),
            "u".into(),
            "p".into(),
        ));
        let err = deactivate(&mut driver, &mut local, ControlMode::Unprovisioned).unwrap_err();
        assert!(matches!(err, RpcError::Mode { .. }));
    }

    #[test]
    fn ccm_failure_status_surfaces_as_deactivation_failed() {
        let mut driver = FakeDriver::new();
        driver.unprovision_result = 1;
        let mut local = LocalManager::Short(rpc_local::ShortTransport::new(
            "127.0.0.1:1".into(),
            "u".into(),
            "p".into(),
        ));
        let err = deactivate(&mut driver, &mut local, ControlMode::ClientControlMode).unwrap_err();
        assert!(matches!(err, RpcError::Deactivation(_)));
    }

    #[test]
    fn acm_transport_failure_maps_to_unable_to_deactivate() {
        let mut driver = FakeDriver::new();
        // Port 1 refuses the connection, so post_wsman fails at the
        // transport layer rather than returning a parsed response.
        let mut local = LocalManager::Short(rpc_local::ShortTransport::new(
            "127.0.0.1:1".into(),
            "u".into(),
            "p".into(),
        ));
        let err = deactivate(&mut driver, &mut local, ControlMode::AdminControlMode).unwrap_err();
        assert!(matches!(err, RpcError::Mode { operation: Operation::Deactivate, .. }));
        assert_eq!(err.code(), rpc_protocol::ResultCode::UnableToDeactivate);
    }
}
