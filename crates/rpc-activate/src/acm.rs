//! Component F: admin control mode activation.
//!
//! Ten steps against the local management-engine interface: verify
//! the device is unprovisioned, read its local-system account, decode
//! and order the operator's PKCS#12 provisioning bundle, check its
//! root against AMT's trusted-root list, fetch the digest realm and
//! firmware nonce, stream the ordered chain into
//! `AddNextCertInChain`, then sign a freshly generated client nonce
//! and hand it all to `AdminSetup`.

use rpc_driver::ControlMode;
use rpc_local::LocalManager;
use rpc_protocol::{Operation, Result, RpcError};

use crate::cert::CertificateBundle;
use crate::nonce::generate_client_nonce;
use crate::sign::sign_nonce_pair;
use crate::wsman;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Runs the full ACM activation handshake over `local`, using
/// `current_mode` (already read by the caller) and the operator's
/// provisioning bundle.
pub fn activate(
    local: &mut LocalManager,
    current_mode: ControlMode,
    amt_password: &str,
    provisioning_cert_b64: &str,
    provisioning_cert_passphrase: &str,
) -> Result<()> {
    if current_mode != ControlMode::Unprovisioned {
        return Err(RpcError::Mode {
            operation: Operation::Activate,
            message: format!(
                "device is already in {}, cannot activate",
                current_mode.describe()
            ),
        });
    }

    let bundle = CertificateBundle::decode(provisioning_cert_b64, provisioning_cert_passphrase)?;

    let trusted_roots_xml = local.post_wsman(&wsman::get_trusted_root_certificates())?;
    let trusted_fingerprints = wsman::extract_all_fields(&trusted_roots_xml, "X509Fingerprint");
    let root_fingerprint_hex = hex::encode(bundle.root_fingerprint);
    if !trusted_fingerprints
        .iter()
        .any(|fp| fp.eq_ignore_ascii_case(&root_fingerprint_hex))
    {
        return Err(RpcError::Crypto(
            "provisioning certificate root is not in the device's trusted root list".into(),
        ));
    }

    let general_settings_xml = local.post_wsman(&wsman::get_general_settings())?;
    let digest_realm = wsman::extract_field(&general_settings_xml, "DigestRealm")
        .ok_or_else(|| RpcError::Protocol("GeneralSettings response missing DigestRealm".into()))?;

    let hostbased_xml = local.post_wsman(&wsman::get_host_based_setup_service())?;
    let firmware_nonce_b64 = wsman::extract_field(&hostbased_xml, "ConfigurationNonce")
        .ok_or_else(|| RpcError::Protocol("HostBasedSetupService response missing ConfigurationNonce".into()))?;
    let firmware_nonce = BASE64
        .decode(firmware_nonce_b64.trim())
        .map_err(|e| RpcError::Protocol(format!("decoding firmware nonce: {e}")))?;

    let chain_len = bundle.chain_der.len();
    for (index, der) in bundle.chain_der.iter().enumerate() {
        let body = CertificateBundle::pem_body(der);
        let is_leaf = bundle.is_leaf(index);
        let is_root = index == chain_len - 1;
        let response = local.post_wsman(&wsman::add_next_cert_in_chain(&body, is_leaf, is_root))?;
        let rv = wsman::extract_return_value(&response).unwrap_or(-1);
        if rv != 0 {
            return Err(RpcError::Activation(format!(
                "AddNextCertInChain failed for chain entry {index} with return value {rv}"
            )));
        }
    }

    let client_nonce = generate_client_nonce();
    let signature_b64 = sign_nonce_pair(&bundle.private_key, &firmware_nonce, &client_nonce)?;
    let client_nonce_b64 = BASE64.encode(client_nonce);

    let admin_setup_xml = local.post_wsman(&wsman::admin_setup(
        &digest_realm,
        amt_password,
        &client_nonce_b64,
        &signature_b64,
    ))?;
    let rv = wsman::extract_return_value(&admin_setup_xml).unwrap_or(-1);
    if rv != 0 {
        return Err(RpcError::Activation(format!(
            "AdminSetup returned non-zero status {rv}"
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
        let err = activate(
            &mut local,
            ControlMode::AdminControlMode,
            "pw",
            "",
            "",
        )
        .unwrap_err();
        assert!(matches!(err, RpcError::Mode { .. }));
    }
}
