//! RSASSA-PKCS1-v1_5 / SHA-256 signing of the firmware+client nonce
//! pair for `AdminSetup`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use rpc_protocol::{Result, RpcError};

/// Signs `firmware_nonce || client_nonce` with `key`, returning the
/// base64-encoded signature `AdminSetup` expects.
pub fn sign_nonce_pair(key: &RsaPrivateKey, firmware_nonce: &[u8], client_nonce: &[u8]) -> Result<String> {
    let mut message = Vec::with_capacity(firmware_nonce.len() + client_nonce.len());
    message.extend_from_slice(firmware_nonce);
    message.extend_from_slice(client_nonce);

    let digest = Sha256::digest(&message);
    let padding = Pkcs1v15Sign::new::<Sha256>();
    let signature = key
        .sign(padding, &digest)
        .map_err(|e| RpcError::Crypto(format!("signing nonce pair: {e}")))?;

    Ok(BASE64.encode(signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rsa::pkcs1v15::VerifyingKey;
    use rsa::signature::Verifier;

    #[test]
    fn signature_verifies_against_the_public_key() {
        let key = RsaPrivateKey::new(&mut OsRng, 1024).expect("test key");
        let sig_b64 = sign_nonce_pair(&key, b"firmware-nonce-20b", b"client-nonce-2000").unwrap();
        let sig_bytes = BASE64.decode(sig_b64).unwrap();

        let mut message = Vec::new();
        message.extend_from_slice(b"firmware-nonce-20b");
        message.extend_from_slice(b"client-nonce-2000");
        let digest = Sha256::digest(&message);

        let verifying_key = VerifyingKey::<Sha256>::new(key.to_public_key());
        let signature = rsa::pkcs1v15::Signature::try_from(sig_bytes.as_slice()).unwrap();
        assert!(verifying_key.verify(&digest, &signature).is_ok());
    }
}
