//! Decodes the base64 PKCS#12 provisioning-certificate bundle and
//! orders its chain the way the firmware expects: leaf first,
//! intermediates in decoder order, self-signed root last.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use rpc_protocol::{Result, RpcError};

/// A decoded, ordered certificate chain plus the signing key that goes
/// with the leaf. The private key is zeroized on drop by `RsaPrivateKey`
/// itself; we additionally zeroize the raw PKCS#8 bytes once parsed.
pub struct CertificateBundle {
    /// DER bytes, ordered leaf -> intermediates -> root.
    pub chain_der: Vec<Vec<u8>>,
    pub private_key: RsaPrivateKey,
    pub root_fingerprint: [u8; 32],
}

impl CertificateBundle {
    /// `bundle_b64` is the base64-encoded PKCS#12 file; `passphrase`
    /// decrypts it.
    pub fn decode(bundle_b64: &str, passphrase: &str) -> Result<Self> {
        let der = BASE64
            .decode(bundle_b64.trim())
            .map_err(|e| RpcError::Crypto(format!("base64 decode of provisioning cert: {e}")))?;

        let pfx = p12::PFX::parse(&der)
            .ok_or_else(|| RpcError::Crypto("malformed PKCS#12 bundle".into()))?;

        let cert_ders = pfx
            .cert_bags(passphrase)
            .map_err(|_| RpcError::Crypto("decrypting provisioning certificate failed".into()))?;
        let mut key_ders = pfx
            .key_bags(passphrase)
            .map_err(|_| RpcError::Crypto("decrypting provisioning certificate failed".into()))?;

        if cert_ders.is_empty() {
            return Err(RpcError::Crypto(
                "provisioning certificate bundle has no certificates".into(),
            ));
        }
        let mut key_der = key_ders
            .pop()
            .ok_or_else(|| RpcError::Crypto("provisioning certificate bundle has no private key".into()))?;

        let private_key = RsaPrivateKey::from_pkcs8_der(&key_der)
            .map_err(|e| RpcError::Crypto(format!("parsing provisioning private key: {e}")))?;
        key_der.zeroize();

        // PKCS#12 decoders conventionally return the end-entity
        // certificate first; whatever remains sorts into intermediates
        // and the self-signed root. Verify position 0 is actually a
        // leaf rather than trusting decoder ordering blindly: a bundle
        // that puts the root first would otherwise be accepted with no
        // end-entity certificate at all.
        let (_, leaf_parsed) = x509_parser::parse_x509_certificate(&cert_ders[0])
            .map_err(|e| RpcError::Crypto(format!("parsing leaf certificate: {e}")))?;
        if leaf_parsed.subject() == leaf_parsed.issuer() {
            return Err(RpcError::Crypto(
                "provisioning certificate bundle has no leaf certificate (first entry is self-signed)".into(),
            ));
        }
        let leaf = cert_ders[0].clone();
        let mut intermediates = Vec::new();
        let mut root = None;

        for der in &cert_ders[1..] {
            let (_, parsed) = x509_parser::parse_x509_certificate(der)
                .map_err(|e| RpcError::Crypto(format!("parsing chain certificate: {e}")))?;
            if parsed.subject() == parsed.issuer() {
                root = Some(der.clone());
            } else {
                intermediates.push(der.clone());
            }
        }

        let root = root.ok_or_else(|| {
            RpcError::Crypto("provisioning certificate chain has no self-signed root".into())
        })?;
        let root_fingerprint: [u8; 32] = Sha256::digest(&root).into();

        let mut chain_der = Vec::with_capacity(2 + intermediates.len());
        chain_der.push(leaf);
        chain_der.extend(intermediates);
        chain_der.push(root);

        Ok(Self {
            chain_der,
            private_key,
            root_fingerprint,
        })
    }

    pub fn is_leaf(&self, index: usize) -> bool {
        index == 0
    }

    pub fn is_root(&self, index: usize) -> bool {
        index == self.chain_der.len() - 1
    }

    /// Base64-of-DER, with no `-----BEGIN/END-----` framing, as AMT's
    /// `AddNextCertInChain` expects.
    pub fn pem_body(der: &[u8]) -> String {
        BASE64.encode(der)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base64() {
        let err = CertificateBundle::decode("not base64!!", "pw").unwrap_err();
        matches!(err, RpcError::Crypto(_));
    }

    #[test]
    fn leaf_and_root_positions() {
        // A bundle with 3 chain entries: leaf, intermediate, root.
        struct Stub;
        let chain_der = vec![vec![1], vec![2], vec![3]];
        let _ = Stub; // silence unused warning; bundle is constructed manually below
        let bundle = CertificateBundle {
            chain_der,
            private_key: test_key(),
            root_fingerprint: [0u8; 32],
        };
        assert!(bundle.is_leaf(0));
        assert!(!bundle.is_leaf(1));
        assert!(bundle.is_root(2));
        assert!(!bundle.is_root(1));
    }

    fn test_key() -> RsaPrivateKey {
        use rand::rngs::OsRng;
        RsaPrivateKey::new(&mut OsRng, 512).expect("tiny test key")
    }

    #[test]
    fn pem_body_is_plain_base64() {
        let body = CertificateBundle::pem_body(&[1, 2, 3]);
        assert!(!body.contains("BEGIN"));
        assert_eq!(body, BASE64.encode([1, 2, 3]));
    }
}
