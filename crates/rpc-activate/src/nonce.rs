//! Client nonce generation for the ACM host-based-setup handshake.

use rand::rngs::OsRng;
use rand::RngCore;

pub const NONCE_LEN: usize = 20;

/// A fresh 20-byte nonce from the OS's cryptographically secure RNG.
pub fn generate_client_nonce() -> [u8; NONCE_LEN] {
    let mut bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonces_are_not_trivially_repeated() {
        let a = generate_client_nonce();
        let b = generate_client_nonce();
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_has_expected_length() {
        assert_eq!(generate_client_nonce().len(), NONCE_LEN);
    }
}
