//! HTTP Digest authentication (RFC 7616, `MD5` algorithm — what the AMT
//! firmware's embedded web server speaks) against the local-system
//! account. Shared by both the short (raw TCP) and long (APF-tunneled)
//! transport variants, since both carry the same WS-Management request
//! bytes, just over a different pipe.

use md5::{Digest, Md5};
use rand::RngCore;

use rpc_protocol::{Result, RpcError};

/// Parameters parsed out of a `WWW-Authenticate: Digest ...` header.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
}

impl DigestChallenge {
    /// Parses the header value following `Digest `.
    pub fn parse(header_value: &str) -> Result<Self> {
        let body = header_value
            .trim()
            .strip_prefix("Digest ")
            .ok_or_else(|| RpcError::Protocol("WWW-Authenticate is not a Digest challenge".into()))?;

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut opaque = None;

        for part in split_digest_params(body) {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            match key {
                "realm" => realm = Some(value.to_string()),
                "nonce" => nonce = Some(value.to_string()),
                "qop" => qop = Some(value.to_string()),
                "opaque" => opaque = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm.ok_or_else(|| RpcError::Protocol("digest challenge missing realm".into()))?,
            nonce: nonce.ok_or_else(|| RpcError::Protocol("digest challenge missing nonce".into()))?,
            qop,
            opaque,
        })
    }
}

/// Splits on commas that are not inside a quoted string.
fn split_digest_params(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}

fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    hex::encode(digest)
}

/// Builds the `Authorization: Digest ...` header value for one request.
/// Uses `qop=auth` with a freshly generated client nonce when the
/// server advertised `qop`; falls back to the legacy RFC 2069 form
/// otherwise, matching what AMT's embedded server accepts.
pub fn authorization_header(
    challenge: &DigestChallenge,
    username: &str,
    password: &str,
    method: &str,
    uri: &str,
) -> String {
    let ha1 = md5_hex(&format!("{username}:{}:{password}", challenge.realm));
    let ha2 = md5_hex(&format!("{method}:{uri}"));

    if challenge.qop.is_some() {
        let cnonce = client_nonce_hex();
        let nc = "00000001";
        let response = md5_hex(&format!(
            "{ha1}:{}:{nc}:{cnonce}:auth:{ha2}",
            challenge.nonce
        ));
        let mut header = format!(
            "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", \
             qop=auth, nc={nc}, cnonce=\"{cnonce}\", response=\"{response}\"",
            challenge.realm, challenge.nonce
        );
        if let Some(opaque) = &challenge.opaque {
            header.push_str(&format!(", opaque=\"{opaque}\""));
        }
        header
    } else {
        let response = md5_hex(&format!("{ha1}:{}:{ha2}", challenge.nonce));
        format!(
            "Digest username=\"{username}\", realm=\"{}\", nonce=\"{}\", uri=\"{uri}\", response=\"{response}\"",
            challenge.realm, challenge.nonce
        )
    }
}

fn client_nonce_hex() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_challenge_with_qop() {
        let header = r#"Digest realm="Digest:A3D5D5FB4576A6BF7D2DA90B7F", nonce="lu1PiCiSAAAAAAAAzUgwMs/O1bk=", qop="auth", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;
        let challenge = DigestChallenge::parse(header).unwrap();
        assert_eq!(challenge.realm, "Digest:A3D5D5FB4576A6BF7D2DA90B7F");
        assert_eq!(challenge.qop.as_deref(), Some("auth"));
        assert!(challenge.opaque.is_some());
    }

    #[test]
    fn rejects_non_digest_header() {
        assert!(DigestChallenge::parse("Basic realm=\"x\"").is_err());
    }

    #[test]
    fn builds_legacy_header_without_qop() {
        let challenge = DigestChallenge {
            realm: "realm".into(),
            nonce: "nonce".into(),
            qop: None,
            opaque: None,
        };
        let header = authorization_header(&challenge, "admin", "pw", "POST", "/wsman");
        assert!(header.contains("response=\""));
        assert!(!header.contains("qop="));
    }

    #[test]
    fn builds_qop_header_with_nc_and_cnonce() {
        let challenge = DigestChallenge {
            realm: "realm".into(),
            nonce: "nonce".into(),
            qop: Some("auth".into()),
            opaque: None,
        };
        let header = authorization_header(&challenge, "admin", "pw", "POST", "/wsman");
        assert!(header.contains("qop=auth"));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains("cnonce=\""));
    }
}
