//! Minimal HTTP/1.1 response parsing shared by both local transport
//! variants — just enough to read a status line, headers, and a body
//! whose length is known up front (AMT's embedded server always sends
//! `Content-Length`, never chunked transfer-encoding).

use rpc_protocol::{Result, RpcError};

pub fn parse_http_response(raw: &[u8]) -> Result<(u16, String, Vec<(String, String)>)> {
    let text = String::from_utf8_lossy(raw);
    let mut parts = text.splitn(2, "\r\n\r\n");
    let head = parts
        .next()
        .ok_or_else(|| RpcError::Protocol("empty HTTP response".into()))?;
    let body = parts.next().unwrap_or("").to_string();

    let mut lines = head.lines();
    let status_line = lines
        .next()
        .ok_or_else(|| RpcError::Protocol("missing HTTP status line".into()))?;
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RpcError::Protocol(format!("malformed status line: {status_line}")))?;

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Ok((status, body, headers))
}

/// Scans `headers` for a `Content-Length` and reports whether `body` so
/// far contains at least that many bytes — used by the long variant to
/// know when to stop assembling `CHANNEL_DATA` payloads.
pub fn body_complete(headers: &[(String, String)], body_len: usize) -> bool {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .map(|declared| body_len >= declared)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_and_headers() {
        let raw = b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Digest realm=\"r\", nonce=\"n\"\r\nContent-Length: 0\r\n\r\n";
        let (status, body, headers) = parse_http_response(raw).unwrap();
        assert_eq!(status, 401);
        assert_eq!(body, "");
        assert!(headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("www-authenticate")));
    }

    #[test]
    fn body_complete_checks_content_length() {
        let headers = vec![("Content-Length".to_string(), "10".to_string())];
        assert!(!body_complete(&headers, 5));
        assert!(body_complete(&headers, 10));
    }
}
