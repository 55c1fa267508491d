//! Short local transport variant: every request dials a fresh TCP
//! connection to the LMS loopback endpoint, writes one HTTP request,
//! reads the framed response to completion, and closes.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use rpc_protocol::{Result, RpcError};

use crate::digest::{self, DigestChallenge};
use crate::httpframe::parse_http_response;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ShortTransport {
    addr: String,
    username: String,
    password: String,
    challenge: Option<DigestChallenge>,
}

impl ShortTransport {
    /// Attempts a TCP connect to `addr` (`host:port`); this is the probe
    /// the local-transport selector uses to decide between this variant
    /// and the long, APF-tunneled one.
    pub fn probe(addr: &str) -> bool {
        TcpStream::connect(addr).is_ok()
    }

    pub fn new(addr: String, username: String, password: String) -> Self {
        Self {
            addr,
            username,
            password,
            challenge: None,
        }
    }

    /// POSTs `body` to `/wsman`, retrying once with digest credentials
    /// if the first attempt is challenged.
    pub fn post_wsman(&mut self, body: &str) -> Result<String> {
        if let Some(challenge) = self.challenge.clone() {
            let auth = digest::authorization_header(
                &challenge,
                &self.username,
                &self.password,
                "POST",
                "/wsman",
            );
            match self.send(body, Some(&auth))? {
                (200, resp_body, _) => return Ok(resp_body),
                (401, _, headers) => {
                    self.challenge = Some(extract_challenge(&headers)?);
                }
                (status, _, _) => {
                    return Err(RpcError::Transport(format!(
                        "local wsman request failed with status {status}"
                    )))
                }
            }
        }

        let (status, resp_body, headers) = self.send(body, None)?;
        if status == 200 {
            return Ok(resp_body);
        }
        if status != 401 {
            return Err(RpcError::Transport(format!(
                "local wsman request failed with status {status}"
            )));
        }

        let challenge = extract_challenge(&headers)?;
        let auth = digest::authorization_header(
            &challenge,
            &self.username,
            &self.password,
            "POST",
            "/wsman",
        );
        self.challenge = Some(challenge);

        let (status, resp_body, _) = self.send(body, Some(&auth))?;
        if status != 200 {
            return Err(RpcError::Transport(format!(
                "local wsman request failed with status {status} after digest auth"
            )));
        }
        Ok(resp_body)
    }

    fn send(&self, body: &str, auth: Option<&str>) -> Result<(u16, String, Vec<(String, String)>)> {
        let mut stream = TcpStream::connect(&self.addr)
            .map_err(|e| RpcError::Transport(format!("connect {}: {e}", self.addr)))?;
        stream
            .set_read_timeout(Some(CONNECT_TIMEOUT))
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let mut request = format!(
            "POST /wsman HTTP/1.1\r\nHost: {}\r\nContent-Type: application/soap+xml; charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.addr,
            body.len()
        );
        if let Some(auth) = auth {
            request.push_str(&format!("Authorization: {auth}\r\n"));
        }
        request.push_str("\r\n");
        request.push_str(body);

        stream
            .write_all(request.as_bytes())
            .map_err(|e| RpcError::Transport(format!("write: {e}")))?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .map_err(|e| RpcError::Transport(format!("read: {e}")))?;

        parse_http_response(&raw)
    }
}

fn extract_challenge(headers: &[(String, String)]) -> Result<DigestChallenge> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("www-authenticate"))
        .map(|(_, v)| DigestChallenge::parse(v))
        .ok_or_else(|| RpcError::Protocol("401 response missing WWW-Authenticate header".into()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_challenge_requires_header() {
        assert!(extract_challenge(&[]).is_err());
    }
}
