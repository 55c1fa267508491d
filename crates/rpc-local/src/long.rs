//! Long local transport variant: used when a direct TCP connect to the
//! LMS loopback endpoint fails (headless/embedded targets without an
//! LMS service). The WS-Management conversation is instead tunneled
//! over a `direct-tcpip` APF channel opened against the driver.

use rpc_apf::ApfSession;
use rpc_driver::DriverOps;
use rpc_protocol::driver_tags::AMT_LOOPBACK_PORT;
use rpc_protocol::{Result, RpcError};

use crate::digest::{self, DigestChallenge};
use crate::httpframe::{body_complete, parse_http_response};

pub struct LongTransport {
    session: ApfSession,
    channel_id: u32,
    username: String,
    password: String,
    challenge: Option<DigestChallenge>,
}

impl LongTransport {
    pub fn connect(driver: Box<dyn DriverOps>, username: String, password: String) -> Result<Self> {
        let mut session = ApfSession::connect(driver)?;
        let channel_id = session.open_channel("127.0.0.1", AMT_LOOPBACK_PORT as u32)?;
        Ok(Self {
            session,
            channel_id,
            username,
            password,
            challenge: None,
        })
    }

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
                (401, _, headers) => self.challenge = Some(extract_challenge(&headers)?),
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

    fn send(&mut self, body: &str, auth: Option<&str>) -> Result<(u16, String, Vec<(String, String)>)> {
        let mut request = format!(
            "POST /wsman HTTP/1.1\r\nHost: 127.0.0.1:{AMT_LOOPBACK_PORT}\r\nContent-Type: application/soap+xml; charset=UTF-8\r\nContent-Length: {}\r\nConnection: keep-alive\r\n",
            body.len()
        );
        if let Some(auth) = auth {
            request.push_str(&format!("Authorization: {auth}\r\n"));
        }
        request.push_str("\r\n");
        request.push_str(body);

        self.session.send(self.channel_id, request.as_bytes())?;

        let mut raw = Vec::new();
        loop {
            let Some(chunk) = self.session.recv(self.channel_id)? else {
                break;
            };
            raw.extend_from_slice(&chunk);
            if let Ok((_, parsed_body, headers)) = parse_http_response(&raw) {
                if body_complete(&headers, parsed_body.len()) {
                    break;
                }
            }
        }

        parse_http_response(&raw)
    }

    pub fn close(&mut self) -> Result<()> {
        self.session.close_channel(self.channel_id)
    }
}

fn extract_challenge(headers: &[(String, String)]) -> Result<DigestChallenge> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("www-authenticate"))
        .map(|(_, v)| DigestChallenge::parse(v))
        .ok_or_else(|| RpcError::Protocol("401 response missing WWW-Authenticate header".into()))?
}
