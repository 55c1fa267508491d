//! The remote-server message envelope (component D).
//!
//! A message is a byte-framed structure delivered atomically over the
//! provisioning server's WebSocket; the transport itself (TLS, framing)
//! is an external collaborator, so this crate only defines the shape of
//! the payload once it has been deserialized.

use serde::{Deserialize, Serialize};

/// One message exchanged with the remote provisioning server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub method: String,
    pub apikey: String,
    pub appversion: String,
    pub protocolversion: String,
    /// Opaque payload: for server->client, this is either the literal
    /// `"heartbeat"`, empty/null (done), or bytes to forward to the
    /// local management channel. For client->server, it is the local
    /// channel's response bytes.
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
}

impl RemoteMessage {
    /// Whether this message's payload is the literal heartbeat marker.
    pub fn is_heartbeat(&self) -> bool {
        self.payload.as_deref() == Some("heartbeat")
    }

    /// Whether the server has signaled it is done (null/empty payload).
    pub fn is_terminal(&self) -> bool {
        matches!(self.payload.as_deref(), None | Some(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(payload: Option<&str>) -> RemoteMessage {
        RemoteMessage {
            method: "activate".into(),
            apikey: "key".into(),
            appversion: "1.0".into(),
            protocolversion: "4.0.0".into(),
            payload: payload.map(str::to_string),
            tenant: None,
        }
    }

    #[test]
    fn heartbeat_is_detected() {
        assert!(msg(Some("heartbeat")).is_heartbeat());
        assert!(!msg(Some("<envelope/>")).is_heartbeat());
    }

    #[test]
    fn terminal_on_null_or_empty() {
        assert!(msg(None).is_terminal());
        assert!(msg(Some("")).is_terminal());
        assert!(!msg(Some("heartbeat")).is_terminal());
        assert!(!msg(Some("<envelope/>")).is_terminal());
    }
}
