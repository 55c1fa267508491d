//! The relay state machine (component E): couples the remote
//! provisioning-server transport to the local management-engine
//! transport, one request/response pair at a time.

use tokio_util::sync::CancellationToken;

use rpc_local::LocalManager;
use rpc_protocol::{RemoteMessage, Result, RpcError};
use rpc_remote::RemoteTransport;

use crate::jumbling::JumbleGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    AwaitingServer,
    ForwardingToLocal,
    AwaitingLocal,
    Terminating,
}

pub struct RelaySession {
    remote: RemoteTransport,
    /// Taken out and moved into a blocking task for the duration of
    /// each local request, since C's transports do blocking I/O.
    local: Option<LocalManager>,
    jumble: JumbleGuard,
    state: RelayState,
}

impl RelaySession {
    pub fn new(remote: RemoteTransport, local: LocalManager) -> Self {
        Self {
            remote,
            local: Some(local),
            jumble: JumbleGuard::new(),
            state: RelayState::Idle,
        }
    }

    /// Sends `initial` as the command's opening message, then drives
    /// the state machine until the server signals it is done, an error
    /// occurs, or `shutdown` is cancelled.
    pub async fn run(mut self, initial: RemoteMessage, shutdown: CancellationToken) -> Result<()> {
        self.remote.send(initial).await?;
        self.state = RelayState::AwaitingServer;

        let outcome = self.drive(&shutdown).await;

        self.state = RelayState::Terminating;
        if let Some(mut local) = self.local.take() {
            let _ = local.close();
        }
        self.remote.close();

        outcome
    }

    async fn drive(&mut self, shutdown: &CancellationToken) -> Result<()> {
        loop {
            if self.state == RelayState::Terminating {
                return Ok(());
            }

            let message = tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("relay received shutdown signal");
                    self.state = RelayState::Terminating;
                    return Ok(());
                }
                msg = self.remote.listen() => msg,
            };

            let Some(message) = message else {
                tracing::warn!("remote transport closed unexpectedly");
                self.state = RelayState::Terminating;
                return Err(RpcError::Transport("remote transport closed".into()));
            };

            if message.is_heartbeat() {
                tracing::trace!("heartbeat from server, remaining in AwaitingServer");
                continue;
            }
            if message.is_terminal() {
                tracing::debug!("server signaled completion");
                self.state = RelayState::Terminating;
                return Ok(());
            }

            self.state = RelayState::ForwardingToLocal;
            let request_body = message.payload.clone().unwrap_or_default();

            let mut local = self
                .local
                .take()
                .expect("RelaySession::local is only absent while Terminating");
            let (outcome, local) = tokio::task::spawn_blocking(move || {
                let result = local.post_wsman(&request_body);
                (result, local)
            })
            .await
            .map_err(|e| RpcError::Transport(format!("local transport task panicked: {e}")))?;
            self.local = Some(local);

            let response_body = match outcome {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(error = %e, "local transport error, terminating relay");
                    self.state = RelayState::Terminating;
                    return Err(e);
                }
            };

            self.state = RelayState::AwaitingLocal;
            let jumbled = self.jumble.check(response_body.as_bytes());
            let reply = RemoteMessage {
                method: message.method.clone(),
                apikey: message.apikey.clone(),
                appversion: message.appversion.clone(),
                protocolversion: message.protocolversion.clone(),
                payload: Some(String::from_utf8_lossy(&jumbled).into_owned()),
                tenant: message.tenant.clone(),
            };

            self.remote.send(reply).await?;
            self.state = RelayState::AwaitingServer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat() -> RemoteMessage {
        RemoteMessage {
            method: "activate".into(),
            apikey: "k".into(),
            appversion: "1".into(),
            protocolversion: "4".into(),
            payload: Some("heartbeat".into()),
            tenant: None,
        }
    }

    #[test]
    fn heartbeat_and_terminal_classification_match_message_helpers() {
        assert!(heartbeat().is_heartbeat());
        let mut terminal = heartbeat();
        terminal.payload = None;
        assert!(terminal.is_terminal());
    }
}
