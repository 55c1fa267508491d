//! Component D: the remote transport, a WebSocket connection to the
//! provisioning server. Modeled closely on the teacher's node-client
//! connection lifecycle (connect, split sink/stream, reader+writer
//! tasks feeding an `mpsc` queue) but, per this system's contract that
//! a lost connection is fatal to the in-flight command, deliberately
//! without the teacher's reconnect/backoff loop: `connect` makes one
//! attempt and returns an error instead of retrying.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use native_tls::TlsConnector;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::Connector;

pub use rpc_protocol::RemoteMessage;
use rpc_protocol::{Result, RpcError};

pub struct RemoteTransport {
    outbound_tx: mpsc::Sender<RemoteMessage>,
    inbound_rx: Mutex<mpsc::Receiver<RemoteMessage>>,
    writer_task: tokio::task::JoinHandle<()>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl RemoteTransport {
    /// Connects to `url` once. `skip_cert_check` disables TLS
    /// certificate verification, for servers behind self-signed certs
    /// in lab/dev provisioning setups.
    pub async fn connect(url: &str, skip_cert_check: bool) -> Result<Self> {
        let (ws_stream, _response) = if url.starts_with("wss://") && skip_cert_check {
            let tls = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| RpcError::Transport(format!("building TLS connector: {e}")))?;
            tokio_tungstenite::connect_async_tls_with_config(
                url,
                None,
                false,
                Some(Connector::NativeTls(tls)),
            )
            .await
            .map_err(|e| RpcError::Transport(format!("connecting to {url}: {e}")))?
        } else {
            tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| RpcError::Transport(format!("connecting to {url}: {e}")))?
        };

        let (mut sink, mut stream) = ws_stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<RemoteMessage>(32);
        let (inbound_tx, inbound_rx) = mpsc::channel::<RemoteMessage>(32);

        let writer_task = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize remote message");
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader_task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<RemoteMessage>(&text) {
                        Ok(msg) => {
                            if inbound_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "dropping unparsable remote message"),
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("remote server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "remote transport read error");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            outbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            writer_task,
            reader_task,
        })
    }

    pub async fn send(&self, message: RemoteMessage) -> Result<()> {
        self.outbound_tx
            .send(message)
            .await
            .map_err(|_| RpcError::Transport("remote transport writer has shut down".into()))
    }

    /// Blocks for the next inbound message, or `None` once the reader
    /// task has exited (connection closed or errored).
    pub async fn listen(&self) -> Option<RemoteMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    pub fn close(&self) {
        self.writer_task.abort();
        self.reader_task.abort();
    }
}

impl Drop for RemoteTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Convenience wrapper so callers can hold a transport behind an `Arc`
/// without wrapping it themselves.
pub type SharedRemoteTransport = Arc<RemoteTransport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_surfaces_error_instead_of_retrying() {
        // No listener on this port; connect must fail on the first and
        // only attempt rather than loop waiting for one to appear.
        let result = RemoteTransport::connect("ws://127.0.0.1:1", false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let result = RemoteTransport::connect("not-a-url", false).await;
        assert!(result.is_err());
    }
}
