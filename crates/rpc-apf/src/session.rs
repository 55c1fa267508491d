//! Drives the per-connection handshake and channel lifecycle on top of
//! a [`DriverOps`] handle: `SERVICE_REQUEST("pfwd")` -> `SERVICE_ACCEPT`
//! -> `GLOBAL_REQUEST("tcpip-forward", ...)` -> `REQUEST_SUCCESS`,
//! then one or more `direct-tcpip` channels multiplexed over the same
//! handle.
//!
//! This type is synchronous, like the rest of the driver layer; async
//! callers run it inside `tokio::task::spawn_blocking`.

use std::collections::HashMap;

use rpc_driver::DriverOps;
use rpc_protocol::driver_tags::AMT_LOOPBACK_PORT;
use rpc_protocol::{Result, RpcError};

use crate::channel::ApfChannel;
use crate::frame::{Inbound, Outbound};

/// Initial receive window we advertise per channel. Matches the
/// buffer-size order of magnitude the firmware itself uses.
const CHANNEL_WINDOW: u32 = 256 * 1024;

pub struct ApfSession {
    driver: Box<dyn DriverOps>,
    buffer_size: u32,
    channels: HashMap<u32, ApfChannel>,
    next_local_id: u32,
}

impl ApfSession {
    /// Opens the driver and runs the `tcpip-forward` handshake that
    /// every session needs before any channel can be opened.
    pub fn connect(mut driver: Box<dyn DriverOps>) -> Result<Self> {
        driver.init(true)?;
        let buffer_size = driver.buffer_size();

        let mut session = Self {
            driver,
            buffer_size,
            channels: HashMap::new(),
            next_local_id: 0,
        };

        session.write(&Outbound::ServiceRequest {
            service_name: "pfwd",
        })?;
        match session.read_frame()? {
            Inbound::ServiceAccept => {}
            other => {
                return Err(RpcError::Protocol(format!(
                    "expected SERVICE_ACCEPT, got {other:?}"
                )))
            }
        }

        session.write(&Outbound::GlobalRequestTcpipForward {
            host: "::",
            port: AMT_LOOPBACK_PORT as u32,
        })?;
        match session.read_frame()? {
            Inbound::RequestSuccess => {}
            Inbound::RequestFailure => {
                return Err(RpcError::Protocol("tcpip-forward request refused".into()))
            }
            other => {
                return Err(RpcError::Protocol(format!(
                    "expected REQUEST_SUCCESS, got {other:?}"
                )))
            }
        }

        Ok(session)
    }

    fn write(&mut self, frame: &Outbound) -> Result<()> {
        self.driver.send(&frame.encode())?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Inbound> {
        let mut buf = vec![0u8; self.buffer_size as usize];
        let n = self.driver.recv(&mut buf)?;
        if n == 0 {
            return Err(RpcError::Transport("driver channel closed".into()));
        }
        Inbound::parse(&buf[..n])
    }

    /// Opens a `direct-tcpip` channel to `dst_host:dst_port` and blocks
    /// until the peer confirms or refuses it. Returns the local channel
    /// id used to address it in subsequent calls.
    pub fn open_channel(&mut self, dst_host: &str, dst_port: u32) -> Result<u32> {
        let local_id = self.next_local_id;
        self.next_local_id += 1;

        self.write(&Outbound::ChannelOpen {
            local_id,
            window: CHANNEL_WINDOW,
            max_packet: self.buffer_size,
            dst_host,
            dst_port,
            src_host: "0.0.0.0",
            src_port: 0,
        })?;

        loop {
            match self.read_frame()? {
                Inbound::ChannelOpenConfirmation {
                    our_id,
                    their_id,
                    window,
                    max_packet,
                } if our_id == local_id => {
                    let mut channel = ApfChannel::new(local_id, CHANNEL_WINDOW, self.buffer_size);
                    channel.confirm(their_id, window, max_packet);
                    self.channels.insert(local_id, channel);
                    return Ok(local_id);
                }
                Inbound::ChannelOpenFailure { our_id } if our_id == local_id => {
                    return Err(RpcError::Transport(format!(
                        "peer refused direct-tcpip channel {local_id}"
                    )))
                }
                // Frames for other channels can legitimately arrive
                // interleaved; route and keep waiting for our confirmation.
                other => self.route(other)?,
            }
        }
    }

    /// Queues `payload` for `channel_id`, splitting as needed and
    /// respecting the send window.
    pub fn send(&mut self, channel_id: u32, payload: &[u8]) -> Result<()> {
        let frames = {
            let channel = self
                .channels
                .get_mut(&channel_id)
                .ok_or_else(|| RpcError::Protocol(format!("unknown channel {channel_id}")))?;
            channel.split_for_send(payload)?
        };
        for frame in &frames {
            self.write(frame)?;
        }
        Ok(())
    }

    /// Blocks for the next frame addressed to `channel_id` and returns
    /// whatever payload bytes have accumulated for it since the last
    /// call, or `None` once the peer has closed the channel.
    pub fn recv(&mut self, channel_id: u32) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(channel) = self.channels.get(&channel_id) {
                if !channel.is_open() {
                    return Ok(None);
                }
            }
            let frame = self.read_frame()?;
            let is_ours_data = matches!(&frame, Inbound::ChannelData { our_id, .. } if *our_id == channel_id);
            let is_ours_close = matches!(&frame, Inbound::ChannelClose { our_id } if *our_id == channel_id);
            self.route(frame)?;

            if is_ours_data {
                if let Some(channel) = self.channels.get_mut(&channel_id) {
                    let bytes = channel.take_inbound();
                    if let Some(adjust) = channel.window_adjust_frame() {
                        self.write(&adjust)?;
                    }
                    if !bytes.is_empty() {
                        return Ok(Some(bytes));
                    }
                }
            }
            if is_ours_close {
                return Ok(None);
            }
        }
    }

    pub fn close_channel(&mut self, channel_id: u32) -> Result<()> {
        if let Some(channel) = self.channels.get(&channel_id) {
            if let Some(frame) = channel.close_frame() {
                self.write(&frame)?;
            }
        }
        if let Some(channel) = self.channels.get_mut(&channel_id) {
            channel.mark_closed();
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        let _ = self.write(&Outbound::Disconnect);
        self.driver.close();
    }

    fn route(&mut self, frame: Inbound) -> Result<()> {
        match frame {
            Inbound::ChannelData { our_id, payload } => {
                if let Some(channel) = self.channels.get_mut(&our_id) {
                    channel.on_data(&payload);
                }
            }
            Inbound::ChannelWindowAdjust {
                our_id,
                bytes_to_add,
            } => {
                if let Some(channel) = self.channels.get_mut(&our_id) {
                    channel.adjust_send_window(bytes_to_add);
                }
            }
            Inbound::ChannelClose { our_id } => {
                if let Some(channel) = self.channels.get_mut(&our_id) {
                    channel.mark_closed();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_driver::FakeDriver;

    fn encode(frame: Outbound) -> Vec<u8> {
        frame.encode()
    }

    #[test]
    fn connect_fails_when_peer_sends_unexpected_first_frame() {
        let mut driver = FakeDriver::new();
        // First frame from the peer must be SERVICE_ACCEPT; anything
        // else is a protocol error.
        driver.push_inbound(encode(Outbound::ServiceRequest {
            service_name: "pfwd",
        }));
        assert!(ApfSession::connect(Box::new(driver)).is_err());
    }

    #[test]
    fn connect_succeeds_on_full_handshake() {
        let mut driver = FakeDriver::new();
        driver.push_inbound(vec![6, 0, 0, 0, 0]); // SERVICE_ACCEPT, empty service name
        driver.push_inbound(vec![81]); // REQUEST_SUCCESS
        assert!(ApfSession::connect(Box::new(driver)).is_ok());
    }

    #[test]
    fn open_channel_confirms() {
        let mut driver = FakeDriver::new();
        driver.push_inbound(vec![6, 0, 0, 0, 0]);
        driver.push_inbound(vec![81]);
        let mut confirm = Vec::new();
        confirm.push(91u8);
        confirm.extend_from_slice(&0u32.to_be_bytes()); // our_id
        confirm.extend_from_slice(&5u32.to_be_bytes()); // their_id
        confirm.extend_from_slice(&(256 * 1024u32).to_be_bytes());
        confirm.extend_from_slice(&1024u32.to_be_bytes());
        driver.push_inbound(confirm);

        let mut session = ApfSession::connect(Box::new(driver)).unwrap();
        let id = session.open_channel("127.0.0.1", 16992).unwrap();
        assert_eq!(id, 0);
    }
}
