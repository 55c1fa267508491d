//! A single `direct-tcpip` APF channel: window accounting and payload
//! splitting on top of the raw frame types.

use rpc_protocol::{Result, RpcError};

use crate::frame::Outbound;

/// Frame overhead subtracted from the driver's buffer size when
/// computing the largest `CHANNEL_DATA` payload we can hand to the
/// driver in one write: tag byte + peer-id u32 + payload-length u32.
const CHANNEL_DATA_OVERHEAD: usize = 1 + 4 + 4;

/// Local-system's view of the AMT loopback channel that carries a
/// forwarded HTTP/SOAP conversation over the `direct-tcpip` tunnel.
pub struct ApfChannel {
    local_id: u32,
    peer_id: Option<u32>,
    /// Bytes we are still allowed to send before the peer must send us
    /// a `CHANNEL_WINDOW_ADJUST`.
    send_window: u32,
    /// Bytes we have told the peer they may send us; decremented as we
    /// receive `CHANNEL_DATA` and replenished by `note_consumed`.
    recv_window: u32,
    recv_window_initial: u32,
    peer_max_packet: u32,
    driver_buffer_size: u32,
    inbound: Vec<u8>,
    closed: bool,
}

impl ApfChannel {
    pub fn new(local_id: u32, recv_window_initial: u32, driver_buffer_size: u32) -> Self {
        Self {
            local_id,
            peer_id: None,
            send_window: 0,
            recv_window: recv_window_initial,
            recv_window_initial,
            peer_max_packet: 0,
            driver_buffer_size,
            inbound: Vec::new(),
            closed: false,
        }
    }

    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    pub fn is_open(&self) -> bool {
        self.peer_id.is_some() && !self.closed
    }

    pub fn confirm(&mut self, their_id: u32, send_window: u32, peer_max_packet: u32) {
        self.peer_id = Some(their_id);
        self.send_window = send_window;
        self.peer_max_packet = peer_max_packet;
    }

    pub fn adjust_send_window(&mut self, bytes_to_add: u32) {
        self.send_window = self.send_window.saturating_add(bytes_to_add);
    }

    /// Largest payload we can put in a single `CHANNEL_DATA` frame:
    /// bounded by the peer's advertised max packet size and by how
    /// much room is left in the driver's own buffer once frame
    /// overhead is subtracted.
    pub fn max_payload_len(&self) -> usize {
        let driver_limit = (self.driver_buffer_size as usize).saturating_sub(CHANNEL_DATA_OVERHEAD);
        (self.peer_max_packet as usize).min(driver_limit).max(1)
    }

    /// Splits `payload` into one or more `CHANNEL_DATA` frames sized to
    /// fit both the peer's max-packet and the driver's buffer, honoring
    /// the current send window. Returns an error if the window is too
    /// small to make progress at all.
    pub fn split_for_send<'a>(&mut self, payload: &'a [u8]) -> Result<Vec<Outbound<'a>>> {
        let peer_id = self
            .peer_id
            .ok_or_else(|| RpcError::Protocol("channel not yet confirmed".into()))?;

        let chunk_len = self.max_payload_len();
        let mut frames = Vec::new();
        let mut offset = 0;
        while offset < payload.len() {
            if self.send_window == 0 {
                return Err(RpcError::Transport(
                    "APF send window exhausted before payload fully queued".into(),
                ));
            }
            let remaining_window = (self.send_window as usize).min(chunk_len);
            let end = (offset + remaining_window).min(payload.len());
            let slice = &payload[offset..end];
            self.send_window -= slice.len() as u32;
            frames.push(Outbound::ChannelData {
                peer_id,
                payload: slice,
            });
            offset = end;
        }
        Ok(frames)
    }

    /// Records inbound `CHANNEL_DATA` bytes, decrementing our
    /// advertised receive window.
    pub fn on_data(&mut self, payload: &[u8]) {
        self.recv_window = self.recv_window.saturating_sub(payload.len() as u32);
        self.inbound.extend_from_slice(payload);
    }

    /// True once our receive window has dropped under half its initial
    /// size, the point at which we should top it back up.
    pub fn needs_window_adjust(&self) -> bool {
        self.recv_window < self.recv_window_initial / 2
    }

    /// Builds the adjustment frame and restores our local window
    /// accounting to the initial size.
    pub fn window_adjust_frame(&mut self) -> Option<Outbound<'static>> {
        let peer_id = self.peer_id?;
        let bytes_to_add = self.recv_window_initial - self.recv_window;
        if bytes_to_add == 0 {
            return None;
        }
        self.recv_window = self.recv_window_initial;
        Some(Outbound::ChannelWindowAdjust {
            peer_id,
            bytes_to_add,
        })
    }

    pub fn take_inbound(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.inbound)
    }

    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub fn close_frame(&self) -> Option<Outbound<'static>> {
        self.peer_id.map(|peer_id| Outbound::ChannelClose { peer_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_payload_larger_than_max_packet() {
        let mut ch = ApfChannel::new(0, 1 << 20, 5120);
        ch.confirm(1, 1 << 20, 16);
        let payload = vec![7u8; 40];
        let frames = ch.split_for_send(&payload).unwrap();
        assert_eq!(frames.len(), 3); // 16 + 16 + 8
    }

    #[test]
    fn send_window_exhaustion_errors() {
        let mut ch = ApfChannel::new(0, 1 << 20, 5120);
        ch.confirm(1, 4, 1024);
        assert!(ch.split_for_send(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn window_adjust_threshold() {
        let mut ch = ApfChannel::new(0, 100, 5120);
        ch.confirm(1, 100, 1024);
        ch.on_data(&vec![0u8; 60]);
        assert!(ch.needs_window_adjust());
        let frame = ch.window_adjust_frame().unwrap();
        match frame {
            Outbound::ChannelWindowAdjust { bytes_to_add, .. } => assert_eq!(bytes_to_add, 60),
            _ => panic!("wrong frame"),
        }
        assert!(!ch.needs_window_adjust());
    }
}
