//! Driver-protocol wire tags (component B, the application-protocol
//! framer). Bit-stable with the firmware — never renumber.

/// First byte of every frame sent or received over the driver channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameTag {
    Disconnect = 1,
    ServiceRequest = 5,
    ServiceAccept = 6,
    GlobalRequest = 80,
    RequestSuccess = 81,
    RequestFailure = 82,
    ChannelOpen = 90,
    ChannelOpenConfirmation = 91,
    ChannelOpenFailure = 92,
    ChannelWindowAdjust = 93,
    ChannelData = 94,
    ChannelClose = 97,
}

impl FrameTag {
    /// Parse a tag byte read off the wire.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => FrameTag::Disconnect,
            5 => FrameTag::ServiceRequest,
            6 => FrameTag::ServiceAccept,
            80 => FrameTag::GlobalRequest,
            81 => FrameTag::RequestSuccess,
            82 => FrameTag::RequestFailure,
            90 => FrameTag::ChannelOpen,
            91 => FrameTag::ChannelOpenConfirmation,
            92 => FrameTag::ChannelOpenFailure,
            93 => FrameTag::ChannelWindowAdjust,
            94 => FrameTag::ChannelData,
            97 => FrameTag::ChannelClose,
            _ => return None,
        })
    }
}

/// Loopback port the management engine exposes its WS-Management
/// endpoint on, and the forwarding target for `GLOBAL_REQUEST` /
/// `CHANNEL_OPEN`.
pub const AMT_LOOPBACK_PORT: u16 = 16992;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_tag() {
        let tags = [
            FrameTag::Disconnect,
            FrameTag::ServiceRequest,
            FrameTag::ServiceAccept,
            FrameTag::GlobalRequest,
            FrameTag::RequestSuccess,
            FrameTag::RequestFailure,
            FrameTag::ChannelOpen,
            FrameTag::ChannelOpenConfirmation,
            FrameTag::ChannelOpenFailure,
            FrameTag::ChannelWindowAdjust,
            FrameTag::ChannelData,
            FrameTag::ChannelClose,
        ];
        for tag in tags {
            assert_eq!(FrameTag::from_u8(tag as u8), Some(tag));
        }
    }

    #[test]
    fn unknown_byte_is_none() {
        assert_eq!(FrameTag::from_u8(200), None);
    }
}
