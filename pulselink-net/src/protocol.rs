//! Outbound message types the engine hands to the transport.
//!
//! The transport owns the wire envelope (sender/target ids, framing,
//! serialization); the engine only decides what to say.

use serde::{Deserialize, Serialize};

use pulselink_types::{Channel, EndpointId, WaveformSegment};

/// A command for one endpoint's device app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundMessage {
    /// Play a waveform pattern on one channel. Each repeated send of the
    /// same payload renews the device's playback lease rather than starting
    /// a new independent trigger.
    Wave {
        channel: Channel,
        segments: Vec<WaveformSegment>,
        duration_ms: u64,
    },
    /// Clear the queued pattern on one channel.
    ClearPattern { channel: Channel },
    /// Set one channel's intensity (0–100).
    SetStrength { channel: Channel, value: u8 },
}

impl OutboundMessage {
    pub fn wave(channel: Channel, segments: Vec<WaveformSegment>, duration_ms: u64) -> Self {
        Self::Wave {
            channel,
            segments,
            duration_ms,
        }
    }

    pub fn clear(channel: Channel) -> Self {
        Self::ClearPattern { channel }
    }

    pub fn set_strength(channel: Channel, value: u8) -> Self {
        Self::SetStrength { channel, value }
    }

    /// Which channel this command addresses.
    pub fn channel(&self) -> Channel {
        match self {
            Self::Wave { channel, .. }
            | Self::ClearPattern { channel }
            | Self::SetStrength { channel, .. } => *channel,
        }
    }
}

/// Binding lifecycle notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindEvent {
    /// An endpoint completed binding to the controller.
    Bound(EndpointId),
    /// An endpoint's binding was released.
    Unbound(EndpointId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulselink_types::WaveformSegment;

    #[test]
    fn wave_message_roundtrips_through_json() {
        let msg = OutboundMessage::wave(
            Channel::A,
            vec![WaveformSegment::new("0A0A0A0A64646464").unwrap()],
            3000,
        );
        let json = serde_json::to_string(&msg).unwrap();
        let back: OutboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn invalid_segment_rejected_on_deserialize() {
        let json = r#"{"Wave":{"channel":"A","segments":["nope"],"duration_ms":1}}"#;
        assert!(serde_json::from_str::<OutboundMessage>(json).is_err());
    }

    #[test]
    fn message_channel_accessor() {
        assert_eq!(OutboundMessage::clear(Channel::B).channel(), Channel::B);
        assert_eq!(
            OutboundMessage::set_strength(Channel::A, 40).channel(),
            Channel::A
        );
    }
}
