//! # pulselink-types
//!
//! Shared type definitions for the pulselink ecosystem.
//! This crate contains the data structures used across pulselink-core and
//! pulselink-net: channels, endpoint identifiers, waveform segments and sets,
//! and the engine's strength state.

use serde::{Deserialize, Serialize};

/// A stimulation output channel on the device. The two channels are fully
/// independent; every engine operation is parameterized by channel or fans
/// out to both explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Both channels, in wire order.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// Numeric code used by the device firmware (A=1, B=2).
    pub fn code(self) -> u8 {
        match self {
            Channel::A => 1,
            Channel::B => 2,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Opaque identifier for a device app endpoint, assigned by the transport.
///
/// The engine never interprets its structure beyond identity comparison and
/// substring-containment tests against the transport's bound-apps listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One atomic waveform frame understood by the device firmware: exactly
/// 16 hexadecimal characters.
///
/// Invalid segments are rejected here, at construction, never at dispatch
/// time — a `WaveformSegment` that exists is always sendable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WaveformSegment(String);

impl WaveformSegment {
    pub const LEN: usize = 16;

    /// Validate and wrap a raw segment string.
    pub fn new(raw: impl Into<String>) -> Result<Self, SegmentError> {
        let raw = raw.into();
        if raw.len() != Self::LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SegmentError(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WaveformSegment {
    type Error = SegmentError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<WaveformSegment> for String {
    fn from(seg: WaveformSegment) -> String {
        seg.0
    }
}

/// A segment string that is not 16 hex characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentError(pub String);

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid waveform segment {:?}: expected 16 hex characters",
            self.0
        )
    }
}

impl std::error::Error for SegmentError {}

/// A named, validated, ordered sequence of waveform segments.
///
/// Immutable once built; the catalog replaces sets wholesale on reload,
/// never mutates them in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformSet {
    name: String,
    segments: Vec<WaveformSegment>,
}

impl WaveformSet {
    /// Build a set from an already-validated segment sequence.
    /// Returns `None` if the name or the sequence is empty.
    pub fn new(name: impl Into<String>, segments: Vec<WaveformSegment>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() || segments.is_empty() {
            return None;
        }
        Some(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[WaveformSegment] {
        &self.segments
    }
}

/// Clamp an arbitrary requested strength into the device range.
/// Out-of-range input is silently corrected, not rejected.
pub fn clamp_strength(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

/// Process-wide per-channel intensity target, 0–100 per channel.
///
/// Owned exclusively by the engine; callers read and write through the
/// engine's API, never directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrengthState {
    pub a: u8,
    pub b: u8,
}

impl StrengthState {
    pub fn new(a: u8, b: u8) -> Self {
        Self {
            a: a.min(100),
            b: b.min(100),
        }
    }

    pub fn get(&self, channel: Channel) -> u8 {
        match channel {
            Channel::A => self.a,
            Channel::B => self.b,
        }
    }

    pub fn set(&mut self, channel: Channel, value: u8) {
        let value = value.min(100);
        match channel {
            Channel::A => self.a = value,
            Channel::B => self.b = value,
        }
    }

    /// Force both channels to zero (emergency stop).
    pub fn zero(&mut self) {
        self.a = 0;
        self.b = 0;
    }
}

/// Snapshot of engine health for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Transport-level connections.
    pub connected: usize,
    /// Endpoints bound to this controller.
    pub bound: usize,
    pub strength_a: u8,
    pub strength_b: u8,
}
