//! External collaborators consumed by the engine
//!
//! Identity, persistence, mood display and positioning are provided by the
//! surrounding application. The engine only depends on these contracts.

use async_trait::async_trait;

use crate::{CapturedPacket, PeerRecord, Result};

/// Device identity supplied by the signing subsystem
pub trait Identity: Send + Sync {
    /// Stable hex fingerprint of the device key
    fn fingerprint(&self) -> String;

    /// Id of the current session
    fn session_id(&self) -> String;

    /// Human-readable device name
    fn device_name(&self) -> String;
}

/// Append-only persistence for captured material and friends
#[async_trait]
pub trait Store: Send + Sync {
    async fn persist_packet(&self, packet: CapturedPacket) -> Result<()>;

    async fn persist_friend(&self, peer: PeerRecord) -> Result<()>;
}

/// Mood glyphs the engine asks the UI to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    /// Handshake material captured
    Excited,
    /// New friend spotted
    Friendly,
}

/// One-way notification towards the display. Never awaited, must not block.
pub trait MoodSink: Send + Sync {
    fn show_event(&self, mood: Mood, message: &str, peer_name: &str, peer_rssi: i32);
}

/// Mood sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMood;

impl MoodSink for NoMood {
    fn show_event(&self, _mood: Mood, _message: &str, _peer_name: &str, _peer_rssi: i32) {}
}

/// A positional fix
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// UTC time string as reported by the receiver
    pub utc: String,
}

/// Optional positioning capability (GPS)
pub trait PositionSource: Send + Sync {
    /// Bring the receiver up; an error means the capability is absent
    fn start(&self) -> Result<()>;

    /// Latest fix, if any
    fn position(&self) -> Option<Position>;
}
