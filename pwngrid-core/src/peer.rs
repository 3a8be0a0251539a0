//! Peer record kept for every distinct pwngrid identity

use std::time::{Duration, Instant};

use serde::Serialize;

/// A peer device discovered through pwngrid advertisements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerRecord {
    /// Stable fingerprint of the peer device
    pub identity: String,
    pub name: String,
    /// Mood glyph
    pub face: String,
    pub epoch: i64,
    pub grid_version: String,
    pub pwnd_run: u64,
    pub pwnd_tot: u64,
    pub session_id: String,
    pub timestamp: i64,
    /// Uptime in seconds as advertised
    pub uptime: u64,
    pub version: String,
    /// Signal strength of the frame that completed the advertisement
    pub rssi: i32,
    pub channel: u8,
    /// Last sighting (monotonic)
    #[serde(skip)]
    pub last_ping: Instant,
    pub gone: bool,
}

impl PeerRecord {
    /// Minimal record for an identity, everything else defaulted
    pub fn new(identity: impl Into<String>, last_ping: Instant) -> Self {
        Self {
            identity: identity.into(),
            name: String::new(),
            face: String::new(),
            epoch: 0,
            grid_version: String::new(),
            pwnd_run: 0,
            pwnd_tot: 0,
            session_id: String::new(),
            timestamp: 0,
            uptime: 0,
            version: String::new(),
            rssi: 0,
            channel: 0,
            last_ping,
            gone: false,
        }
    }

    /// Has this peer been silent for longer than `threshold` at `now`?
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_ping) > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staleness() {
        let start = Instant::now();
        let peer = PeerRecord::new("abc", start);
        assert!(!peer.is_stale(start + Duration::from_secs(10), Duration::from_secs(120)));
        assert!(peer.is_stale(start + Duration::from_secs(121), Duration::from_secs(120)));
    }

    #[test]
    fn test_serialization_skips_monotonic_clock() {
        let peer = PeerRecord::new("abc", Instant::now());
        let json = serde_json::to_value(&peer).unwrap();
        assert_eq!(json["identity"], "abc");
        assert!(json.get("last_ping").is_none());
        assert_eq!(json["gone"], false);
    }
}
