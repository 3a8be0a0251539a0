//! Captured artifact handed from the receive path to persistence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::MacAddr;

/// What kind of material a captured packet carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Raw EAPOL data frame (handshake message)
    #[serde(rename = "EAPOL")]
    Eapol,
    /// Formatted PMKID line (`pmkid*ap*client*ssid`)
    #[serde(rename = "PMKID")]
    Pmkid,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Eapol => "EAPOL",
            CaptureKind::Pmkid => "PMKID",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured artifact waiting in the capture pipeline
#[derive(Debug, Clone, Serialize)]
pub struct CapturedPacket {
    /// Time-ordered record id
    pub id: Uuid,
    /// BSSID as `aa:bb:cc:dd:ee:ff`
    pub bssid: String,
    /// Kind tag
    #[serde(rename = "type")]
    pub kind: CaptureKind,
    /// Payload, truncated to the configured maximum
    #[serde(serialize_with = "serialize_hex")]
    pub raw: Vec<u8>,
    /// Channel the frame was received on
    pub channel: u8,
    /// When the frame was captured
    pub captured_at: DateTime<Utc>,
}

impl CapturedPacket {
    /// Copy `data` (truncated to `max_len` bytes) into a new record
    pub fn new(bssid: MacAddr, kind: CaptureKind, data: &[u8], channel: u8, max_len: usize) -> Self {
        let len = data.len().min(max_len);
        Self {
            id: Uuid::now_v7(),
            bssid: bssid.to_string(),
            kind,
            raw: data[..len].to_vec(),
            channel,
            captured_at: Utc::now(),
        }
    }

    /// Get packet data as slice
    pub fn data(&self) -> &[u8] {
        &self.raw
    }

    /// Get packet length
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Check if packet is empty
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn serialize_hex<S: Serializer>(raw: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(raw))
}
