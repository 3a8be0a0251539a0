//! EAPOL detection and PMKID extraction
//!
//! Layout after the MAC header of a data frame carrying an EAPOL-Key:
//!
//! ```text
//! +0   LLC/SNAP          AA AA 03 00 00 00 88 8E
//! +8   EAPOL header      version | type | length (2)
//! +12  descriptor type   2 = RSN (WPA2)
//! +13  key info (2) | key length (2) | replay counter (8) | nonce (32)
//!      IV (16) | RSC (8) | reserved (8) | MIC (16)
//! +105 key data length   big-endian
//! +107 key data          information elements
//! ```

use std::fmt;

use pwngrid_core::MacAddr;

use crate::frame::{Frame, FrameKind};
use crate::ie::{Elements, TAG_RSN};

/// LLC/SNAP header announcing an 802.1X payload
pub const EAPOL_SNAP: [u8; 8] = [0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x88, 0x8E];

/// Shortest frame that can carry the SNAP header at the usual offset
pub const MIN_EAPOL_FRAME_LEN: usize = 40;

/// Key descriptor type of RSN (WPA2) key frames
pub const KEY_DESCRIPTOR_RSN: u8 = 2;

const SNAP_LEN: usize = EAPOL_SNAP.len();
const DESCRIPTOR_OFFSET: usize = 4;
const KEY_DATA_LEN_OFFSET: usize = 97;
const KEY_DATA_OFFSET: usize = 99;

/// PMKID list marker inside the RSN element, followed by the 16-byte PMKID
const PMKID_MARKER: [u8; 2] = [0x00, 0x01];
const PMKID_LEN: usize = 16;

const AP_MAC_OFFSET: usize = 16;
const CLIENT_MAC_OFFSET: usize = 10;

/// Does this data frame carry an EAPOL payload?
pub fn is_eapol(frame: &Frame<'_>) -> bool {
    if !matches!(frame.kind(), FrameKind::Data { .. }) {
        return false;
    }
    let llc = frame.header_len();
    let bytes = frame.bytes();
    if bytes.len() < MIN_EAPOL_FRAME_LEN {
        return false;
    }
    bytes
        .get(llc..llc + SNAP_LEN)
        .map_or(false, |snap| snap == EAPOL_SNAP)
}

/// PMKID material recovered from the first message of a 4-way handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmkidRecord {
    pub pmkid: [u8; PMKID_LEN],
    pub ap_mac: MacAddr,
    pub client_mac: MacAddr,
    pub ssid: String,
}

impl PmkidRecord {
    /// Extract a PMKID from an EAPOL-Key frame.
    ///
    /// The frame carries no SSID, so the caller supplies the one it knows for
    /// the access point (empty if unknown). Returns `None` for non-EAPOL
    /// frames, non-RSN descriptors, truncated key frames and key data without
    /// a PMKID.
    pub fn extract(frame: &Frame<'_>, ssid: &str) -> Option<Self> {
        if !is_eapol(frame) {
            return None;
        }

        let bytes = frame.bytes();
        let key = frame.header_len() + SNAP_LEN;

        if *bytes.get(key + DESCRIPTOR_OFFSET)? != KEY_DESCRIPTOR_RSN {
            return None;
        }

        let len_bytes = bytes.get(key + KEY_DATA_LEN_OFFSET..key + KEY_DATA_OFFSET)?;
        let key_data_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let start = key + KEY_DATA_OFFSET;
        let key_data = bytes.get(start..start + key_data_len)?;

        let pmkid = Elements::new(key_data, 0)
            .filter(|e| e.tag == TAG_RSN)
            .find_map(|rsn| find_pmkid(rsn.value))?;

        Some(Self {
            pmkid,
            ap_mac: MacAddr::from_slice(bytes.get(AP_MAC_OFFSET..AP_MAC_OFFSET + 6)?)?,
            client_mac: MacAddr::from_slice(bytes.get(CLIENT_MAC_OFFSET..CLIENT_MAC_OFFSET + 6)?)?,
            ssid: ssid.to_string(),
        })
    }
}

/// Slide over the RSN body looking for the marker and the PMKID after it
fn find_pmkid(rsn: &[u8]) -> Option<[u8; PMKID_LEN]> {
    rsn.windows(PMKID_MARKER.len() + PMKID_LEN)
        .find(|w| w[..2] == PMKID_MARKER)
        .and_then(|w| w[2..].try_into().ok())
}

impl fmt::Display for PmkidRecord {
    /// `pmkid*ap*client*ssid`, hex lowercase without separators
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.pmkid))?;
        write!(
            f,
            "*{}*{}*{}",
            self.ap_mac.to_hex(),
            self.client_mac.to_hex(),
            self.ssid
        )
    }
}
