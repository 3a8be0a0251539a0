//! pwngrid wire constants

use pwngrid_core::MacAddr;

/// Source address every pwngrid advertisement is sent from
pub const SENTINEL_SOURCE: MacAddr = MacAddr([0xde, 0xad, 0xbe, 0xef, 0xde, 0xad]);

/// BSSID every pwngrid advertisement is sent with
pub const ADVERTISE_BSSID: MacAddr = MacAddr([0xa1, 0x00, 0x64, 0xe6, 0x0b, 0x8b]);

/// Sequence control field of the advertisement beacon (bytes `40 43`)
pub const ADVERTISE_SEQ_CTL: u16 = 0x4340;

/// Vendor element carrying a JSON fragment
pub const TAG_PAYLOAD: u8 = pwngrid_frame::ie::TAG_PWNGRID;

/// Largest fragment per element
pub const MAX_FRAGMENT_LEN: usize = pwngrid_frame::ie::MAX_ELEMENT_LEN;

/// Largest document the reassembler accumulates
pub const MAX_DOCUMENT_LEN: usize = 4096;

/// Epoch value advertised by this device
pub const ADVERTISE_EPOCH: i64 = 1;

// ===== Policy =====

pub const POLICY_BOND_ENCOUNTERS_FACTOR: u32 = 20000;
pub const POLICY_BORED_NUM_EPOCH: u32 = 0;
pub const POLICY_SAD_NUM_EPOCH: u32 = 0;
pub const POLICY_EXCITED_NUM_EPOCH: u32 = 9999;
