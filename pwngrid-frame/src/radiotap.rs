//! Radiotap header stripping for captured frames
//!
//! Only the first presence word is interpreted, and only as far as the
//! antenna signal field. Later words are skipped by the header length.

use pwngrid_core::Channel;

use crate::frame::FrameError;

const PRESENT_TSFT: u32 = 1 << 0;
const PRESENT_FLAGS: u32 = 1 << 1;
const PRESENT_RATE: u32 = 1 << 2;
const PRESENT_CHANNEL: u32 = 1 << 3;
const PRESENT_FHSS: u32 = 1 << 4;
const PRESENT_ANTENNA_SIGNAL: u32 = 1 << 5;
const PRESENT_EXT: u32 = 1 << 31;

/// Flags field bit: frame includes FCS
const FLAG_FCS: u8 = 0x10;
const FCS_LEN: usize = 4;

const FIXED_HEADER_LEN: usize = 8;

/// Radio metadata recovered from the radiotap header
#[derive(Debug, Clone, Copy)]
pub struct Radiotap<'a> {
    /// 802.11 frame with radiotap header and FCS removed
    pub frame: &'a [u8],
    /// Antenna signal in dBm
    pub rssi: Option<i8>,
    pub channel: Option<Channel>,
}

/// Strip the radiotap header (and trailing FCS, if flagged) from `data`
pub fn strip(data: &[u8]) -> Result<Radiotap<'_>, FrameError> {
    if data.len() < FIXED_HEADER_LEN {
        return Err(FrameError::Truncated {
            what: "radiotap header",
            needed: FIXED_HEADER_LEN,
            len: data.len(),
        });
    }

    let header_len = u16::from_le_bytes([data[2], data[3]]) as usize;
    if header_len < FIXED_HEADER_LEN || header_len > data.len() {
        return Err(FrameError::Truncated {
            what: "radiotap header",
            needed: header_len.max(FIXED_HEADER_LEN),
            len: data.len(),
        });
    }
    let header = &data[..header_len];
    let present = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    // skip extended presence words
    let mut offset = FIXED_HEADER_LEN;
    let mut word = present;
    while word & PRESENT_EXT != 0 {
        let Some(next) = header.get(offset..offset + 4) else {
            return Err(FrameError::Truncated {
                what: "radiotap presence bitmap",
                needed: offset + 4,
                len: header_len,
            });
        };
        word = u32::from_le_bytes([next[0], next[1], next[2], next[3]]);
        offset += 4;
    }

    let mut cursor = Cursor { header, offset };
    let mut flags = 0u8;
    let mut channel = None;
    let mut rssi = None;

    if present & PRESENT_TSFT != 0 {
        cursor.field(8, 8);
    }
    if present & PRESENT_FLAGS != 0 {
        flags = cursor.field(1, 1).map_or(0, |f| f[0]);
    }
    if present & PRESENT_RATE != 0 {
        cursor.field(1, 1);
    }
    if present & PRESENT_CHANNEL != 0 {
        channel = cursor
            .field(2, 4)
            .and_then(|f| channel_from_freq(u16::from_le_bytes([f[0], f[1]])));
    }
    if present & PRESENT_FHSS != 0 {
        cursor.field(1, 2);
    }
    if present & PRESENT_ANTENNA_SIGNAL != 0 {
        rssi = cursor.field(1, 1).map(|f| f[0] as i8);
    }

    let mut frame = &data[header_len..];
    if flags & FLAG_FCS != 0 && frame.len() >= FCS_LEN {
        frame = &frame[..frame.len() - FCS_LEN];
    }

    Ok(Radiotap {
        frame,
        rssi,
        channel,
    })
}

struct Cursor<'a> {
    header: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Align, then take `size` bytes
    fn field(&mut self, align: usize, size: usize) -> Option<&'a [u8]> {
        let start = self.offset.next_multiple_of(align);
        let bytes = self.header.get(start..start + size)?;
        self.offset = start + size;
        Some(bytes)
    }
}

/// 2.4 GHz centre frequency to channel number
pub fn channel_from_freq(mhz: u16) -> Option<Channel> {
    match mhz {
        2484 => Channel::new(14),
        2412..=2472 if (mhz - 2407) % 5 == 0 => Channel::new(((mhz - 2407) / 5) as u8),
        _ => None,
    }
}
