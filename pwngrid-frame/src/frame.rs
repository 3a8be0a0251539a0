//! Frame classification
//!
//! The first two bytes of every 802.11 frame are decoded once into a
//! [`FrameKind`]; everything downstream matches on that enum.
//!
//! ```text
//! Frame Control (2 bytes, little-endian)
//!   bits 2-3  type     (0 = mgmt, 1 = ctrl, 2 = data)
//!   bits 4-7  subtype
//!   bit  8    to DS
//!   bit  9    from DS
//! Duration (2) | Addr1 (6) | Addr2 (6) | Addr3 (6) | Seq (2) | [Addr4 (6)] | [QoS (2)]
//! ```

use pwngrid_core::MacAddr;
use thiserror::Error;

use crate::ie::{self, Elements};

/// Minimum management header length
pub const MIN_HEADER_LEN: usize = 24;

/// Offset of the first element in beacons and probe responses
/// (24-byte header, 8-byte timestamp, 2-byte interval, 2-byte capability)
pub const BEACON_BODY_OFFSET: usize = 36;

/// Offset of the first element in probe requests
pub const PROBE_REQUEST_BODY_OFFSET: usize = 24;

const ADDR1: usize = 4;
const ADDR2: usize = 10;
const ADDR3: usize = 16;
const ADDR4: usize = 24;

/// Why a buffer could not be classified
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame of {len} bytes is shorter than the {MIN_HEADER_LEN}-byte header")]
    Undersized { len: usize },

    #[error("{what} needs {needed} bytes, {len} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        len: usize,
    },

    #[error("reserved frame type {0}")]
    ReservedType(u8),
}

impl From<FrameError> for pwngrid_core::Error {
    fn from(e: FrameError) -> Self {
        pwngrid_core::Error::FrameParsing(e.to_string())
    }
}

/// Management frame subtypes the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementSubtype {
    AssociationRequest,
    ProbeRequest,
    ProbeResponse,
    Beacon,
    Authentication,
    Deauthentication,
    Other(u8),
}

impl ManagementSubtype {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x0 => ManagementSubtype::AssociationRequest,
            0x4 => ManagementSubtype::ProbeRequest,
            0x5 => ManagementSubtype::ProbeResponse,
            0x8 => ManagementSubtype::Beacon,
            0xB => ManagementSubtype::Authentication,
            0xC => ManagementSubtype::Deauthentication,
            other => ManagementSubtype::Other(other),
        }
    }
}

/// Typed frame class derived from the frame control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Management(ManagementSubtype),
    Control,
    Data { to_ds: bool, from_ds: bool, qos: bool },
}

impl FrameKind {
    /// Decode the first two header bytes
    pub fn from_frame_control(fc0: u8, fc1: u8) -> Result<Self, FrameError> {
        let frame_type = (fc0 >> 2) & 0x03;
        let subtype = (fc0 >> 4) & 0x0F;
        match frame_type {
            0 => Ok(FrameKind::Management(ManagementSubtype::from_u8(subtype))),
            1 => Ok(FrameKind::Control),
            2 => Ok(FrameKind::Data {
                to_ds: fc1 & 0x01 != 0,
                from_ds: fc1 & 0x02 != 0,
                qos: subtype & 0x08 != 0,
            }),
            other => Err(FrameError::ReservedType(other)),
        }
    }
}

/// Classified, borrowed view of a raw frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    bytes: &'a [u8],
    kind: FrameKind,
    addr1: MacAddr,
    addr2: MacAddr,
    addr3: MacAddr,
    addr4: Option<MacAddr>,
}

impl<'a> Frame<'a> {
    /// Classify a buffer; buffers shorter than the header are rejected
    pub fn classify(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_HEADER_LEN {
            return Err(FrameError::Undersized { len: bytes.len() });
        }

        let kind = FrameKind::from_frame_control(bytes[0], bytes[1])?;
        let addr4 = match kind {
            FrameKind::Data {
                to_ds: true,
                from_ds: true,
                ..
            } => bytes.get(ADDR4..ADDR4 + 6).and_then(MacAddr::from_slice),
            _ => None,
        };

        Ok(Self {
            bytes,
            kind,
            addr1: mac_at(bytes, ADDR1),
            addr2: mac_at(bytes, ADDR2),
            addr3: mac_at(bytes, ADDR3),
            addr4,
        })
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Addr1 (receiver / destination)
    pub fn receiver(&self) -> MacAddr {
        self.addr1
    }

    /// Addr2 (transmitter / source)
    pub fn transmitter(&self) -> MacAddr {
        self.addr2
    }

    pub fn addr3(&self) -> MacAddr {
        self.addr3
    }

    pub fn addr4(&self) -> Option<MacAddr> {
        self.addr4
    }

    /// BSSID according to the DS bits.
    ///
    /// Management: addr3. Data: addr3 (no DS / to DS), addr2 (from DS),
    /// addr4 (WDS, falling back to addr3 when the frame is too short).
    pub fn bssid(&self) -> MacAddr {
        match self.kind {
            FrameKind::Data {
                to_ds: false,
                from_ds: true,
                ..
            } => self.addr2,
            FrameKind::Data {
                to_ds: true,
                from_ds: true,
                ..
            } => self.addr4.unwrap_or(self.addr3),
            _ => self.addr3,
        }
    }

    /// MAC header length, including addr4 and QoS control for data frames
    pub fn header_len(&self) -> usize {
        match self.kind {
            FrameKind::Data { to_ds, from_ds, qos } => {
                let mut len = MIN_HEADER_LEN;
                if to_ds && from_ds {
                    len += 6;
                }
                if qos {
                    len += 2;
                }
                len
            }
            _ => MIN_HEADER_LEN,
        }
    }

    pub fn is_management(&self, subtype: ManagementSubtype) -> bool {
        self.kind == FrameKind::Management(subtype)
    }

    pub fn is_beacon(&self) -> bool {
        self.is_management(ManagementSubtype::Beacon)
    }

    pub fn is_probe_request(&self) -> bool {
        self.is_management(ManagementSubtype::ProbeRequest)
    }

    pub fn is_probe_response(&self) -> bool {
        self.is_management(ManagementSubtype::ProbeResponse)
    }

    /// Lazily scan elements starting at `offset`
    pub fn elements(&self, offset: usize) -> Elements<'a> {
        Elements::new(self.bytes, offset)
    }

    /// SSID advertised by a beacon / probe response, or asked for by a probe request
    pub fn ssid(&self) -> Option<String> {
        let offset = match self.kind {
            FrameKind::Management(ManagementSubtype::Beacon)
            | FrameKind::Management(ManagementSubtype::ProbeResponse) => BEACON_BODY_OFFSET,
            FrameKind::Management(ManagementSubtype::ProbeRequest) => PROBE_REQUEST_BODY_OFFSET,
            _ => return None,
        };
        ie::ssid(self.elements(offset))
    }
}

fn mac_at(bytes: &[u8], offset: usize) -> MacAddr {
    bytes
        .get(offset..offset + 6)
        .and_then(MacAddr::from_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(fc0: u8, fc1: u8) -> Vec<u8> {
        let mut frame = vec![fc0, fc1, 0x00, 0x00];
        frame.extend_from_slice(&[0x11; 6]); // addr1
        frame.extend_from_slice(&[0x22; 6]); // addr2
        frame.extend_from_slice(&[0x33; 6]); // addr3
        frame.extend_from_slice(&[0x00, 0x00]); // seq
        frame
    }

    #[test]
    fn test_undersized_rejected() {
        for len in 0..MIN_HEADER_LEN {
            let buf = vec![0x80; len];
            assert_eq!(
                Frame::classify(&buf).unwrap_err(),
                FrameError::Undersized { len }
            );
        }
    }

    #[test]
    fn test_reserved_type_rejected() {
        let buf = header(0x0C, 0x00);
        assert_eq!(Frame::classify(&buf).unwrap_err(), FrameError::ReservedType(3));
    }

    #[test]
    fn test_management_subtypes() {
        let cases = [
            (0x80, ManagementSubtype::Beacon),
            (0x40, ManagementSubtype::ProbeRequest),
            (0x50, ManagementSubtype::ProbeResponse),
            (0xB0, ManagementSubtype::Authentication),
            (0x00, ManagementSubtype::AssociationRequest),
            (0xC0, ManagementSubtype::Deauthentication),
            (0xA0, ManagementSubtype::Other(0xA)),
        ];
        for (fc0, subtype) in cases {
            let buf = header(fc0, 0x00);
            let frame = Frame::classify(&buf).unwrap();
            assert_eq!(frame.kind(), FrameKind::Management(subtype));
            assert_eq!(frame.bssid(), MacAddr([0x33; 6]));
        }
    }

    #[test]
    fn test_data_bssid_by_ds_bits() {
        // no DS -> addr3
        let frame_buf = header(0x08, 0x00);
        assert_eq!(Frame::classify(&frame_buf).unwrap().bssid(), MacAddr([0x33; 6]));

        // to DS -> addr3
        let frame_buf = header(0x08, 0x01);
        assert_eq!(Frame::classify(&frame_buf).unwrap().bssid(), MacAddr([0x33; 6]));

        // from DS -> addr2
        let frame_buf = header(0x08, 0x02);
        assert_eq!(Frame::classify(&frame_buf).unwrap().bssid(), MacAddr([0x22; 6]));

        // WDS -> addr4
        let mut frame_buf = header(0x08, 0x03);
        frame_buf.extend_from_slice(&[0x44; 6]);
        let frame = Frame::classify(&frame_buf).unwrap();
        assert_eq!(frame.bssid(), MacAddr([0x44; 6]));
        assert_eq!(frame.header_len(), 30);

        // WDS without room for addr4 -> addr3
        let frame_buf = header(0x08, 0x03);
        assert_eq!(Frame::classify(&frame_buf).unwrap().bssid(), MacAddr([0x33; 6]));
    }

    #[test]
    fn test_qos_header_len() {
        let buf = header(0x88, 0x02);
        let frame = Frame::classify(&buf).unwrap();
        assert_eq!(
            frame.kind(),
            FrameKind::Data {
                to_ds: false,
                from_ds: true,
                qos: true
            }
        );
        assert_eq!(frame.header_len(), 26);
    }

    #[test]
    fn test_beacon_ssid() {
        let mut buf = header(0x80, 0x00);
        buf.extend_from_slice(&[0u8; 12]);
        buf.extend_from_slice(&[0x00, 0x04, b'h', b'o', b'm', b'e']);
        let frame = Frame::classify(&buf).unwrap();
        assert_eq!(frame.ssid().as_deref(), Some("home"));
    }

    #[test]
    fn test_probe_request_ssid() {
        let mut buf = header(0x40, 0x00);
        buf.extend_from_slice(&[0x00, 0x03, b'l', b'a', b'b']);
        let frame = Frame::classify(&buf).unwrap();
        assert_eq!(frame.ssid().as_deref(), Some("lab"));
        assert_eq!(frame.transmitter(), MacAddr([0x22; 6]));
    }
}
