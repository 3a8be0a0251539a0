//! Management frame builders
//!
//! Frames are assembled into a [`BytesMut`] without FCS; the radio appends it.

use bytes::{BufMut, BytesMut};
use pwngrid_core::{Channel, Error, MacAddr, Result};

use crate::frame::MIN_HEADER_LEN;
use crate::ie::{MAX_SSID_LEN, TAG_DS_PARAMS, TAG_SSID, TAG_SUPPORTED_RATES};

/// Frame control byte 0 per management subtype
pub mod fc {
    pub const ASSOCIATION_REQUEST: u8 = 0x00;
    pub const PROBE_RESPONSE: u8 = 0x50;
    pub const BEACON: u8 = 0x80;
    pub const AUTHENTICATION: u8 = 0xB0;
    pub const DEAUTHENTICATION: u8 = 0xC0;
}

/// Reason 2: previous authentication no longer valid
pub const REASON_PREV_AUTH_INVALID: u16 = 0x0002;

/// Beacon interval in TU
pub const BEACON_INTERVAL: u16 = 0x0064;

/// 1, 2, 5.5 and 11 Mbit/s, all basic
pub const BASIC_RATES: [u8; 4] = [0x82, 0x84, 0x8b, 0x96];

/// Minimal WPA2-PSK RSN element (CCMP group and pairwise, PSK AKM)
pub const RSN_WPA2_PSK: [u8; 22] = [
    0x30, 0x14, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01,
    0x00, 0x00, 0x0f, 0xac, 0x02, 0x00, 0x00,
];

const DEAUTH_DURATION: u16 = 0x013a;
const DEAUTH_SEQ_CTL: u16 = 0xfff0;

/// Fixed fields of a beacon / probe response after the MAC header
const FIXED_FIELDS_LEN: usize = 12;

/// 24-byte management header
fn management_header(
    buf: &mut BytesMut,
    fc0: u8,
    duration: u16,
    addr1: MacAddr,
    addr2: MacAddr,
    addr3: MacAddr,
    seq_ctl: u16,
) {
    buf.put_u8(fc0);
    buf.put_u8(0x00);
    buf.put_u16_le(duration);
    buf.put_slice(addr1.as_bytes());
    buf.put_slice(addr2.as_bytes());
    buf.put_slice(addr3.as_bytes());
    buf.put_u16_le(seq_ctl);
}

fn put_element(buf: &mut BytesMut, tag: u8, value: &[u8]) {
    buf.put_u8(tag);
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
}

fn check_ssid(ssid: &str) -> Result<()> {
    if ssid.len() > MAX_SSID_LEN {
        return Err(Error::FrameConstruction(format!(
            "SSID of {} bytes exceeds {MAX_SSID_LEN}",
            ssid.len()
        )));
    }
    Ok(())
}

/// Broadcast beacon header (MAC header plus zeroed timestamp, interval,
/// ESS|privacy|short-slot capability) ready for elements to be appended
pub fn beacon_header(source: MacAddr, bssid: MacAddr, seq_ctl: u16) -> BytesMut {
    let mut buf = BytesMut::with_capacity(MIN_HEADER_LEN + FIXED_FIELDS_LEN);
    management_header(
        &mut buf,
        fc::BEACON,
        0,
        MacAddr::broadcast(),
        source,
        bssid,
        seq_ctl,
    );
    buf.put_u64_le(0);
    buf.put_u16_le(BEACON_INTERVAL);
    buf.put_slice(&[0x11, 0x04]);
    buf
}

/// Deauthentication from `bssid` to `target`
pub fn deauthentication(bssid: MacAddr, target: MacAddr, reason: u16) -> BytesMut {
    let mut buf = BytesMut::with_capacity(MIN_HEADER_LEN + 2);
    management_header(
        &mut buf,
        fc::DEAUTHENTICATION,
        DEAUTH_DURATION,
        target,
        bssid,
        bssid,
        DEAUTH_SEQ_CTL,
    );
    buf.put_u16_le(reason);
    buf
}

/// Probe response from a forged access point advertising `ssid` with WPA2-PSK
pub fn probe_response(
    client: MacAddr,
    ap: MacAddr,
    ssid: &str,
    channel: Channel,
) -> Result<BytesMut> {
    check_ssid(ssid)?;

    let mut buf = BytesMut::with_capacity(
        MIN_HEADER_LEN + FIXED_FIELDS_LEN + 2 + ssid.len() + 6 + 3 + RSN_WPA2_PSK.len(),
    );
    management_header(&mut buf, fc::PROBE_RESPONSE, 0, client, ap, ap, 0);
    buf.put_u64_le(0);
    buf.put_u16_le(BEACON_INTERVAL);
    buf.put_slice(&[0x21, 0x04]);

    put_element(&mut buf, TAG_SSID, ssid.as_bytes());
    put_element(&mut buf, TAG_SUPPORTED_RATES, &BASIC_RATES);
    put_element(&mut buf, TAG_DS_PARAMS, &[channel.number()]);
    buf.put_slice(&RSN_WPA2_PSK);

    Ok(buf)
}

/// Open-system authentication request (sequence 1) from `client` to `ap`
pub fn authentication_request(ap: MacAddr, client: MacAddr) -> BytesMut {
    let mut buf = BytesMut::with_capacity(MIN_HEADER_LEN + 6);
    management_header(&mut buf, fc::AUTHENTICATION, 0, ap, client, ap, 0);
    buf.put_u16_le(0); // open system
    buf.put_u16_le(1); // transaction sequence
    buf.put_u16_le(0); // status
    buf
}

/// Association request from `client` to `ap` for `ssid`
pub fn association_request(ap: MacAddr, client: MacAddr, ssid: &str) -> Result<BytesMut> {
    check_ssid(ssid)?;

    let mut buf = BytesMut::with_capacity(MIN_HEADER_LEN + 4 + 2 + ssid.len() + 6);
    management_header(&mut buf, fc::ASSOCIATION_REQUEST, 0, ap, client, ap, 0);
    buf.put_slice(&[0x31, 0x04]);
    buf.put_u16_le(BEACON_INTERVAL); // listen interval
    put_element(&mut buf, TAG_SSID, ssid.as_bytes());
    put_element(&mut buf, TAG_SUPPORTED_RATES, &BASIC_RATES);
    Ok(buf)
}
