//! Advertise encoder
//!
//! The advertisement is a JSON document serialized in field order, made
//! ASCII-only, cut into fragments of at most 255 bytes and appended to a fixed
//! beacon header as a run of vendor elements.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{BufMut, BytesMut};
use pwngrid_core::{Channel, GridConfig, Identity, PeerRecord, Radio, Result};
use pwngrid_frame::{builder, ie};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::constants::*;

/// Thresholds advertised to peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub advertise: bool,
    pub bond_encounters_factor: u32,
    pub bored_num_epoch: u32,
    pub sad_num_epoch: u32,
    pub excited_num_epoch: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            advertise: true,
            bond_encounters_factor: POLICY_BOND_ENCOUNTERS_FACTOR,
            bored_num_epoch: POLICY_BORED_NUM_EPOCH,
            sad_num_epoch: POLICY_SAD_NUM_EPOCH,
            excited_num_epoch: POLICY_EXCITED_NUM_EPOCH,
        }
    }
}

/// The JSON document exchanged between pwngrid devices.
///
/// Field order is the wire order. Every field is optional when decoding so
/// that peers running other firmware versions still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Advertisement {
    pub pal: bool,
    pub name: String,
    pub face: String,
    pub epoch: i64,
    pub grid_version: String,
    pub identity: String,
    pub pwnd_run: u64,
    pub pwnd_tot: u64,
    pub session_id: String,
    pub timestamp: i64,
    pub uptime: u64,
    pub version: String,
    pub policy: Policy,
}

impl Advertisement {
    /// Advertisement for this device
    pub fn for_device(
        identity: &dyn Identity,
        config: &GridConfig,
        face: &str,
        pwnd_run: u64,
        pwnd_tot: u64,
        uptime: Duration,
    ) -> Self {
        let mut name = identity.device_name();
        if name.is_empty() {
            name = config.device_name.clone();
        }

        Self {
            pal: true,
            name,
            face: face.to_string(),
            epoch: ADVERTISE_EPOCH,
            grid_version: config.grid_version.clone(),
            identity: identity.fingerprint(),
            pwnd_run,
            pwnd_tot,
            session_id: identity.session_id(),
            timestamp: 0,
            uptime: uptime.as_secs(),
            version: config.firmware_version.clone(),
            policy: Policy::default(),
        }
    }

    /// Peer record for a decoded advertisement received at `now`
    pub fn into_peer(self, rssi: i32, channel: Channel, now: Instant) -> PeerRecord {
        let mut peer = PeerRecord::new(self.identity, now);
        peer.name = self.name;
        peer.face = self.face;
        peer.epoch = self.epoch;
        peer.grid_version = self.grid_version;
        peer.pwnd_run = self.pwnd_run;
        peer.pwnd_tot = self.pwnd_tot;
        peer.session_id = self.session_id;
        peer.timestamp = self.timestamp;
        peer.uptime = self.uptime;
        peer.version = self.version;
        peer.rssi = rssi;
        peer.channel = channel.number();
        peer
    }

    /// ASCII-only JSON text
    pub fn to_wire_json(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(ie::sanitize_ascii(&json))
    }

    /// Complete advertisement beacon (no FCS)
    pub fn encode(&self) -> Result<BytesMut> {
        let json = self.to_wire_json()?;
        let fragments = json.len().div_ceil(MAX_FRAGMENT_LEN);

        let mut frame = builder::beacon_header(SENTINEL_SOURCE, ADVERTISE_BSSID, ADVERTISE_SEQ_CTL);
        frame.reserve(json.len() + fragments * 2);
        for chunk in json.chunks(MAX_FRAGMENT_LEN) {
            frame.put_u8(TAG_PAYLOAD);
            frame.put_u8(chunk.len() as u8);
            frame.put_slice(chunk);
        }
        Ok(frame)
    }
}

/// Sends advertisements on the radio
pub struct Advertiser {
    radio: Arc<dyn Radio>,
    settle: Duration,
}

impl Advertiser {
    pub fn new(radio: Arc<dyn Radio>, config: &GridConfig) -> Self {
        Self {
            radio,
            settle: config.channel_settle,
        }
    }

    /// Switch to `channel`, wait for the switch to settle and transmit once.
    ///
    /// Failures are returned to the caller; nothing is retried.
    pub async fn advertise(&self, channel: Channel, advertisement: &Advertisement) -> Result<()> {
        let frame = advertisement.encode()?;

        self.radio.set_channel(channel)?;
        tokio::time::sleep(self.settle).await;

        if let Err(e) = self.radio.transmit_raw(&frame) {
            warn!(channel = %channel, error = %e, "Advertisement transmit failed");
            return Err(e);
        }

        debug!(channel = %channel, len = frame.len(), "Advertisement sent");
        Ok(())
    }
}
