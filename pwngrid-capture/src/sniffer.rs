//! Receive path
//!
//! [`Sniffer::handle_frame`] runs in the radio driver's callback context for
//! every received frame. It must never block: shared state sits behind spin
//! locks held for one short operation, and everything slow (persistence,
//! lure transmission) is handed off through bounded queues.
//!
//! Per frame:
//!
//! - beacons and probe responses from the pwngrid sentinel go to the
//!   discovery reassembler, completed advertisements to the peer table
//! - other beacons land in the beacon registry; their SSID goes to the
//!   SSID book
//! - EAPOL data frames are counted and queued for persistence, together with
//!   a PMKID line when the key data carries one (capture modes only)
//! - in aggressive mode probe requests and beacons are offered to the lure
//!   dispatcher

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pwngrid_attack::{BeaconEntry, BeaconRegistry, LureDispatcher, SsidBook};
use pwngrid_core::{
    CaptureKind, CapturedPacket, GridConfig, MacAddr, Mood, MoodSink, NoMood, OperatingMode,
    PeerRecord, PositionSource, PromiscuousFilter, Radio, RadioFrame, Result,
};
use pwngrid_frame::ie::is_hidden_ssid;
use pwngrid_frame::{is_eapol, Frame, FrameKind, ManagementSubtype, PmkidRecord};
use pwngrid_proto::grid::is_advertisement;
use pwngrid_proto::{PeerTable, Reassembler, Upsert};
use spin::Mutex;
use tracing::{debug, info, warn};

use crate::pipeline::CapturePipeline;
use crate::stats::GridStats;

/// Reported by [`Sniffer::closest_peer_rssi`] when no peer is active
pub const NO_PEERS_RSSI: i32 = -1000;

/// Bound on distinct transmitters remembered by the AP tracker
const MAX_TRACKED_APS: usize = 4096;

pub struct Sniffer {
    mode: OperatingMode,
    max_packet_save: usize,
    peer_gone_after: Duration,
    registry: Arc<BeaconRegistry>,
    ssids: Arc<SsidBook>,
    known_aps: Mutex<HashSet<MacAddr>>,
    reassembler: Mutex<Reassembler>,
    peers: Mutex<PeerTable>,
    pipeline: CapturePipeline,
    lures: Option<LureDispatcher>,
    mood: Arc<dyn MoodSink>,
    position: Option<Arc<dyn PositionSource>>,
    stats: Arc<GridStats>,
}

impl Sniffer {
    pub fn new(config: &GridConfig, pipeline: CapturePipeline, stats: Arc<GridStats>) -> Self {
        Self {
            mode: config.mode,
            max_packet_save: config.max_packet_save,
            peer_gone_after: config.peer_gone_after,
            registry: Arc::new(BeaconRegistry::new()),
            ssids: Arc::new(SsidBook::new()),
            known_aps: Mutex::new(HashSet::new()),
            reassembler: Mutex::new(Reassembler::new(config.reassembly_timeout)),
            peers: Mutex::new(PeerTable::new(config.peer_capacity)),
            pipeline,
            lures: None,
            mood: Arc::new(NoMood),
            position: None,
            stats,
        }
    }

    /// Share an existing registry and SSID book (e.g. with a deauth engine)
    pub fn with_registry(mut self, registry: Arc<BeaconRegistry>, ssids: Arc<SsidBook>) -> Self {
        self.registry = registry;
        self.ssids = ssids;
        self
    }

    pub fn with_lures(mut self, lures: LureDispatcher) -> Self {
        self.lures = Some(lures);
        self
    }

    pub fn with_mood(mut self, mood: Arc<dyn MoodSink>) -> Self {
        self.mood = mood;
        self
    }

    /// Probe the positioning capability once; it is only kept if it starts
    pub fn with_position(mut self, source: Arc<dyn PositionSource>) -> Self {
        match source.start() {
            Ok(()) => {
                info!("Position source available");
                self.position = Some(source);
            }
            Err(e) => {
                info!(error = %e, "No position source, continuing without");
                self.position = None;
            }
        }
        self
    }

    /// Route the radio's promiscuous receive callback into this sniffer
    pub fn install(self: &Arc<Self>, radio: &dyn Radio) -> Result<()> {
        let sniffer = Arc::clone(self);
        radio.enable_promiscuous(
            PromiscuousFilter::MGMT_AND_DATA,
            Box::new(move |frame: RadioFrame<'_>| sniffer.handle_frame(frame)),
        )?;
        info!(mode = ?self.mode, "Promiscuous receive enabled");
        Ok(())
    }

    /// Process one received frame
    pub fn handle_frame(&self, rx: RadioFrame<'_>) {
        GridStats::bump(&self.stats.frames_received);

        let frame = match Frame::classify(rx.data) {
            Ok(frame) => frame,
            Err(e) => {
                GridStats::bump(&self.stats.frames_malformed);
                debug!(error = %e, "Dropping frame");
                return;
            }
        };

        match frame.kind() {
            FrameKind::Management(ManagementSubtype::Beacon)
            | FrameKind::Management(ManagementSubtype::ProbeResponse) => {
                if is_advertisement(&frame) {
                    self.handle_advertisement(&frame, &rx);
                } else {
                    self.handle_access_point(&frame, &rx);
                }
            }
            FrameKind::Management(ManagementSubtype::ProbeRequest) => {
                self.handle_probe_request(&frame, &rx);
            }
            FrameKind::Data { .. } if self.mode.captures() && is_eapol(&frame) => {
                self.handle_eapol(&frame, &rx);
            }
            _ => {}
        }
    }

    fn handle_access_point(&self, frame: &Frame<'_>, rx: &RadioFrame<'_>) {
        let mac = frame.transmitter();

        if frame.is_beacon() {
            self.registry.insert(BeaconEntry::new(mac, rx.channel));
        }
        self.track_ap(mac);

        let ssid = frame.ssid().unwrap_or_default();
        if is_hidden_ssid(ssid.as_bytes()) {
            return;
        }
        self.ssids.learn(frame.bssid(), &ssid);

        if let Some(lures) = self.lures.as_ref().filter(|_| self.mode.lures()) {
            lures.offer_beacon(frame.bssid(), &ssid);
        }
    }

    fn track_ap(&self, mac: MacAddr) {
        let inserted = {
            let mut known = self.known_aps.lock();
            known.len() < MAX_TRACKED_APS && known.insert(mac)
        };
        if inserted {
            GridStats::bump(&self.stats.aps_seen);
            GridStats::bump(&self.stats.new_aps);
        }
    }

    fn handle_probe_request(&self, frame: &Frame<'_>, rx: &RadioFrame<'_>) {
        let Some(lures) = self.lures.as_ref().filter(|_| self.mode.lures()) else {
            return;
        };
        let ssid = frame.ssid().unwrap_or_default();
        if ssid.is_empty() {
            return;
        }
        lures.offer_probe_request(frame.transmitter(), &ssid, rx.channel);
    }

    fn handle_eapol(&self, frame: &Frame<'_>, rx: &RadioFrame<'_>) {
        GridStats::bump(&self.stats.eapol_frames);
        self.stats.record_handshake();

        self.mood.show_event(
            Mood::Excited,
            "I love EAPOLs!",
            &self.stats.last_friend_name(),
            self.closest_peer_rssi(),
        );

        let bssid = frame.bssid();
        let channel = rx.channel.number();
        debug!(bssid = %bssid, channel, len = rx.len(), "EAPOL frame");
        self.pipeline.submit_packet(CapturedPacket::new(
            bssid,
            CaptureKind::Eapol,
            rx.data,
            channel,
            self.max_packet_save,
        ));

        let ssid = self.ssids.ssid(&bssid).unwrap_or_default();
        if let Some(pmkid) = PmkidRecord::extract(frame, &ssid) {
            GridStats::bump(&self.stats.pmkids);
            let line = pmkid.to_string();
            info!(ap = %pmkid.ap_mac, client = %pmkid.client_mac, ssid = %pmkid.ssid, "PMKID captured");
            self.pipeline.submit_packet(CapturedPacket::new(
                pmkid.ap_mac,
                CaptureKind::Pmkid,
                line.as_bytes(),
                channel,
                self.max_packet_save,
            ));
        }
    }

    fn handle_advertisement(&self, frame: &Frame<'_>, rx: &RadioFrame<'_>) {
        let completed = self
            .reassembler
            .lock()
            .push_frame(frame, rx.rssi, rx.channel, Instant::now());
        for peer in completed {
            self.add_peer(peer);
        }
    }

    fn add_peer(&self, peer: PeerRecord) {
        let result = self.peers.lock().upsert(peer);
        match result {
            Ok(Upsert::Refreshed) => {}
            Ok(Upsert::Inserted(peer)) => {
                self.stats.record_friend(&peer.name);
                info!(name = %peer.name, identity = %peer.identity, rssi = peer.rssi, "New friend");
                if let Some(fix) = self.position.as_ref().and_then(|p| p.position()) {
                    info!(
                        name = %peer.name,
                        latitude = fix.latitude,
                        longitude = fix.longitude,
                        utc = %fix.utc,
                        "Friend met at"
                    );
                }
                self.mood.show_event(
                    Mood::Friendly,
                    &format!("Hello {}!", peer.name),
                    &peer.name,
                    peer.rssi,
                );
                self.pipeline.submit_friend(peer);
            }
            Err(e) => {
                GridStats::bump(&self.stats.peers_rejected);
                warn!(error = %e, "Peer table full, ignoring new peer");
            }
        }
    }

    /// Flag peers silent for longer than the configured threshold
    pub fn mark_gone_peers(&self, now: Instant) -> usize {
        self.peers.lock().mark_gone_if_stale(now, self.peer_gone_after)
    }

    /// Strongest RSSI among active peers, [`NO_PEERS_RSSI`] if there are none
    pub fn closest_peer_rssi(&self) -> i32 {
        self.peers.lock().closest_active_rssi().unwrap_or(NO_PEERS_RSSI)
    }

    pub fn active_peers(&self) -> usize {
        self.peers.lock().active_count()
    }

    /// Copy of every peer record
    pub fn peers(&self) -> Vec<PeerRecord> {
        self.peers.lock().iter().cloned().collect()
    }

    pub fn registry(&self) -> &Arc<BeaconRegistry> {
        &self.registry
    }

    pub fn ssids(&self) -> &Arc<SsidBook> {
        &self.ssids
    }

    pub fn stats(&self) -> &Arc<GridStats> {
        &self.stats
    }
}

#[cfg(test)]
mod tests;
