//! Receive-path tests driven by synthetic frames

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::BufMut;
use parking_lot::Mutex;
use pwngrid_attack::lure_channel;
use pwngrid_core::{
    Channel, Error, GridConfig, Mood, MoodSink, Position, PositionSource, PromiscuousFilter,
    Radio, RadioFrame, Result, RxCallback, Store, TargetScope,
};
use pwngrid_frame::builder;
use pwngrid_frame::eapol::EAPOL_SNAP;
use pwngrid_proto::grid::constants::{ADVERTISE_SEQ_CTL, TAG_PAYLOAD};
use pwngrid_proto::grid::{ADVERTISE_BSSID, SENTINEL_SOURCE};
use pwngrid_proto::{Advertisement, Policy};

use super::*;
use crate::pipeline::CapturePipeline;

// ===== Fakes =====

#[derive(Default)]
struct MemoryStore {
    packets: Mutex<Vec<CapturedPacket>>,
    friends: Mutex<Vec<PeerRecord>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn persist_packet(&self, packet: CapturedPacket) -> Result<()> {
        self.packets.lock().push(packet);
        Ok(())
    }

    async fn persist_friend(&self, peer: PeerRecord) -> Result<()> {
        self.friends.lock().push(peer);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingMood {
    events: Mutex<Vec<(Mood, String, String, i32)>>,
}

impl MoodSink for RecordingMood {
    fn show_event(&self, mood: Mood, message: &str, peer_name: &str, peer_rssi: i32) {
        self.events
            .lock()
            .push((mood, message.to_string(), peer_name.to_string(), peer_rssi));
    }
}

struct FixedPosition {
    available: bool,
}

impl PositionSource for FixedPosition {
    fn start(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(Error::invalid_parameter("gps", "no receiver"))
        }
    }

    fn position(&self) -> Option<Position> {
        Some(Position {
            latitude: 45.07,
            longitude: 7.68,
            utc: "12:00:00".to_string(),
        })
    }
}

/// Keeps the installed callback so tests can push frames through it
#[derive(Default)]
struct CallbackRadio {
    callback: Mutex<Option<RxCallback>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl Radio for CallbackRadio {
    fn channel(&self) -> Channel {
        Channel::default()
    }

    fn set_channel(&self, _channel: Channel) -> Result<()> {
        Ok(())
    }

    fn enable_promiscuous(&self, filter: PromiscuousFilter, callback: RxCallback) -> Result<()> {
        assert_eq!(filter, PromiscuousFilter::MGMT_AND_DATA);
        *self.callback.lock() = Some(callback);
        Ok(())
    }

    fn transmit_raw(&self, frame: &[u8]) -> Result<()> {
        self.sent.lock().push(frame.to_vec());
        Ok(())
    }
}

// ===== Helpers =====

const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
const CLIENT: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
const PMKID: [u8; 16] = [
    0x5a, 0x31, 0x9c, 0x07, 0xe2, 0x44, 0x10, 0xbb, 0x8d, 0x6f, 0x02, 0xc3, 0x71, 0x19, 0xae, 0xf0,
];

struct Harness {
    sniffer: Arc<Sniffer>,
    store: Arc<MemoryStore>,
    mood: Arc<RecordingMood>,
    stats: Arc<GridStats>,
}

fn harness(config: GridConfig) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let mood = Arc::new(RecordingMood::default());
    let stats = Arc::new(GridStats::new());
    let (pipeline, workers) = CapturePipeline::new(config.queue_capacity, store.clone(), stats.clone());
    let _ = workers.spawn();
    let sniffer = Sniffer::new(&config, pipeline, stats.clone()).with_mood(mood.clone());
    Harness {
        sniffer: Arc::new(sniffer),
        store,
        mood,
        stats,
    }
}

fn ch(n: u8) -> Channel {
    Channel::new(n).unwrap()
}

fn beacon(source: MacAddr, ssid: &str) -> Vec<u8> {
    let mut frame = builder::beacon_header(source, source, 0);
    frame.put_u8(0x00);
    frame.put_u8(ssid.len() as u8);
    frame.put_slice(ssid.as_bytes());
    frame.to_vec()
}

fn probe_request(client: MacAddr, ssid: &str) -> Vec<u8> {
    let mut frame = vec![0x40, 0x00, 0x00, 0x00];
    frame.extend_from_slice(MacAddr::broadcast().as_bytes());
    frame.extend_from_slice(client.as_bytes());
    frame.extend_from_slice(MacAddr::broadcast().as_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.push(0x00);
    frame.push(ssid.len() as u8);
    frame.extend_from_slice(ssid.as_bytes());
    frame
}

/// EAPOL message 1 from `AP` to `CLIENT` (no DS bits, so the BSSID is addr3)
fn eapol_m1() -> Vec<u8> {
    let mut frame = vec![0x08, 0x00, 0x3a, 0x01];
    frame.extend_from_slice(AP.as_bytes());
    frame.extend_from_slice(CLIENT.as_bytes());
    frame.extend_from_slice(AP.as_bytes());
    frame.extend_from_slice(&[0x00, 0x00]);
    frame.extend_from_slice(&EAPOL_SNAP);

    let mut rsn = vec![0x01, 0x00, 0x00, 0x0f, 0xac, 0x04];
    rsn.extend_from_slice(&[0x01, 0x00, 0x00, 0x0f, 0xac, 0x04]);
    rsn.extend_from_slice(&[0x01, 0x00, 0x00, 0x0f, 0xac, 0x02]);
    rsn.extend_from_slice(&[0x0c, 0x00, 0x00, 0x01]);
    rsn.extend_from_slice(&PMKID);
    let mut key_data = vec![0x30, rsn.len() as u8];
    key_data.extend_from_slice(&rsn);

    frame.extend_from_slice(&[0x02, 0x03, 0x00, 0x00, 0x02, 0x00, 0x8a]);
    frame.resize(24 + 8 + 97, 0x00);
    frame.extend_from_slice(&(key_data.len() as u16).to_be_bytes());
    frame.extend_from_slice(&key_data);
    frame
}

fn advertisement(identity: &str, name: &str) -> Advertisement {
    Advertisement {
        pal: true,
        name: name.to_string(),
        face: "(^_^)".to_string(),
        epoch: 1,
        grid_version: "1.10.3".to_string(),
        identity: identity.to_string(),
        pwnd_run: 4,
        pwnd_tot: 120,
        session_id: "de:ad:be:ef:00:01".to_string(),
        timestamp: 0,
        uptime: 3600,
        version: "1.8.4".to_string(),
        policy: Policy::default(),
    }
}

/// Serialized advertisement cut into `parts` sentinel beacons, one element each
fn sentinel_beacons(adv: &Advertisement, parts: usize) -> Vec<Vec<u8>> {
    let json = adv.to_wire_json().unwrap();
    json.chunks(json.len().div_ceil(parts))
        .map(|chunk| {
            let mut frame =
                builder::beacon_header(SENTINEL_SOURCE, ADVERTISE_BSSID, ADVERTISE_SEQ_CTL);
            frame.put_u8(TAG_PAYLOAD);
            frame.put_u8(chunk.len() as u8);
            frame.put_slice(chunk);
            frame.to_vec()
        })
        .collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

const IDENTITY: &str = "32e9f315e92d974342c93d0fd952a914bfb4e6838953536ea6f63d54db6b9610";

// ===== Discovery =====

#[tokio::test]
async fn test_three_beacon_advertisement_adds_one_peer() {
    let h = harness(GridConfig::default());
    let adv = advertisement(IDENTITY, "zesty-otter");
    let frames = sentinel_beacons(&adv, 3);
    assert_eq!(frames.len(), 3);

    h.sniffer.handle_frame(RadioFrame::new(&frames[0], -61, ch(6)));
    h.sniffer.handle_frame(RadioFrame::new(&frames[1], -60, ch(6)));
    assert!(h.sniffer.peers().is_empty());

    h.sniffer.handle_frame(RadioFrame::new(&frames[2], -58, ch(6)));
    let peers = h.sniffer.peers();
    assert_eq!(peers.len(), 1);

    let peer = &peers[0];
    assert_eq!(peer.identity, IDENTITY);
    assert_eq!(peer.name, "zesty-otter");
    assert_eq!(peer.face, "(^_^)");
    assert_eq!(peer.epoch, 1);
    assert_eq!(peer.grid_version, "1.10.3");
    assert_eq!(peer.pwnd_run, 4);
    assert_eq!(peer.pwnd_tot, 120);
    assert_eq!(peer.session_id, "de:ad:be:ef:00:01");
    assert_eq!(peer.uptime, 3600);
    assert_eq!(peer.version, "1.8.4");
    assert_eq!(peer.rssi, -58);
    assert_eq!(peer.channel, 6);
    assert!(!peer.gone);

    // sentinel traffic is not an access point
    assert!(h.sniffer.registry().is_empty());

    settle().await;
    assert_eq!(h.store.friends.lock().len(), 1);
    let snap = h.stats.snapshot();
    assert_eq!(snap.friends_run, 1);
    assert_eq!(snap.last_friend_name, "zesty-otter");
    assert_eq!(h.sniffer.closest_peer_rssi(), -58);

    let events = h.mood.events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, Mood::Friendly);
}

#[tokio::test]
async fn test_resighting_refreshes_without_new_friend() {
    let h = harness(GridConfig::default());
    let frame = advertisement(IDENTITY, "zesty-otter").encode().unwrap().to_vec();

    h.sniffer.handle_frame(RadioFrame::new(&frame, -70, ch(1)));
    h.sniffer.handle_frame(RadioFrame::new(&frame, -40, ch(1)));

    let peers = h.sniffer.peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].rssi, -40);

    settle().await;
    assert_eq!(h.store.friends.lock().len(), 1);
    assert_eq!(h.stats.snapshot().friends_run, 1);
}

#[tokio::test]
async fn test_full_peer_table_rejects_new_identity() {
    let config = GridConfig {
        peer_capacity: 1,
        ..Default::default()
    };
    let h = harness(config);

    for (identity, name) in [("aaaa", "first"), ("bbbb", "second")] {
        let frame = advertisement(identity, name).encode().unwrap().to_vec();
        h.sniffer.handle_frame(RadioFrame::new(&frame, -50, ch(11)));
    }

    let peers = h.sniffer.peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].name, "first");
    assert_eq!(h.stats.snapshot().peers_rejected, 1);
}

#[tokio::test]
async fn test_gone_peers_drop_out_of_closest() {
    let config = GridConfig {
        peer_gone_after: Duration::from_secs(120),
        ..Default::default()
    };
    let h = harness(config);
    let frame = advertisement(IDENTITY, "zesty-otter").encode().unwrap().to_vec();
    h.sniffer.handle_frame(RadioFrame::new(&frame, -45, ch(3)));
    assert_eq!(h.sniffer.active_peers(), 1);

    let later = Instant::now() + Duration::from_secs(121);
    assert_eq!(h.sniffer.mark_gone_peers(later), 1);
    assert_eq!(h.sniffer.active_peers(), 0);
    assert_eq!(h.sniffer.closest_peer_rssi(), NO_PEERS_RSSI);
}

#[tokio::test]
async fn test_position_capability_is_optional() {
    let store = Arc::new(MemoryStore::default());
    let stats = Arc::new(GridStats::new());
    let (pipeline, _workers) = CapturePipeline::new(4, store, stats.clone());

    let sniffer = Sniffer::new(&GridConfig::default(), pipeline.clone(), stats.clone())
        .with_position(Arc::new(FixedPosition { available: false }));
    assert!(sniffer.position.is_none());

    let sniffer = Sniffer::new(&GridConfig::default(), pipeline, stats)
        .with_position(Arc::new(FixedPosition { available: true }));
    assert!(sniffer.position.is_some());

    let frame = advertisement(IDENTITY, "zesty-otter").encode().unwrap().to_vec();
    sniffer.handle_frame(RadioFrame::new(&frame, -45, ch(3)));
    assert_eq!(sniffer.active_peers(), 1);
}

// ===== Access points =====

#[tokio::test]
async fn test_beacons_fill_registry_and_ssid_book() {
    let h = harness(GridConfig::default());
    let frame = beacon(AP, "lab");

    for _ in 0..5 {
        h.sniffer.handle_frame(RadioFrame::new(&frame, -30, ch(6)));
    }
    h.sniffer.handle_frame(RadioFrame::new(&frame, -30, ch(11)));

    assert_eq!(h.sniffer.registry().len(), 2);
    assert_eq!(h.sniffer.ssids().ssid(&AP).as_deref(), Some("lab"));
    let snap = h.stats.snapshot();
    assert_eq!(snap.aps_seen, 1);
    assert_eq!(snap.frames_received, 6);
}

#[tokio::test]
async fn test_undersized_frames_are_counted() {
    let h = harness(GridConfig::default());
    h.sniffer.handle_frame(RadioFrame::new(&[0x80, 0x00, 0x00], 0, ch(1)));
    let snap = h.stats.snapshot();
    assert_eq!(snap.frames_received, 1);
    assert_eq!(snap.frames_malformed, 1);
}

// ===== EAPOL / PMKID =====

#[tokio::test]
async fn test_eapol_queues_packet_and_pmkid_line() {
    let h = harness(GridConfig::default());
    h.sniffer.handle_frame(RadioFrame::new(&beacon(AP, "lab-net"), -30, ch(6)));

    let frame = eapol_m1();
    h.sniffer.handle_frame(RadioFrame::new(&frame, -30, ch(6)));
    settle().await;

    let packets = h.store.packets.lock();
    assert_eq!(packets.len(), 2);

    assert_eq!(packets[0].kind, CaptureKind::Eapol);
    assert_eq!(packets[0].bssid, "00:11:22:33:44:55");
    assert_eq!(packets[0].raw, frame);
    assert_eq!(packets[0].channel, 6);

    assert_eq!(packets[1].kind, CaptureKind::Pmkid);
    assert_eq!(
        String::from_utf8(packets[1].raw.clone()).unwrap(),
        "5a319c07e24410bb8d6f02c37119aef0*001122334455*66778899aabb*lab-net"
    );

    let snap = h.stats.snapshot();
    assert_eq!(snap.eapol_frames, 1);
    assert_eq!(snap.handshakes, 1);
    assert_eq!(snap.pmkids, 1);
    assert_eq!(snap.pwnd_run, 1);

    let events = h.mood.events.lock();
    assert_eq!(events[0].0, Mood::Excited);
    assert_eq!(events[0].1, "I love EAPOLs!");
    assert_eq!(events[0].3, NO_PEERS_RSSI);
}

#[tokio::test]
async fn test_eapol_truncated_to_max_packet_save() {
    let config = GridConfig {
        max_packet_save: 64,
        ..Default::default()
    };
    let h = harness(config);
    h.sniffer.handle_frame(RadioFrame::new(&eapol_m1(), -30, ch(6)));
    settle().await;

    let packets = h.store.packets.lock();
    assert_eq!(packets[0].raw.len(), 64);
}

#[tokio::test]
async fn test_friendly_mode_skips_eapol() {
    let config = GridConfig {
        mode: pwngrid_core::OperatingMode::Friendly,
        ..Default::default()
    };
    let h = harness(config);
    h.sniffer.handle_frame(RadioFrame::new(&eapol_m1(), -30, ch(6)));
    settle().await;

    assert!(h.store.packets.lock().is_empty());
    assert_eq!(h.stats.snapshot().eapol_frames, 0);
}

// ===== Lures =====

#[tokio::test]
async fn test_aggressive_mode_feeds_lure_worker() {
    let config = GridConfig {
        mode: pwngrid_core::OperatingMode::Aggressive,
        lure_rate: 1,
        lure_assoc_gap: Duration::from_millis(1),
        scope: TargetScope::new().with_ssid("lab"),
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::default());
    let stats = Arc::new(GridStats::new());
    let (pipeline, _workers) = CapturePipeline::new(4, store, stats.clone());
    let ssids = Arc::new(SsidBook::new());
    let (dispatcher, worker) = lure_channel(&config, ssids.clone());

    let sniffer = Sniffer::new(&config, pipeline, stats)
        .with_registry(Arc::new(BeaconRegistry::new()), ssids)
        .with_lures(dispatcher);

    sniffer.handle_frame(RadioFrame::new(&probe_request(CLIENT, "lab"), -50, ch(6)));
    sniffer.handle_frame(RadioFrame::new(&probe_request(CLIENT, "elsewhere"), -50, ch(6)));
    sniffer.handle_frame(RadioFrame::new(&probe_request(CLIENT, ""), -50, ch(6)));
    sniffer.handle_frame(RadioFrame::new(&beacon(AP, "lab"), -50, ch(6)));
    drop(sniffer);

    let radio = Arc::new(CallbackRadio::default());
    let ctx = pwngrid_core::AttackContext::new(radio.clone());
    pwngrid_core::Attack::execute(&worker, ctx).await.unwrap();

    // probe response + auth + assoc
    let sent = radio.sent.lock();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0][0], 0x50);
    assert_eq!(sent[1][0], 0xb0);
    assert_eq!(sent[2][0], 0x00);
}

#[tokio::test]
async fn test_normal_mode_sends_no_lures() {
    let config = GridConfig {
        lure_rate: 1,
        scope: TargetScope::new().with_ssid("lab"),
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::default());
    let stats = Arc::new(GridStats::new());
    let (pipeline, _workers) = CapturePipeline::new(4, store, stats.clone());
    let (dispatcher, worker) = lure_channel(&config, Arc::new(SsidBook::new()));

    let sniffer = Sniffer::new(&config, pipeline, stats).with_lures(dispatcher);
    sniffer.handle_frame(RadioFrame::new(&probe_request(CLIENT, "lab"), -50, ch(6)));
    drop(sniffer);

    let radio = Arc::new(CallbackRadio::default());
    let ctx = pwngrid_core::AttackContext::new(radio.clone());
    pwngrid_core::Attack::execute(&worker, ctx).await.unwrap();
    assert!(radio.sent.lock().is_empty());
}

// ===== Radio wiring =====

#[tokio::test]
async fn test_install_routes_driver_callback() {
    let h = harness(GridConfig::default());
    let radio = CallbackRadio::default();
    h.sniffer.install(&radio).unwrap();

    let frame = beacon(AP, "lab");
    let callback = radio.callback.lock();
    let callback = callback.as_ref().unwrap();
    callback(RadioFrame::new(&frame, -20, ch(9)));

    assert_eq!(h.sniffer.registry().snapshot()[0].channel, ch(9));
}
