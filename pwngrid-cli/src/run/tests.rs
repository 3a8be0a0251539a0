use std::fs;
use std::path::Path;

use bytes::BufMut;
use clap::Parser;
use pwngrid_core::MacAddr;
use pwngrid_frame::builder;
use pwngrid_frame::eapol::EAPOL_SNAP;
use pwngrid_proto::Policy;

use super::*;
use crate::store::{FRIENDS_FILE, PACKETS_FILE};

const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
const CLIENT: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);

/// Bare 802.11 pcap (linktype 105)
fn write_pcap(path: &Path, records: &[Vec<u8>]) {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    buf.extend_from_slice(&4u16.to_le_bytes());
    buf.extend_from_slice(&[0u8; 8]);
    buf.extend_from_slice(&65535u32.to_le_bytes());
    buf.extend_from_slice(&105u32.to_le_bytes());
    for record in records {
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&(record.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(record.len() as u32).to_le_bytes());
        buf.extend_from_slice(record);
    }
    fs::write(path, buf).unwrap();
}

fn peer_advertisement() -> Vec<u8> {
    Advertisement {
        pal: true,
        name: "zesty-otter".to_string(),
        face: "(^_^)".to_string(),
        epoch: 1,
        grid_version: "1.10.3".to_string(),
        identity: "32e9f315e92d974342c93d0fd952a914bfb4e6838953536ea6f63d54db6b9610".to_string(),
        pwnd_run: 4,
        pwnd_tot: 120,
        session_id: "de:ad:be:ef:00:01".to_string(),
        timestamp: 0,
        uptime: 3600,
        version: "1.8.4".to_string(),
        policy: Policy::default(),
    }
    .encode()
    .unwrap()
    .to_vec()
}

fn ap_beacon() -> Vec<u8> {
    let mut frame = builder::beacon_header(AP, AP, 0);
    frame.put_slice(&[0x00, 0x03]);
    frame.put_slice(b"lab");
    frame.to_vec()
}

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
    rsn.extend_from_slice(&[0xab; 16]);
    let mut key_data = vec![0x30, rsn.len() as u8];
    key_data.extend_from_slice(&rsn);

    frame.extend_from_slice(&[0x02, 0x03, 0x00, 0x00, 0x02, 0x00, 0x8a]);
    frame.resize(24 + 8 + 97, 0x00);
    frame.extend_from_slice(&(key_data.len() as u16).to_be_bytes());
    frame.extend_from_slice(&key_data);
    frame
}

fn cli(pcap: &Path, out: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "pwngrid".to_string(),
        "-r".to_string(),
        pcap.display().to_string(),
        "-o".to_string(),
        out.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::try_parse_from(args).unwrap()
}

#[tokio::test]
async fn test_replay_persists_and_transmits_in_scope() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path();
    let pcap = dir.join("walk.pcap");
    write_pcap(&pcap, &[ap_beacon(), peer_advertisement(), eapol_m1(), vec![0x80]]);

    let cli = cli(
        &pcap,
        dir,
        &["-B", "00:11:22:33:44:55", "--advertise", "--deauth"],
    );
    let summary = run(&cli).await.unwrap();

    assert_eq!(summary.packets_read, 4);
    assert_eq!(summary.frames_delivered, 4);
    assert_eq!(summary.peers, 1);
    assert!(summary.advertised);
    assert_eq!(summary.deauth_targets, Some(1));
    // one advertisement plus a burst of three deauthentications
    assert_eq!(summary.frames_transmitted, 4);

    assert_eq!(summary.stats.frames_malformed, 1);
    assert_eq!(summary.stats.handshakes, 1);
    assert_eq!(summary.stats.pmkids, 1);
    assert_eq!(summary.stats.friends_persisted, 1);
    assert_eq!(summary.stats.packets_persisted, 2);

    let friends = fs::read_to_string(dir.join(FRIENDS_FILE)).unwrap();
    assert_eq!(friends.lines().count(), 1);
    assert!(friends.contains("zesty-otter"));
    let packets = fs::read_to_string(dir.join(PACKETS_FILE)).unwrap();
    assert_eq!(packets.lines().count(), 2);
    let line = format!("{}*001122334455*66778899aabb*lab", "ab".repeat(16));
    assert!(packets.contains(&hex::encode(line)));

    // totals survive into the next run
    let again = run(&cli).await.unwrap();
    assert_eq!(again.stats.pwnd_tot, 2);
    assert_eq!(again.stats.friends_tot, 2);

}

#[tokio::test]
async fn test_empty_scope_transmits_nothing() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path();
    let pcap = dir.join("walk.pcap");
    write_pcap(&pcap, &[ap_beacon(), ap_beacon()]);

    let cli = cli(&pcap, dir, &["--deauth", "-m", "aggressive", "--lure-rate", "1"]);
    let summary = run(&cli).await.unwrap();

    assert_eq!(summary.deauth_targets, Some(0));
    assert_eq!(summary.frames_transmitted, 0);
    assert_eq!(summary.stats.aps_seen, 1);

}

#[tokio::test]
async fn test_missing_capture_is_an_error() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path();
    let cli = cli(&dir.join("absent.pcap"), dir, &[]);
    assert!(matches!(run(&cli).await, Err(Error::Capture(_))));
}
