//! Append-only NDJSON persistence
//!
//! One JSON document per line: captured packets go to `packets.ndjson`,
//! friends to `friends.ndjson`, both inside the output directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pwngrid_core::{CaptureKind, CapturedPacket, PeerRecord, Result, Store};
use serde::Serialize;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const PACKETS_FILE: &str = "packets.ndjson";
pub const FRIENDS_FILE: &str = "friends.ndjson";

pub struct NdjsonStore {
    dir: PathBuf,
    packets: Mutex<File>,
    friends: Mutex<File>,
}

impl NdjsonStore {
    /// Create `dir` if needed and open both files for appending
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let packets = append(&dir.join(PACKETS_FILE)).await?;
        let friends = append(&dir.join(FRIENDS_FILE)).await?;
        info!(dir = %dir.display(), "NDJSON store opened");

        Ok(Self {
            dir,
            packets: Mutex::new(packets),
            friends: Mutex::new(friends),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lifetime totals found on disk: (handshakes, friends)
    pub async fn totals(&self) -> Result<(u64, u64)> {
        let handshakes = count_lines(&self.dir.join(PACKETS_FILE), |line| {
            serde_json::from_str::<serde_json::Value>(line)
                .map(|v| v["type"] == CaptureKind::Eapol.as_str())
                .unwrap_or(false)
        })
        .await?;
        let friends = count_lines(&self.dir.join(FRIENDS_FILE), |_| true).await?;
        Ok((handshakes, friends))
    }
}

async fn append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path).await?)
}

async fn count_lines(path: &Path, matches: impl Fn(&str) -> bool) -> Result<u64> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty() && matches(line))
        .count() as u64)
}

async fn write_line<T: Serialize>(file: &Mutex<File>, record: &T) -> Result<()> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');

    let mut file = file.lock().await;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl Store for NdjsonStore {
    async fn persist_packet(&self, packet: CapturedPacket) -> Result<()> {
        write_line(&self.packets, &packet).await?;
        debug!(kind = %packet.kind, bssid = %packet.bssid, len = packet.len(), "Packet written");
        Ok(())
    }

    async fn persist_friend(&self, peer: PeerRecord) -> Result<()> {
        write_line(&self.friends, &peer).await?;
        debug!(name = %peer.name, "Friend written");
        Ok(())
    }
}
