//! Grid statistics
//!
//! Counters are bumped from the receive path, so everything is an atomic
//! except the two text/time fields, which sit behind short spin locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use spin::Mutex;

/// Point-in-time copy of [`GridStats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridStatsSnapshot {
    pub frames_received: u64,
    pub frames_malformed: u64,
    /// Distinct transmitters of beacons / probe responses
    pub aps_seen: u64,
    /// Distinct transmitters first seen this run
    pub new_aps: u64,
    pub eapol_frames: u64,
    pub handshakes: u64,
    pub pmkids: u64,
    pub pwnd_run: u64,
    pub pwnd_tot: u64,
    pub friends_run: u64,
    pub friends_tot: u64,
    pub peers_rejected: u64,
    pub packets_queued: u64,
    pub packets_dropped: u64,
    pub friends_queued: u64,
    pub friends_dropped: u64,
    pub packets_persisted: u64,
    pub friends_persisted: u64,
    pub persist_failures: u64,
    pub last_handshake: Option<DateTime<Utc>>,
    pub last_friend_name: String,
    #[serde(skip)]
    pub uptime: Duration,
}

impl GridStatsSnapshot {
    /// Human-readable summary
    pub fn format(&self) -> String {
        format!(
            "Frames: {} received, {} malformed\n\
             APs: {} seen, {} new\n\
             EAPOL: {} frames, {} handshakes, {} PMKIDs\n\
             Pwned: {} this run, {} total\n\
             Friends: {} this run, {} total (last: {})\n\
             Pipeline: {}/{} packets queued/dropped, {}/{} friends queued/dropped, {} persist failures",
            self.frames_received,
            self.frames_malformed,
            self.aps_seen,
            self.new_aps,
            self.eapol_frames,
            self.handshakes,
            self.pmkids,
            self.pwnd_run,
            self.pwnd_tot,
            self.friends_run,
            self.friends_tot,
            if self.last_friend_name.is_empty() { "-" } else { &self.last_friend_name },
            self.packets_queued,
            self.packets_dropped,
            self.friends_queued,
            self.friends_dropped,
            self.persist_failures,
        )
    }
}

#[derive(Debug)]
pub struct GridStats {
    pub(crate) frames_received: AtomicU64,
    pub(crate) frames_malformed: AtomicU64,
    pub(crate) aps_seen: AtomicU64,
    pub(crate) new_aps: AtomicU64,
    pub(crate) eapol_frames: AtomicU64,
    pub(crate) handshakes: AtomicU64,
    pub(crate) pmkids: AtomicU64,
    pub(crate) pwnd_run: AtomicU64,
    pub(crate) pwnd_tot: AtomicU64,
    pub(crate) friends_run: AtomicU64,
    pub(crate) friends_tot: AtomicU64,
    pub(crate) peers_rejected: AtomicU64,
    pub(crate) packets_queued: AtomicU64,
    pub(crate) packets_dropped: AtomicU64,
    pub(crate) friends_queued: AtomicU64,
    pub(crate) friends_dropped: AtomicU64,
    pub(crate) packets_persisted: AtomicU64,
    pub(crate) friends_persisted: AtomicU64,
    pub(crate) persist_failures: AtomicU64,
    last_handshake: Mutex<Option<DateTime<Utc>>>,
    last_friend_name: Mutex<String>,
    start_time: Instant,
}

impl Default for GridStats {
    fn default() -> Self {
        Self::new()
    }
}

impl GridStats {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_malformed: AtomicU64::new(0),
            aps_seen: AtomicU64::new(0),
            new_aps: AtomicU64::new(0),
            eapol_frames: AtomicU64::new(0),
            handshakes: AtomicU64::new(0),
            pmkids: AtomicU64::new(0),
            pwnd_run: AtomicU64::new(0),
            pwnd_tot: AtomicU64::new(0),
            friends_run: AtomicU64::new(0),
            friends_tot: AtomicU64::new(0),
            peers_rejected: AtomicU64::new(0),
            packets_queued: AtomicU64::new(0),
            packets_dropped: AtomicU64::new(0),
            friends_queued: AtomicU64::new(0),
            friends_dropped: AtomicU64::new(0),
            packets_persisted: AtomicU64::new(0),
            friends_persisted: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            last_handshake: Mutex::new(None),
            last_friend_name: Mutex::new(String::new()),
            start_time: Instant::now(),
        }
    }

    /// Seed the lifetime totals loaded from persistence at startup
    pub fn restore_totals(&self, pwnd_tot: u64, friends_tot: u64) {
        self.pwnd_tot.store(pwnd_tot, Ordering::Relaxed);
        self.friends_tot.store(friends_tot, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handshake(&self) {
        Self::bump(&self.handshakes);
        Self::bump(&self.pwnd_run);
        Self::bump(&self.pwnd_tot);
        *self.last_handshake.lock() = Some(Utc::now());
    }

    pub(crate) fn record_friend(&self, name: &str) {
        Self::bump(&self.friends_run);
        Self::bump(&self.friends_tot);
        let mut last = self.last_friend_name.lock();
        last.clear();
        last.push_str(name);
    }

    pub fn pwnd_run(&self) -> u64 {
        self.pwnd_run.load(Ordering::Relaxed)
    }

    pub fn pwnd_tot(&self) -> u64 {
        self.pwnd_tot.load(Ordering::Relaxed)
    }

    pub fn last_friend_name(&self) -> String {
        self.last_friend_name.lock().clone()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> GridStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        GridStatsSnapshot {
            frames_received: load(&self.frames_received),
            frames_malformed: load(&self.frames_malformed),
            aps_seen: load(&self.aps_seen),
            new_aps: load(&self.new_aps),
            eapol_frames: load(&self.eapol_frames),
            handshakes: load(&self.handshakes),
            pmkids: load(&self.pmkids),
            pwnd_run: load(&self.pwnd_run),
            pwnd_tot: load(&self.pwnd_tot),
            friends_run: load(&self.friends_run),
            friends_tot: load(&self.friends_tot),
            peers_rejected: load(&self.peers_rejected),
            packets_queued: load(&self.packets_queued),
            packets_dropped: load(&self.packets_dropped),
            friends_queued: load(&self.friends_queued),
            friends_dropped: load(&self.friends_dropped),
            packets_persisted: load(&self.packets_persisted),
            friends_persisted: load(&self.friends_persisted),
            persist_failures: load(&self.persist_failures),
            last_handshake: *self.last_handshake.lock(),
            last_friend_name: self.last_friend_name.lock().clone(),
            uptime: self.uptime(),
        }
    }
}
