//! Beacon registry and SSID book
//!
//! Both are written from the radio receive path, so they sit behind
//! `spin::Mutex`: the critical sections are a single set/map operation and
//! never contain a radio call.

use std::collections::{BTreeSet, HashMap};

use pwngrid_core::{Channel, MacAddr, TargetScope};
use spin::Mutex;

/// Default bound on distinct (mac, channel) pairs
pub const DEFAULT_REGISTRY_CAPACITY: usize = 1024;

/// Default bound on remembered SSIDs
pub const DEFAULT_SSID_BOOK_CAPACITY: usize = 1024;

/// An access point seen beaconing on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BeaconEntry {
    pub mac: MacAddr,
    pub channel: Channel,
}

impl BeaconEntry {
    pub fn new(mac: MacAddr, channel: Channel) -> Self {
        Self { mac, channel }
    }
}

/// Set of beaconing access points, deduplicated by (mac, channel)
#[derive(Debug)]
pub struct BeaconRegistry {
    entries: Mutex<BTreeSet<BeaconEntry>>,
    capacity: usize,
}

impl Default for BeaconRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}

impl BeaconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeSet::new()),
            capacity,
        }
    }

    /// Record a sighting; returns `true` if the pair was new.
    ///
    /// New pairs beyond capacity are not recorded.
    pub fn insert(&self, entry: BeaconEntry) -> bool {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity && !entries.contains(&entry) {
            return false;
        }
        entries.insert(entry)
    }

    /// Copy of every entry, taken under the lock
    pub fn snapshot(&self) -> Vec<BeaconEntry> {
        self.entries.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// BSSID to SSID mapping learned from beacons and probe responses
#[derive(Debug)]
pub struct SsidBook {
    ssids: Mutex<HashMap<MacAddr, String>>,
    capacity: usize,
}

impl Default for SsidBook {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SSID_BOOK_CAPACITY)
    }
}

impl SsidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ssids: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Remember (or update) the SSID of `bssid`. Hidden SSIDs are ignored.
    pub fn learn(&self, bssid: MacAddr, ssid: &str) {
        if ssid.is_empty() || ssid.bytes().all(|b| b == 0) {
            return;
        }
        let mut ssids = self.ssids.lock();
        if ssids.len() >= self.capacity && !ssids.contains_key(&bssid) {
            return;
        }
        if ssids.get(&bssid).map(String::as_str) != Some(ssid) {
            ssids.insert(bssid, ssid.to_string());
        }
    }

    pub fn ssid(&self, bssid: &MacAddr) -> Option<String> {
        self.ssids.lock().get(bssid).cloned()
    }

    pub fn len(&self) -> usize {
        self.ssids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ssids.lock().is_empty()
    }
}

/// Is `bssid` inside the authorized scope, either directly or through the
/// SSID it advertises?
pub fn is_authorized(scope: &TargetScope, book: &SsidBook, bssid: &MacAddr) -> bool {
    if scope.allows_bssid(bssid) {
        return true;
    }
    book.ssid(bssid)
        .map_or(false, |ssid| scope.allows_ssid(&ssid))
}
