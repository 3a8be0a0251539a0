//! Peer table
//!
//! Fixed-capacity arena of [`PeerRecord`]s with an identity index. Records
//! are never removed; silent peers are flagged `gone` instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use pwngrid_core::{Error, PeerRecord, Result};

/// What [`PeerTable::upsert`] did
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// Known identity, sighting refreshed
    Refreshed,
    /// New identity stored; the record is returned for persistence
    Inserted(PeerRecord),
}

#[derive(Debug)]
pub struct PeerTable {
    entries: Vec<PeerRecord>,
    index: HashMap<String, usize>,
    capacity: usize,
}

impl PeerTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a new peer or refresh a known one.
    ///
    /// A refresh only touches `last_ping`, `gone` and `rssi`. A new identity
    /// beyond capacity is rejected and the table is left untouched.
    pub fn upsert(&mut self, record: PeerRecord) -> Result<Upsert> {
        if let Some(&slot) = self.index.get(&record.identity) {
            let entry = &mut self.entries[slot];
            entry.last_ping = record.last_ping;
            entry.gone = false;
            entry.rssi = record.rssi;
            return Ok(Upsert::Refreshed);
        }

        if self.entries.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.index
            .insert(record.identity.clone(), self.entries.len());
        self.entries.push(record.clone());
        Ok(Upsert::Inserted(record))
    }

    /// Flag every peer silent for longer than `threshold`; returns how many
    /// were newly flagged
    pub fn mark_gone_if_stale(&mut self, now: Instant, threshold: Duration) -> usize {
        let mut marked = 0;
        for entry in self.entries.iter_mut().filter(|e| !e.gone) {
            if entry.is_stale(now, threshold) {
                entry.gone = true;
                marked += 1;
            }
        }
        marked
    }

    /// Strongest signal among peers not flagged gone
    pub fn closest_active_rssi(&self) -> Option<i32> {
        self.entries
            .iter()
            .filter(|e| !e.gone)
            .map(|e| e.rssi)
            .max()
    }

    pub fn get(&self, identity: &str) -> Option<&PeerRecord> {
        self.index.get(identity).map(|&slot| &self.entries[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerRecord> {
        self.entries.iter()
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.gone).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
