//! Engine configuration

use std::collections::HashSet;
use std::time::Duration;

use crate::{Error, MacAddr, Result};

/// Default grid protocol version advertised to peers
pub const DEFAULT_GRID_VERSION: &str = "1.10.3";

/// Default firmware version advertised to peers
pub const DEFAULT_FIRMWARE_VERSION: &str = "1.8.4";

/// How much the engine does with what it receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// Discovery and advertising only
    Friendly,
    /// Also extract EAPOL/PMKID material
    #[default]
    Normal,
    /// Also send lures (probe responses, auth/assoc) to in-scope targets
    Aggressive,
}

impl OperatingMode {
    pub fn captures(&self) -> bool {
        !matches!(self, OperatingMode::Friendly)
    }

    pub fn lures(&self) -> bool {
        matches!(self, OperatingMode::Aggressive)
    }
}

impl std::str::FromStr for OperatingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "friendly" => Ok(OperatingMode::Friendly),
            "normal" => Ok(OperatingMode::Normal),
            "aggressive" => Ok(OperatingMode::Aggressive),
            _ => Err(Error::invalid_parameter("mode", "expected friendly, normal or aggressive")),
        }
    }
}

/// Networks the operator is authorized to test.
///
/// Every active transmission (deauthentication, forged probe responses,
/// auth/assoc injection) is checked against this scope. An empty scope means
/// nothing is transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetScope {
    bssids: HashSet<MacAddr>,
    ssids: HashSet<String>,
}

impl TargetScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bssid(mut self, bssid: MacAddr) -> Self {
        self.bssids.insert(bssid);
        self
    }

    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssids.insert(ssid.into());
        self
    }

    pub fn allows_bssid(&self, bssid: &MacAddr) -> bool {
        self.bssids.contains(bssid)
    }

    pub fn allows_ssid(&self, ssid: &str) -> bool {
        self.ssids.contains(ssid)
    }

    pub fn is_empty(&self) -> bool {
        self.bssids.is_empty() && self.ssids.is_empty()
    }
}

/// Configuration shared by every component of the engine
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Name used when the identity collaborator has none
    pub device_name: String,
    pub grid_version: String,
    pub firmware_version: String,
    pub mode: OperatingMode,
    /// Fragment accumulation timeout of the discovery reassembler
    pub reassembly_timeout: Duration,
    /// Fixed capacity of the peer table
    pub peer_capacity: usize,
    /// Silence after which a peer is marked gone
    pub peer_gone_after: Duration,
    /// Capacity of each capture pipeline queue
    pub queue_capacity: usize,
    /// Bytes of a captured frame kept for persistence
    pub max_packet_save: usize,
    /// Wait after a channel switch before transmitting
    pub channel_settle: Duration,
    /// One lure per this many matching frames
    pub lure_rate: u32,
    /// Gap between the injected auth and assoc requests
    pub lure_assoc_gap: Duration,
    /// Identical deauthentication frames per target
    pub deauth_burst: usize,
    pub scope: TargetScope,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            device_name: "pwngrid".to_string(),
            grid_version: DEFAULT_GRID_VERSION.to_string(),
            firmware_version: DEFAULT_FIRMWARE_VERSION.to_string(),
            mode: OperatingMode::default(),
            reassembly_timeout: Duration::from_millis(5000),
            peer_capacity: 255,
            peer_gone_after: Duration::from_secs(120),
            queue_capacity: 32,
            max_packet_save: 512,
            channel_settle: Duration::from_millis(102),
            lure_rate: 100,
            lure_assoc_gap: Duration::from_millis(10),
            deauth_burst: 3,
            scope: TargetScope::default(),
        }
    }
}

impl GridConfig {
    /// Check values that would make components misbehave
    pub fn validate(&self) -> Result<()> {
        if self.peer_capacity == 0 {
            return Err(Error::invalid_parameter("peer_capacity", "must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::invalid_parameter("queue_capacity", "must be at least 1"));
        }
        if self.lure_rate == 0 {
            return Err(Error::invalid_parameter("lure_rate", "must be at least 1"));
        }
        if self.deauth_burst == 0 {
            return Err(Error::invalid_parameter("deauth_burst", "must be at least 1"));
        }
        if self.max_packet_save < 24 {
            return Err(Error::invalid_parameter(
                "max_packet_save",
                "must hold at least a MAC header",
            ));
        }
        if self.device_name.is_empty() {
            return Err(Error::invalid_parameter("device_name", "must not be empty"));
        }
        Ok(())
    }
}
