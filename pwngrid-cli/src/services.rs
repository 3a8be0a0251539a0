//! Identity and mood collaborators for the command-line front end

use pwngrid_core::{MacAddr, Mood, MoodSink};
use tracing::info;
use uuid::Uuid;

/// Identity generated once per run
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    name: String,
    fingerprint: String,
    session_id: String,
}

impl SessionIdentity {
    pub fn generate(name: &str) -> Self {
        let fingerprint = format!("{}{}", Uuid::now_v7().simple(), Uuid::now_v7().simple());
        Self {
            name: name.to_string(),
            fingerprint,
            session_id: MacAddr::random_with_prefix(0x02).to_string(),
        }
    }
}

impl pwngrid_core::Identity for SessionIdentity {
    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }

    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn device_name(&self) -> String {
        self.name.clone()
    }
}

/// Mood events go to the log instead of a display
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMood;

impl MoodSink for LogMood {
    fn show_event(&self, mood: Mood, message: &str, peer_name: &str, peer_rssi: i32) {
        let face = match mood {
            Mood::Excited => "(☼‿‿☼)",
            Mood::Friendly => "(♥‿‿♥)",
        };
        info!(face, peer = peer_name, rssi = peer_rssi, "{}", message);
    }
}
