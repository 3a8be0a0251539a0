//! Discovery reassembler
//!
//! Rebuilds advertisement documents from the vendor elements of sentinel
//! beacons. A fragment starting with `{` starts (or restarts) a document; any
//! other fragment is appended to the open document unless it has timed out.
//! The document is parsed as soon as it ends with `}`, successful or not it is
//! then dropped.

use std::time::{Duration, Instant};

use pwngrid_core::{Channel, PeerRecord};
use pwngrid_frame::frame::BEACON_BODY_OFFSET;
use pwngrid_frame::Frame;
use tracing::{debug, warn};

use super::advertise::Advertisement;
use super::constants::{MAX_DOCUMENT_LEN, SENTINEL_SOURCE, TAG_PAYLOAD};

/// Outcome of feeding one fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Fragment arrived with no open document
    Ignored,
    /// A new document was opened
    Started,
    /// Fragment appended, document still open
    Accumulating,
    /// Document closed and parsed
    Complete(PeerRecord),
    /// Open document was older than the timeout and has been dropped
    TimedOut,
    /// Document closed but did not parse, or grew past the size limit
    Invalid,
}

#[derive(Debug)]
struct Document {
    text: String,
    started_at: Instant,
}

/// Per-source reassembly state
#[derive(Debug)]
pub struct Reassembler {
    open: Option<Document>,
    timeout: Duration,
}

impl Reassembler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            open: None,
            timeout,
        }
    }

    /// No document is being accumulated
    pub fn is_idle(&self) -> bool {
        self.open.is_none()
    }

    /// Feed one fragment; `rssi` and `channel` annotate a completed record
    pub fn push_fragment(
        &mut self,
        fragment: &[u8],
        rssi: i32,
        channel: Channel,
        now: Instant,
    ) -> Progress {
        let text = String::from_utf8_lossy(fragment);

        let progress = if text.starts_with('{') {
            self.open = Some(Document {
                text: text.into_owned(),
                started_at: now,
            });
            Progress::Started
        } else {
            let Some(doc) = self.open.as_mut() else {
                return Progress::Ignored;
            };
            if now.saturating_duration_since(doc.started_at) > self.timeout {
                debug!("Advertisement reassembly timed out, discarding");
                self.open = None;
                return Progress::TimedOut;
            }
            doc.text.push_str(&text);
            Progress::Accumulating
        };

        let Some(doc) = self.open.as_ref() else {
            return progress;
        };

        if doc.text.len() > MAX_DOCUMENT_LEN {
            warn!(len = doc.text.len(), "Advertisement exceeds size limit, discarding");
            self.open = None;
            return Progress::Invalid;
        }

        if !doc.text.ends_with('}') {
            return progress;
        }

        let parsed = serde_json::from_str::<Advertisement>(&doc.text);
        self.open = None;

        match parsed {
            Ok(adv) if !adv.identity.is_empty() => {
                Progress::Complete(adv.into_peer(rssi, channel, now))
            }
            Ok(_) => {
                warn!("Advertisement without identity, discarding");
                Progress::Invalid
            }
            Err(e) => {
                warn!(error = %e, "Advertisement JSON parse error");
                Progress::Invalid
            }
        }
    }

    /// Feed every pwngrid element of a beacon.
    ///
    /// Frames that are not beacons from the sentinel source are ignored.
    /// Processing of a frame stops at the first timed-out fragment.
    pub fn push_frame(
        &mut self,
        frame: &Frame<'_>,
        rssi: i32,
        channel: Channel,
        now: Instant,
    ) -> Vec<PeerRecord> {
        let mut completed = Vec::new();
        if !is_advertisement(frame) {
            return completed;
        }

        let mut elements = frame.elements(BEACON_BODY_OFFSET);
        for element in elements.by_ref().filter(|e| e.tag == TAG_PAYLOAD) {
            match self.push_fragment(element.value, rssi, channel, now) {
                Progress::Complete(peer) => completed.push(peer),
                Progress::TimedOut => break,
                _ => {}
            }
        }

        if elements.is_malformed() {
            debug!("Truncated element in advertisement beacon");
        }
        completed
    }
}

/// Is this a pwngrid advertisement beacon?
pub fn is_advertisement(frame: &Frame<'_>) -> bool {
    frame.is_beacon() && frame.transmitter() == SENTINEL_SOURCE
}
