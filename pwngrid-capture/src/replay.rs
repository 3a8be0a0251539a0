//! Offline frame source
//!
//! Reads a pcap file recorded in monitor mode and hands every frame to a
//! receive callback, exactly as the radio driver would. Radiotap captures
//! (linktype 127) have their header and FCS stripped and supply signal and
//! channel; bare 802.11 captures (linktype 105) use the defaults.

use std::path::{Path, PathBuf};

use pcap::{Capture, Linktype, Offline};
use pwngrid_core::{Channel, Error, RadioFrame, Result};
use pwngrid_frame::radiotap;
use tracing::{debug, info};

use crate::sniffer::Sniffer;

/// Signal reported for frames whose capture carries none
pub const DEFAULT_RSSI: i32 = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encapsulation {
    Radiotap,
    Bare,
}

/// Counters for one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records read from the file
    pub packets: u64,
    /// Frames handed to the callback
    pub delivered: u64,
    /// Records with an unreadable radiotap header
    pub skipped: u64,
}

/// A pcap file opened for replay
pub struct PcapReplay {
    path: PathBuf,
    capture: Capture<Offline>,
    encapsulation: Encapsulation,
    default_channel: Channel,
}

impl PcapReplay {
    /// Open `path` and check its link type
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let capture = Capture::from_file(&path)
            .map_err(|e| Error::Capture(format!("{}: {}", path.display(), e)))?;

        let encapsulation = match capture.get_datalink() {
            Linktype::IEEE802_11_RADIOTAP => Encapsulation::Radiotap,
            Linktype::IEEE802_11 => Encapsulation::Bare,
            other => {
                return Err(Error::Capture(format!(
                    "{}: unsupported link type {}",
                    path.display(),
                    other.0
                )))
            }
        };

        info!(path = %path.display(), encapsulation = ?encapsulation, "Opened capture file");
        Ok(Self {
            path,
            capture,
            encapsulation,
            default_channel: Channel::default(),
        })
    }

    /// Channel reported when the capture does not carry one
    pub fn with_default_channel(mut self, channel: Channel) -> Self {
        self.default_channel = channel;
        self
    }

    /// Feed every frame of the file to `handler`
    pub fn run<F>(mut self, mut handler: F) -> Result<ReplayStats>
    where
        F: FnMut(RadioFrame<'_>),
    {
        let mut stats = ReplayStats::default();

        loop {
            let packet = match self.capture.next_packet() {
                Ok(packet) => packet,
                Err(pcap::Error::NoMorePackets) => break,
                Err(e) => {
                    return Err(Error::Capture(format!("{}: {}", self.path.display(), e)));
                }
            };
            stats.packets += 1;

            match self.encapsulation {
                Encapsulation::Bare => {
                    handler(RadioFrame::new(packet.data, DEFAULT_RSSI, self.default_channel));
                }
                Encapsulation::Radiotap => match radiotap::strip(packet.data) {
                    Ok(rt) => handler(RadioFrame::new(
                        rt.frame,
                        rt.rssi.map_or(DEFAULT_RSSI, i32::from),
                        rt.channel.unwrap_or(self.default_channel),
                    )),
                    Err(e) => {
                        stats.skipped += 1;
                        debug!(record = stats.packets, error = %e, "Skipping record");
                        continue;
                    }
                },
            }
            stats.delivered += 1;
        }

        info!(
            path = %self.path.display(),
            packets = stats.packets,
            delivered = stats.delivered,
            skipped = stats.skipped,
            "Replay finished"
        );
        Ok(stats)
    }

    /// Replay straight into a sniffer's receive path
    pub fn feed(self, sniffer: &Sniffer) -> Result<ReplayStats> {
        self.run(|frame| sniffer.handle_frame(frame))
    }
}
