//! Radio used for offline runs
//!
//! Nothing reaches the air: transmitted frames are logged and counted.
//! Replayed frames are pushed through whatever receive callback the sniffer
//! installed, the same way a driver would call it.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;
use pwngrid_core::{Channel, Error, PromiscuousFilter, Radio, RadioFrame, Result, RxCallback};
use tracing::{debug, info};

pub struct LoggingRadio {
    channel: AtomicU8,
    callback: Mutex<Option<RxCallback>>,
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
}

impl LoggingRadio {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel: AtomicU8::new(channel.number()),
            callback: Mutex::new(None),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    /// Hand one frame to the installed receive callback, if any
    pub fn deliver(&self, frame: RadioFrame<'_>) {
        if let Some(callback) = self.callback.lock().as_ref() {
            callback(frame);
        }
    }

    /// Drop the receive callback and whatever it keeps alive
    pub fn disable_promiscuous(&self) {
        if self.callback.lock().take().is_some() {
            debug!("Promiscuous receive disabled");
        }
    }

    /// (frames, bytes) passed to `transmit_raw`
    pub fn transmitted(&self) -> (u64, u64) {
        (
            self.frames_sent.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
        )
    }
}

impl Radio for LoggingRadio {
    fn channel(&self) -> Channel {
        Channel::new(self.channel.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn set_channel(&self, channel: Channel) -> Result<()> {
        let previous = self.channel.swap(channel.number(), Ordering::Relaxed);
        if previous != channel.number() {
            debug!(from = previous, to = %channel, "Channel switch");
        }
        Ok(())
    }

    fn enable_promiscuous(&self, filter: PromiscuousFilter, callback: RxCallback) -> Result<()> {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return Err(Error::radio("receive callback already installed"));
        }
        *slot = Some(callback);
        info!(management = filter.management, data = filter.data, "Promiscuous receive enabled");
        Ok(())
    }

    fn transmit_raw(&self, frame: &[u8]) -> Result<()> {
        if frame.len() < 24 {
            return Err(Error::radio(format!("frame of {} bytes is too short", frame.len())));
        }
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(frame.len() as u64, Ordering::Relaxed);
        info!(
            channel = self.channel.load(Ordering::Relaxed),
            fc = format_args!("{:02x}", frame[0]),
            len = frame.len(),
            "Would transmit"
        );
        Ok(())
    }
}
