//! Radio abstraction
//!
//! The driver owns the hardware; this crate only calls into it. Received frames
//! are delivered to an [`RxCallback`] in the driver's own execution context,
//! which must return without blocking.

use std::fmt;

use crate::{Channel, Result};

/// Borrowed view of one received frame plus its radio metadata.
///
/// The buffer belongs to the driver and is only valid for the duration of the
/// callback; anything that must outlive it is copied out.
#[derive(Clone, Copy)]
pub struct RadioFrame<'a> {
    /// 802.11 frame bytes starting at frame control, FCS already removed
    pub data: &'a [u8],
    /// Received signal strength in dBm
    pub rssi: i32,
    /// Channel the frame was received on
    pub channel: Channel,
}

impl<'a> RadioFrame<'a> {
    pub fn new(data: &'a [u8], rssi: i32, channel: Channel) -> Self {
        Self { data, rssi, channel }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for RadioFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadioFrame")
            .field("len", &self.data.len())
            .field("rssi", &self.rssi)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Which frame classes the driver should hand to the receive callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiscuousFilter {
    pub management: bool,
    pub control: bool,
    pub data: bool,
}

impl PromiscuousFilter {
    /// Management and data frames, which is all the sniffer looks at
    pub const MGMT_AND_DATA: PromiscuousFilter = PromiscuousFilter {
        management: true,
        control: false,
        data: true,
    };
}

/// Receive callback installed with [`Radio::enable_promiscuous`]
pub type RxCallback = Box<dyn Fn(RadioFrame<'_>) + Send + Sync + 'static>;

/// Low-level radio control supplied by the platform.
///
/// Channel queries are expected to return promptly; `transmit_raw` may be slow
/// and must never be called while a receive-path lock is held.
pub trait Radio: Send + Sync {
    /// Current primary channel
    fn channel(&self) -> Channel;

    /// Switch the primary channel
    fn set_channel(&self, channel: Channel) -> Result<()>;

    /// Install the receive callback and enable promiscuous mode
    fn enable_promiscuous(&self, filter: PromiscuousFilter, callback: RxCallback) -> Result<()>;

    /// Transmit a raw 802.11 frame (no FCS) once
    fn transmit_raw(&self, frame: &[u8]) -> Result<()>;
}
