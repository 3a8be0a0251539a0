//! pwngrid protocol for pwngrid-rs
//!
//! Devices announce themselves with beacons from a fixed sentinel source
//! address whose body carries a JSON document split over vendor elements.
//! See [`grid`] for the wire format, the receive-side state machine and the
//! peer table.

pub mod grid;

pub use grid::advertise::{Advertisement, Advertiser, Policy};
pub use grid::peers::{PeerTable, Upsert};
pub use grid::reassembly::{Progress, Reassembler};
