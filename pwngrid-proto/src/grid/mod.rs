//! pwngrid advertise protocol
//!
//! ## Wire Format
//!
//! An advertisement is an ordinary beacon sent from a fixed sentinel source:
//!
//! ```text
//! MAC header (24 bytes)
//!   FC 80 00 | Duration 00 00
//!   DA ff:ff:ff:ff:ff:ff
//!   SA de:ad:be:ef:de:ad        (sentinel, identifies pwngrid traffic)
//!   BSSID a1:00:64:e6:0b:8b
//!   Seq 40 43
//! Fixed fields (12 bytes)
//!   Timestamp 0 | Interval 100 TU | Capability 0x0411
//! Vendor elements
//!   DE len <= 255 | JSON fragment      (repeated)
//! ```
//!
//! The JSON text is ASCII-only (anything else is sent as `?`):
//!
//! ```json
//! {"pal":true,"name":"...","face":"...","epoch":1,"grid_version":"...",
//!  "identity":"<fingerprint>","pwnd_run":0,"pwnd_tot":0,"session_id":"...",
//!  "timestamp":0,"uptime":0,"version":"...",
//!  "policy":{"advertise":true,"bond_encounters_factor":20000,
//!            "bored_num_epoch":0,"sad_num_epoch":0,"excited_num_epoch":9999}}
//! ```
//!
//! ## Receive Side
//!
//! [`reassembly::Reassembler`] stitches fragments back together, with a
//! timeout between fragments, and turns complete documents into
//! [`pwngrid_core::PeerRecord`]s. [`peers::PeerTable`] keeps one record per
//! identity up to a fixed capacity.

pub mod advertise;
pub mod constants;
pub mod peers;
pub mod reassembly;


pub use advertise::{Advertisement, Advertiser, Policy};
pub use constants::{ADVERTISE_BSSID, SENTINEL_SOURCE};
pub use peers::{PeerTable, Upsert};
pub use reassembly::{is_advertisement, Progress, Reassembler};
