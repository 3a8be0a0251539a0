//! 802.11 frame parsing and construction for pwngrid-rs
//!
//! Everything in this crate is stateless and allocation-light so it can run
//! inline in the radio receive path:
//!
//! - [`frame`] - classify a raw buffer into a typed [`Frame`] view
//! - [`ie`] - lazy, bounds-checked information element scanning
//! - [`eapol`] - EAPOL detection and PMKID extraction
//! - [`builder`] - management frames the engine transmits
//! - [`radiotap`] - strip radiotap headers from captured frames
//!
//! # Quick Start
//!
//! ```rust
//! use pwngrid_frame::{Frame, FrameKind, ManagementSubtype};
//! use pwngrid_frame::builder;
//! use pwngrid_core::MacAddr;
//!
//! let ap = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
//! let bytes = builder::deauthentication(ap, MacAddr::broadcast(), builder::REASON_PREV_AUTH_INVALID);
//!
//! let frame = Frame::classify(&bytes).unwrap();
//! assert_eq!(frame.kind(), FrameKind::Management(ManagementSubtype::Deauthentication));
//! assert_eq!(frame.bssid(), ap);
//! ```

pub mod builder;
pub mod eapol;
pub mod frame;
pub mod ie;
pub mod radiotap;

pub use eapol::{is_eapol, PmkidRecord};
pub use frame::{Frame, FrameError, FrameKind, ManagementSubtype};
pub use ie::{Elements, InformationElement};
