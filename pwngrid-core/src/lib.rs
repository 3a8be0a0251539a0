//! pwngrid-rs Core Library
//!
//! This crate provides the fundamental types, collaborator traits, configuration
//! and error handling shared by the frame, protocol, attack and capture crates.

pub mod attack;
pub mod config;
pub mod error;
pub mod packet;
pub mod peer;
pub mod radio;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use attack::{Attack, AttackContext, AttackHandle, AttackStats, AttackStatsCounters};
pub use config::{GridConfig, OperatingMode, TargetScope};
pub use error::{Error, Result};
pub use packet::{CaptureKind, CapturedPacket};
pub use peer::PeerRecord;
pub use radio::{PromiscuousFilter, Radio, RadioFrame, RxCallback};
pub use services::{Identity, Mood, MoodSink, NoMood, Position, PositionSource, Store};
pub use types::*;
