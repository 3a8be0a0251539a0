//! Receive path and capture pipeline for pwngrid-rs
//!
//! ## Features
//!
//! - **Sniffer**: the non-blocking receive callback. Routes advertisements to
//!   discovery, beacons to the registry, EAPOL to the pipeline and probe
//!   requests to the lure dispatcher
//! - **Pipeline**: bounded queues and the workers that persist captured
//!   packets and new friends
//! - **Statistics**: run and lifetime counters kept with atomics
//! - **Replay**: feed a monitor-mode pcap file through the receive path
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pwngrid_capture::{CapturePipeline, GridStats, PcapReplay, Sniffer};
//! use pwngrid_core::{GridConfig, Store};
//!
//! # async fn run(store: Arc<dyn Store>) -> pwngrid_core::Result<()> {
//! let config = GridConfig::default();
//! let stats = Arc::new(GridStats::new());
//! let (pipeline, workers) = CapturePipeline::new(config.queue_capacity, store, stats.clone());
//! let (packets, friends) = workers.spawn();
//!
//! let sniffer = Sniffer::new(&config, pipeline, stats.clone());
//! PcapReplay::open("capture.pcap")?.feed(&sniffer)?;
//! drop(sniffer);
//!
//! let _ = (packets.await, friends.await);
//! println!("{}", stats.snapshot().format());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod replay;
pub mod sniffer;
pub mod stats;

pub use pipeline::{CapturePipeline, PipelineWorkers};
pub use replay::{PcapReplay, ReplayStats};
pub use sniffer::{Sniffer, NO_PEERS_RSSI};
pub use stats::{GridStats, GridStatsSnapshot};
