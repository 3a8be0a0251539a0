//! Capture pipeline
//!
//! Two bounded queues carry captured packets and new friends from the receive
//! path to two workers that persist them through the [`Store`]. Producers
//! never wait: a full queue drops the item. Workers log and discard items the
//! store rejects.

use std::sync::Arc;

use pwngrid_core::{CapturedPacket, PeerRecord, Store};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::stats::GridStats;

/// Producer half, owned by the receive path
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    packets: mpsc::Sender<CapturedPacket>,
    friends: mpsc::Sender<PeerRecord>,
    stats: Arc<GridStats>,
}

/// Consumer half, spawned once on the runtime
pub struct PipelineWorkers {
    packets: mpsc::Receiver<CapturedPacket>,
    friends: mpsc::Receiver<PeerRecord>,
    store: Arc<dyn Store>,
    stats: Arc<GridStats>,
}

impl CapturePipeline {
    /// Create both queues with `capacity` slots each
    pub fn new(
        capacity: usize,
        store: Arc<dyn Store>,
        stats: Arc<GridStats>,
    ) -> (CapturePipeline, PipelineWorkers) {
        let (packet_tx, packet_rx) = mpsc::channel(capacity.max(1));
        let (friend_tx, friend_rx) = mpsc::channel(capacity.max(1));
        (
            CapturePipeline {
                packets: packet_tx,
                friends: friend_tx,
                stats: stats.clone(),
            },
            PipelineWorkers {
                packets: packet_rx,
                friends: friend_rx,
                store,
                stats,
            },
        )
    }

    /// Queue a captured packet without waiting; `false` if it was dropped
    pub fn submit_packet(&self, packet: CapturedPacket) -> bool {
        match self.packets.try_send(packet) {
            Ok(()) => {
                GridStats::bump(&self.stats.packets_queued);
                true
            }
            Err(TrySendError::Full(packet)) => {
                GridStats::bump(&self.stats.packets_dropped);
                warn!(kind = %packet.kind, bssid = %packet.bssid, "Packet queue full, dropping");
                false
            }
            Err(TrySendError::Closed(packet)) => {
                GridStats::bump(&self.stats.packets_dropped);
                warn!(kind = %packet.kind, "Packet queue closed, dropping");
                false
            }
        }
    }

    /// Queue a new friend without waiting; `false` if it was dropped
    pub fn submit_friend(&self, peer: PeerRecord) -> bool {
        match self.friends.try_send(peer) {
            Ok(()) => {
                GridStats::bump(&self.stats.friends_queued);
                true
            }
            Err(e) => {
                GridStats::bump(&self.stats.friends_dropped);
                let peer = match &e {
                    TrySendError::Full(p) | TrySendError::Closed(p) => p,
                };
                warn!(name = %peer.name, identity = %peer.identity, "Friend queue unavailable, dropping");
                false
            }
        }
    }
}

impl PipelineWorkers {
    /// Spawn the packet and friend workers. Each ends once every producer
    /// handle is dropped and its queue is drained.
    pub fn spawn(self) -> (JoinHandle<u64>, JoinHandle<u64>) {
        let PipelineWorkers {
            mut packets,
            mut friends,
            store,
            stats,
        } = self;

        let packet_store = store.clone();
        let packet_stats = stats.clone();
        let packet_worker = tokio::spawn(async move {
            let mut persisted = 0u64;
            while let Some(packet) = packets.recv().await {
                let kind = packet.kind;
                match packet_store.persist_packet(packet).await {
                    Ok(()) => {
                        persisted += 1;
                        GridStats::bump(&packet_stats.packets_persisted);
                    }
                    Err(e) => {
                        GridStats::bump(&packet_stats.persist_failures);
                        warn!(kind = %kind, error = %e, "Failed to persist packet");
                    }
                }
            }
            debug!(persisted, "Packet worker finished");
            persisted
        });

        let friend_worker = tokio::spawn(async move {
            let mut persisted = 0u64;
            while let Some(peer) = friends.recv().await {
                let name = peer.name.clone();
                match store.persist_friend(peer).await {
                    Ok(()) => {
                        persisted += 1;
                        GridStats::bump(&stats.friends_persisted);
                        info!(name = %name, "Friend saved");
                    }
                    Err(e) => {
                        GridStats::bump(&stats.persist_failures);
                        warn!(name = %name, error = %e, "Failed to persist friend");
                    }
                }
            }
            debug!(persisted, "Friend worker finished");
            persisted
        });

        (packet_worker, friend_worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pwngrid_core::{CaptureKind, Error, MacAddr, Result};
    use std::time::Instant;

    #[derive(Default)]
    struct MemoryStore {
        packets: Mutex<Vec<CapturedPacket>>,
        friends: Mutex<Vec<PeerRecord>>,
        reject_packets: bool,
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn persist_packet(&self, packet: CapturedPacket) -> Result<()> {
            if self.reject_packets {
                return Err(Error::store("disk full"));
            }
            self.packets.lock().push(packet);
            Ok(())
        }

        async fn persist_friend(&self, peer: PeerRecord) -> Result<()> {
            self.friends.lock().push(peer);
            Ok(())
        }
    }

    fn packet(n: u8) -> CapturedPacket {
        CapturedPacket::new(MacAddr([n; 6]), CaptureKind::Eapol, &[n; 64], 6, 512)
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let store = Arc::new(MemoryStore::default());
        let stats = Arc::new(GridStats::new());
        let (pipeline, workers) = CapturePipeline::new(2, store.clone(), stats.clone());

        assert!(pipeline.submit_packet(packet(1)));
        assert!(pipeline.submit_packet(packet(2)));
        assert!(!pipeline.submit_packet(packet(3)));

        let (packet_worker, friend_worker) = workers.spawn();
        drop(pipeline);
        assert_eq!(packet_worker.await.unwrap(), 2);
        assert_eq!(friend_worker.await.unwrap(), 0);

        let stored = store.packets.lock();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].bssid, "01:01:01:01:01:01");
        let snap = stats.snapshot();
        assert_eq!(snap.packets_dropped, 1);
        assert_eq!(snap.packets_persisted, 2);
    }

    #[tokio::test]
    async fn test_friends_flow_and_store_failures_are_counted() {
        let store = Arc::new(MemoryStore {
            reject_packets: true,
            ..Default::default()
        });
        let stats = Arc::new(GridStats::new());
        let (pipeline, workers) = CapturePipeline::new(4, store.clone(), stats.clone());
        let (packet_worker, friend_worker) = workers.spawn();

        let mut peer = PeerRecord::new("abc", Instant::now());
        peer.name = "zesty-otter".to_string();
        assert!(pipeline.submit_friend(peer));
        assert!(pipeline.submit_packet(packet(9)));
        drop(pipeline);

        assert_eq!(packet_worker.await.unwrap(), 0);
        assert_eq!(friend_worker.await.unwrap(), 1);
        assert_eq!(store.friends.lock()[0].name, "zesty-otter");
        assert_eq!(stats.snapshot().persist_failures, 1);
    }
}
