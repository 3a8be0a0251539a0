//! One offline run: replay a capture through the engine, then optionally
//! exercise the transmit side against the logging radio.

use std::sync::Arc;
use std::time::Instant;

use pwngrid_attack::{lure_channel, AttackManager, BeaconRegistry, DeauthEngine, DeauthReport, SsidBook};
use pwngrid_capture::{CapturePipeline, GridStats, GridStatsSnapshot, PcapReplay, ReplayStats, Sniffer};
use pwngrid_core::{AttackStatsCounters, Error, Radio, Result};
use pwngrid_proto::{Advertisement, Advertiser};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::args::Cli;
use crate::radio::LoggingRadio;
use crate::services::{LogMood, SessionIdentity};
use crate::store::NdjsonStore;

/// Face announced in advertisements from the command line
const FACE: &str = "(◕‿‿◕)";

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub packets_read: u64,
    pub frames_delivered: u64,
    pub records_skipped: u64,
    pub peers: usize,
    pub advertised: bool,
    pub deauth_targets: Option<usize>,
    pub frames_transmitted: u64,
    pub stats: GridStatsSnapshot,
}

impl RunSummary {
    fn new(
        replay: ReplayStats,
        peers: usize,
        advertised: bool,
        deauth: Option<DeauthReport>,
        frames_transmitted: u64,
        stats: GridStatsSnapshot,
    ) -> Self {
        Self {
            packets_read: replay.packets,
            frames_delivered: replay.delivered,
            records_skipped: replay.skipped,
            peers,
            advertised,
            deauth_targets: deauth.map(|r| r.targeted),
            frames_transmitted,
            stats,
        }
    }

    /// Human-readable summary
    pub fn format(&self) -> String {
        let mut out = format!(
            "Replay: {} records, {} delivered, {} skipped\nPeers: {}\n{}",
            self.packets_read,
            self.frames_delivered,
            self.records_skipped,
            self.peers,
            self.stats.format()
        );
        if self.advertised {
            out.push_str("\nAdvertised once");
        }
        if let Some(targets) = self.deauth_targets {
            out.push_str(&format!("\nDeauth: {} targets", targets));
        }
        out.push_str(&format!("\nTransmitted: {} frames", self.frames_transmitted));
        out
    }
}

async fn join<T>(task: JoinHandle<T>, what: &str) -> Result<T> {
    task.await
        .map_err(|e| Error::ExecutionFailed(format!("{} task failed: {}", what, e)))
}

pub async fn run(cli: &Cli) -> Result<RunSummary> {
    let config = cli.config()?;
    let channel = cli.channel()?;

    let store = Arc::new(NdjsonStore::open(&cli.output).await?);
    let (pwnd_tot, friends_tot) = store.totals().await?;
    let stats = Arc::new(GridStats::new());
    stats.restore_totals(pwnd_tot, friends_tot);
    info!(pwnd_tot, friends_tot, mode = ?config.mode, "Starting");

    let (pipeline, workers) = CapturePipeline::new(config.queue_capacity, store.clone(), stats.clone());
    let (packet_worker, friend_worker) = workers.spawn();

    let radio = Arc::new(LoggingRadio::new(channel));
    let manager = AttackManager::new(radio.clone());
    let registry = Arc::new(BeaconRegistry::new());
    let ssids = Arc::new(SsidBook::new());

    let mut sniffer = Sniffer::new(&config, pipeline, stats.clone())
        .with_registry(registry.clone(), ssids.clone())
        .with_mood(Arc::new(LogMood));
    if config.mode.lures() {
        if config.scope.is_empty() {
            warn!("Aggressive mode with an empty target scope, no lures will be sent");
        }
        let (dispatcher, worker) = lure_channel(&config, ssids.clone());
        sniffer = sniffer.with_lures(dispatcher);
        manager.launch(Arc::new(worker))?;
    }
    let sniffer = Arc::new(sniffer);
    sniffer.install(radio.as_ref())?;

    let replay = {
        let radio = radio.clone();
        let path = cli.read.clone();
        let task = tokio::task::spawn_blocking(move || {
            PcapReplay::open(path)?
                .with_default_channel(channel)
                .run(|frame| radio.deliver(frame))
        });
        join(task, "replay").await??
    };

    let gone = sniffer.mark_gone_peers(Instant::now());
    let peers = sniffer.peers();
    for peer in &peers {
        info!(name = %peer.name, identity = %peer.identity, rssi = peer.rssi, gone = peer.gone, "Peer");
    }
    info!(peers = peers.len(), gone, "Discovery done");

    // the receive callback holds the other sniffer handle
    radio.disable_promiscuous();

    let mut advertised = false;
    if cli.advertise {
        let identity = SessionIdentity::generate(&config.device_name);
        let advertisement = Advertisement::for_device(
            &identity,
            &config,
            FACE,
            stats.pwnd_run(),
            stats.pwnd_tot(),
            stats.uptime(),
        );
        Advertiser::new(radio.clone(), &config)
            .advertise(channel, &advertisement)
            .await?;
        advertised = true;
    }

    let deauth = if cli.deauth {
        if config.scope.is_empty() {
            warn!("Deauthentication requested with an empty target scope, nothing will be sent");
        }
        radio.set_channel(channel)?;
        let engine = DeauthEngine::new(registry, ssids, &config);
        let report = engine.run_cycle(radio.as_ref(), &AttackStatsCounters::default())?;
        info!(
            snapshot = report.snapshot_len,
            targeted = report.targeted,
            out_of_scope = report.out_of_scope,
            frames = report.frames_sent,
            "Deauth cycle done"
        );
        Some(report)
    } else {
        None
    };

    // closes the pipeline and lure queues
    drop(sniffer);
    manager.stop_all().await?;
    let packets = join(packet_worker, "packet worker").await?;
    let friends = join(friend_worker, "friend worker").await?;
    info!(packets, friends, "Persistence drained");

    let (frames_transmitted, _) = radio.transmitted();
    Ok(RunSummary::new(
        replay,
        peers.len(),
        advertised,
        deauth,
        frames_transmitted,
        stats.snapshot(),
    ))
}

#[cfg(test)]
mod tests;
