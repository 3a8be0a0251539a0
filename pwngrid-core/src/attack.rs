//! Active-transmission traits and types

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Radio, Result};

/// Periodic or queue-driven work that transmits on the radio
#[async_trait]
pub trait Attack: Send + Sync {
    /// Run until `ctx.running` is cleared or the work source is exhausted
    async fn execute(&self, ctx: AttackContext) -> Result<()>;

    /// Get attack name
    fn name(&self) -> &str;
}

/// Attack statistics
#[derive(Debug, Clone, Default)]
pub struct AttackStats {
    /// Frames handed to the radio successfully
    pub frames_sent: u64,
    /// Bytes handed to the radio successfully
    pub bytes_sent: u64,
    /// Transmit or channel-switch failures
    pub errors: u64,
    /// Targets skipped because they are outside the authorized scope
    pub out_of_scope: u64,
    /// Completed cycles
    pub cycles: u64,
}

/// Context passed to [`Attack::execute`]
#[derive(Clone)]
pub struct AttackContext {
    pub radio: Arc<dyn Radio>,
    /// Running flag (attack should stop when this is false)
    pub running: Arc<AtomicBool>,
    pub stats: Arc<AttackStatsCounters>,
}

impl AttackContext {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            radio,
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(AttackStatsCounters::default()),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Thread-safe attack statistics counters
#[derive(Debug, Default)]
pub struct AttackStatsCounters {
    pub frames_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub errors: AtomicU64,
    pub out_of_scope: AtomicU64,
    pub cycles: AtomicU64,
}

impl AttackStatsCounters {
    pub fn record_sent(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_out_of_scope(&self) {
        self.out_of_scope.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cycles(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AttackStats {
        AttackStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            out_of_scope: self.out_of_scope.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a spawned attack
pub struct AttackHandle {
    /// Instance id (UUID v7 for time-ordered tracking)
    pub id: uuid::Uuid,
    pub attack_name: String,
    pub running: Arc<AtomicBool>,
    pub stats: Arc<AttackStatsCounters>,
    pub task_handle: Option<tokio::task::JoinHandle<Result<()>>>,
}

impl AttackHandle {
    /// Ask the attack to stop at its next check
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> AttackStats {
        self.stats.snapshot()
    }
}
