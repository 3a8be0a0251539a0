//! Attack executor
//!
//! Spawns an [`Attack`] on the tokio runtime, logs its start and outcome, and
//! hands back an [`AttackHandle`] carrying the shared running flag and
//! counters.

use std::sync::Arc;

use pwngrid_core::{Attack, AttackContext, AttackHandle, Error, Result};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct AttackExecutor {
    id: Uuid,
    attack_name: String,
}

impl AttackExecutor {
    pub fn new(attack_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            attack_name: attack_name.into(),
        }
    }

    /// Spawn `attack` and return its handle
    pub fn execute(self, attack: Arc<dyn Attack>, context: AttackContext) -> Result<AttackHandle> {
        let id = self.id;
        let attack_name = self.attack_name;
        let running = context.running.clone();
        let stats = context.stats.clone();

        info!(id = %id, attack = %attack_name, "Starting attack");

        let task_name = attack_name.clone();
        let task_running = running.clone();
        let task_handle = tokio::spawn(async move {
            let result = attack.execute(context).await;
            task_running.store(false, std::sync::atomic::Ordering::Relaxed);

            match &result {
                Ok(()) => info!(id = %id, attack = %task_name, "Attack finished"),
                Err(e) => error!(id = %id, attack = %task_name, error = %e, "Attack failed"),
            }
            result
        });

        Ok(AttackHandle {
            id,
            attack_name,
            running,
            stats,
            task_handle: Some(task_handle),
        })
    }
}

/// Wait for the attack task behind `handle` to end
pub async fn wait_for_attack(handle: &mut AttackHandle) -> Result<()> {
    let Some(task_handle) = handle.task_handle.take() else {
        warn!(id = %handle.id, "Attack task already joined");
        return Ok(());
    };

    match task_handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            error!(id = %handle.id, "Attack task panicked");
            Err(Error::ExecutionFailed("Attack task panicked".to_string()))
        }
        Err(e) => {
            error!(id = %handle.id, error = %e, "Failed to join attack task");
            Err(Error::ExecutionFailed(format!("Failed to join attack task: {}", e)))
        }
    }
}

/// Clear the running flag and wait for the task to end
pub async fn stop_and_wait(handle: &mut AttackHandle) -> Result<()> {
    debug!(id = %handle.id, "Stopping attack");
    handle.stop();
    wait_for_attack(handle).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRadio;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Ticking {
        fail: bool,
        panic: bool,
    }

    #[async_trait]
    impl Attack for Ticking {
        async fn execute(&self, ctx: AttackContext) -> Result<()> {
            if self.panic {
                panic!("boom");
            }
            if self.fail {
                return Err(Error::radio("no tx"));
            }
            while ctx.is_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ctx.stats.record_sent(10);
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "ticking"
        }
    }

    fn context() -> AttackContext {
        AttackContext::new(Arc::new(FakeRadio::on(1)))
    }

    #[tokio::test]
    async fn test_stop_and_wait() {
        let attack = Arc::new(Ticking {
            fail: false,
            panic: false,
        });
        let mut handle = AttackExecutor::new("ticking").execute(attack, context()).unwrap();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        stop_and_wait(&mut handle).await.unwrap();

        let stats = handle.stats();
        assert!(stats.frames_sent > 0);
        assert!(!handle.is_running());

        // second join is a no-op
        assert!(wait_for_attack(&mut handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_is_returned() {
        let attack = Arc::new(Ticking {
            fail: true,
            panic: false,
        });
        let mut handle = AttackExecutor::new("ticking").execute(attack, context()).unwrap();
        let result = wait_for_attack(&mut handle).await;
        assert!(matches!(result, Err(Error::Radio(_))));
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_panic_is_mapped() {
        let attack = Arc::new(Ticking {
            fail: false,
            panic: true,
        });
        let mut handle = AttackExecutor::new("ticking").execute(attack, context()).unwrap();
        let result = wait_for_attack(&mut handle).await;
        assert!(matches!(result, Err(Error::ExecutionFailed(_))));
    }
}
