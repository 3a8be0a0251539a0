//! Attack manager
//!
//! Tracks every running attack by id in a `DashMap` so the CLI and
//! shutdown code can reach them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use pwngrid_core::{Attack, AttackContext, AttackHandle, Error, Radio, Result};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::executor::{stop_and_wait, AttackExecutor};

pub struct AttackManager {
    radio: Arc<dyn Radio>,
    attacks: DashMap<Uuid, AttackHandle>,
    shutting_down: AtomicBool,
}

impl AttackManager {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            radio,
            attacks: DashMap::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Start `attack` on the managed radio and return its id
    pub fn launch(&self, attack: Arc<dyn Attack>) -> Result<Uuid> {
        if self.shutting_down.load(Ordering::Relaxed) {
            return Err(Error::ExecutionFailed("Manager is shutting down".to_string()));
        }

        let name = attack.name().to_string();
        let context = AttackContext::new(self.radio.clone());
        let handle = AttackExecutor::new(name.clone()).execute(attack, context)?;
        let id = handle.id;
        self.attacks.insert(id, handle);

        info!(id = %id, attack = %name, "Attack launched");
        Ok(id)
    }

    /// Stop one attack and wait for it
    pub async fn stop(&self, id: Uuid) -> Result<()> {
        let Some((_, mut handle)) = self.attacks.remove(&id) else {
            warn!(id = %id, "Attack not found");
            return Err(Error::NotFound(format!("Attack {} not found", id)));
        };
        stop_and_wait(&mut handle).await?;
        let stats = handle.stats();
        info!(
            id = %id,
            attack = %handle.attack_name,
            frames = stats.frames_sent,
            errors = stats.errors,
            "Attack stopped"
        );
        Ok(())
    }

    /// Stop everything; no further launches are accepted
    pub async fn stop_all(&self) -> Result<()> {
        self.shutting_down.store(true, Ordering::Relaxed);
        let ids: Vec<Uuid> = self.attacks.iter().map(|entry| *entry.key()).collect();

        let mut failed = 0;
        for id in ids {
            if let Err(e) = self.stop(id).await {
                error!(id = %id, error = %e, "Failed to stop attack");
                failed += 1;
            }
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(Error::ExecutionFailed(format!("Failed to stop {} attacks", failed)))
        }
    }

    pub fn active_count(&self) -> usize {
        self.attacks.len()
    }
}

impl Drop for AttackManager {
    fn drop(&mut self) {
        for entry in self.attacks.iter() {
            entry.value().stop();
        }
    }
}
