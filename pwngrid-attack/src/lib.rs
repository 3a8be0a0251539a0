//! Active transmission for pwngrid-rs
//!
//! - [`BeaconRegistry`] / [`SsidBook`]: what the receive path has seen
//! - [`DeauthEngine`] / [`DeauthAttack`]: periodic deauthentication bursts
//! - [`LureDispatcher`] / [`LureWorker`]: aggressive-mode probe response and
//!   auth/assoc injection
//! - [`AttackExecutor`] / [`AttackManager`]: spawning and tracking the above
//!
//! Nothing here transmits to an access point outside the configured
//! [`pwngrid_core::TargetScope`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pwngrid_attack::{AttackManager, BeaconRegistry, DeauthAttack, DeauthEngine, SsidBook};
//! use pwngrid_core::{GridConfig, Radio};
//!
//! # async fn run(radio: Arc<dyn Radio>) -> pwngrid_core::Result<()> {
//! let config = GridConfig::default();
//! let registry = Arc::new(BeaconRegistry::new());
//! let ssids = Arc::new(SsidBook::new());
//!
//! let engine = Arc::new(DeauthEngine::new(registry, ssids, &config));
//! let manager = AttackManager::new(radio);
//! manager.launch(Arc::new(DeauthAttack::new(engine, pwngrid_attack::deauth::DEFAULT_DEAUTH_PERIOD)))?;
//! manager.stop_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod deauth;
pub mod executor;
pub mod lure;
pub mod manager;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use deauth::{DeauthAttack, DeauthEngine, DeauthReport};
pub use executor::{stop_and_wait, wait_for_attack, AttackExecutor};
pub use lure::{lure_channel, Lure, LureDispatcher, LureWorker};
pub use manager::AttackManager;
pub use registry::{BeaconEntry, BeaconRegistry, SsidBook};
