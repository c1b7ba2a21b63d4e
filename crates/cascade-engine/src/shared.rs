//! Thread-safe engine handle.
//!
//! Reward events read and then write shared per-user totals and the ledger,
//! so interleaving two events would break the exact-sum bookkeeping.
//! [`SharedEngine`] serializes all access behind one mutex; a whole tick
//! runs under a single lock acquisition, keeping ledger order equal to
//! simulated-time order.

use std::sync::Arc;

use cascade_core::error::{ConfigError, RewardError};
use cascade_core::growth::{GrowthDriver, RewardTrigger};
use parking_lot::Mutex;

use crate::calculator::Distribution;
use crate::config::EngineConfig;
use crate::engine::{RewardEngine, TickReport};

/// Cloneable, mutex-guarded [`RewardEngine`].
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<RewardEngine>>,
}

impl SharedEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(RewardEngine::new(config)?))
    }

    pub fn from_engine(engine: RewardEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Process one trigger under the lock.
    pub fn process_trigger(&self, trigger: &RewardTrigger) -> Result<Distribution, RewardError> {
        self.inner.lock().process_trigger(trigger)
    }

    /// Run one full tick under a single lock acquisition.
    pub fn run_tick<D: GrowthDriver + ?Sized>(&self, driver: &mut D) -> TickReport {
        self.inner.lock().run_tick(driver)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut RewardEngine) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn total_distributed(&self) -> u128 {
        self.inner.lock().total_distributed()
    }
}
