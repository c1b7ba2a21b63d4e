//! # cascade-engine
//! Reward distribution for the Cascade referral program.
//!
//! - [`config::EngineConfig`]: validated engine configuration and presets
//! - [`calculator::ChainRewardCalculator`]: pure per-event split
//! - [`engine::RewardEngine`]: simulation context that commits credits
//! - [`shared::SharedEngine`]: mutex-guarded handle for multi-threaded callers
//! - [`analysis`]: read-only consumers (Gini, per-depth averages)

pub mod analysis;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod shared;

pub use calculator::{ChainRewardCalculator, Distribution};
pub use config::{DecayMode, EngineConfig};
pub use engine::{RewardEngine, RunReport, TickReport};
pub use shared::SharedEngine;
