//! # cascade-core
//! Foundation types for the Cascade referral reward engine: identifiers,
//! amounts, the referral graph, the reward event ledger, and the growth
//! driver interface that feeds them.

pub mod amount;
pub mod constants;
pub mod error;
pub mod graph;
pub mod growth;
pub mod ledger;
pub mod types;

pub use graph::{ReferralChain, ReferralGraph, User};
pub use growth::{GrowthDriver, GrowthEvent, RewardTrigger, ScriptedDriver};
pub use ledger::{EventLedger, RewardEvent};
pub use types::{Category, ChainEnd, EventId, UserId};
