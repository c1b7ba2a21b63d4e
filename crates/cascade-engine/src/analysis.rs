//! Read-only consumers of engine state for offline reporting.
//!
//! Nothing here feeds back into reward computation, so floats are fine.

use std::collections::{BTreeMap, HashMap};

use cascade_core::graph::ReferralGraph;
use cascade_core::types::UserId;
use serde::{Deserialize, Serialize};

use crate::engine::RewardEngine;

/// Gini coefficient of `values` (0 = perfect equality, 1 = one holder).
///
/// Returns 0 for an empty slice or an all-zero distribution.
pub fn gini_coefficient(values: &[u64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut running: u128 = 0;
    let mut cumsum_total: f64 = 0.0;
    for &v in &sorted {
        running += v as u128;
        cumsum_total += running as f64;
    }
    if running == 0 {
        return 0.0;
    }
    let n = n as f64;
    (n + 1.0 - 2.0 * cumsum_total / running as f64) / n
}

/// Reward totals for users at one referral depth.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DepthStats {
    pub users: usize,
    pub total_rewards: u128,
}

impl DepthStats {
    /// Average reward per user at this depth, in base units.
    pub fn average(&self) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            self.total_rewards as f64 / self.users as f64
        }
    }
}

/// Group users by referral depth and total their rewards.
pub fn rewards_by_depth(graph: &ReferralGraph, rewards: &HashMap<UserId, u64>) -> BTreeMap<u32, DepthStats> {
    let mut levels: BTreeMap<u32, DepthStats> = BTreeMap::new();
    for user in graph.iter() {
        let stats = levels.entry(user.depth).or_default();
        stats.users += 1;
        stats.total_rewards += rewards.get(&user.id).copied().unwrap_or(0) as u128;
    }
    levels
}

/// Economic snapshot of a run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EconomicSummary {
    pub reward_events: u64,
    pub total_distributed: u128,
    pub total_undistributed: u128,
    pub truncated_chains: u64,
    pub total_users: usize,
    pub active_users: usize,
    pub total_referrals: usize,
    /// Base units per user, users never credited included (the reward cost
    /// per acquired user).
    pub avg_reward_per_user: f64,
    /// Base units distributed per referral made.
    pub cost_per_referral: f64,
    pub gini: f64,
    pub max_reward: u64,
}

impl EconomicSummary {
    pub fn from_engine(engine: &RewardEngine) -> Self {
        let graph = engine.graph();
        let ledger = engine.ledger();
        let per_user: Vec<u64> = graph.iter().map(|u| engine.reward_of(u.id)).collect();
        let total_users = graph.len();

        let avg_reward_per_user = if total_users == 0 {
            0.0
        } else {
            ledger.total_distributed() as f64 / total_users as f64
        };

        let total_referrals = graph.total_referrals();
        let cost_per_referral = if total_referrals == 0 {
            0.0
        } else {
            ledger.total_distributed() as f64 / total_referrals as f64
        };

        Self {
            reward_events: ledger.event_count(),
            total_distributed: ledger.total_distributed(),
            total_undistributed: ledger.total_undistributed(),
            truncated_chains: ledger.truncated_chains(),
            total_users,
            active_users: graph.active_count(),
            total_referrals,
            avg_reward_per_user,
            cost_per_referral,
            gini: gini_coefficient(&per_user),
            max_reward: per_user.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Per-category event count and distributed total, from the ledger.
pub fn totals_by_category(engine: &RewardEngine) -> BTreeMap<String, (u64, u128)> {
    let mut out: BTreeMap<String, (u64, u128)> = BTreeMap::new();
    for event in engine.ledger() {
        let entry = out.entry(event.category.as_str().to_string()).or_default();
        entry.0 += 1;
        entry.1 += event.distributed as u128;
    }
    out
}
