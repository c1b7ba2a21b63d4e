//! Growth driver interface.
//!
//! The population process (stochastic referral, churn, purchase sampling)
//! lives outside the engine. It talks to the engine through an ordered
//! stream of [`GrowthEvent`]s per simulation tick. [`ScriptedDriver`]
//! replays a fixed script and is what tests and replays use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Category, UserId};

/// A purchase-like event that asks the engine to split a reward.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RewardTrigger {
    pub user_id: UserId,
    /// Gross reward in base units. Signed so that a malformed negative
    /// request can be represented and rejected.
    pub gross_amount: i64,
    pub category: Category,
    pub timestamp: u64,
}

impl RewardTrigger {
    pub fn new(user_id: UserId, gross_amount: i64, category: impl Into<String>, timestamp: u64) -> Self {
        Self {
            user_id,
            gross_amount,
            category: Category::new(category),
            timestamp,
        }
    }
}

/// One mutation or trigger emitted by a growth driver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthEvent {
    /// Create a user. Ids are assigned sequentially by the graph, so a
    /// driver can predict the id of the n-th created user.
    CreateUser { referrer: Option<UserId> },
    /// Mark a user churned.
    Deactivate { user_id: UserId },
    /// Request a reward distribution.
    Trigger(RewardTrigger),
}

/// Source of graph mutations and reward triggers, polled once per tick.
///
/// Events within a tick are applied in the returned order.
pub trait GrowthDriver {
    /// Events for simulation step `tick`. An empty vec means a quiet tick.
    fn poll(&mut self, tick: u64) -> Vec<GrowthEvent>;

    /// Whether the driver has nothing left to emit at or after `tick`.
    ///
    /// Default implementation: never exhausted.
    fn is_exhausted(&self, _tick: u64) -> bool {
        false
    }
}

/// Replays a fixed per-tick event script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    script: BTreeMap<u64, Vec<GrowthEvent>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the script for `tick`.
    pub fn push(&mut self, tick: u64, event: GrowthEvent) -> &mut Self {
        self.script.entry(tick).or_default().push(event);
        self
    }

    pub fn create_user(&mut self, tick: u64, referrer: Option<UserId>) -> &mut Self {
        self.push(tick, GrowthEvent::CreateUser { referrer })
    }

    pub fn deactivate(&mut self, tick: u64, user_id: UserId) -> &mut Self {
        self.push(tick, GrowthEvent::Deactivate { user_id })
    }

    pub fn trigger(&mut self, tick: u64, user_id: UserId, gross_amount: i64, category: &str) -> &mut Self {
        self.push(
            tick,
            GrowthEvent::Trigger(RewardTrigger::new(user_id, gross_amount, category, tick)),
        )
    }

    /// Last tick with scripted events, if any.
    pub fn last_tick(&self) -> Option<u64> {
        self.script.keys().next_back().copied()
    }

    /// Number of events not yet polled.
    pub fn pending(&self) -> usize {
        self.script.values().map(Vec::len).sum()
    }
}

impl GrowthDriver for ScriptedDriver {
    fn poll(&mut self, tick: u64) -> Vec<GrowthEvent> {
        self.script.remove(&tick).unwrap_or_default()
    }

    fn is_exhausted(&self, tick: u64) -> bool {
        self.script.range(tick..).next().is_none()
    }
}
