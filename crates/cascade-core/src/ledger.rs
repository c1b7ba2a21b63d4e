//! Append-only record of processed reward events.
//!
//! The ledger keeps insertion order (replaying the same event stream yields
//! the same ledger, ids included) and maintains running totals so that
//! `total_distributed` and `event_count` are O(1) reads. There is no API to
//! mutate or remove a recorded event.

use serde::{Deserialize, Serialize};

use crate::types::{Category, ChainEnd, EventId, UserId};

/// One committed reward event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RewardEvent {
    /// BLAKE3 of (sequence, user, gross, category, timestamp).
    pub id: EventId,
    /// Position in the ledger, starting at 0.
    pub sequence: u64,
    pub user_id: UserId,
    /// Gross amount requested by the trigger, in base units.
    pub gross_amount: u64,
    /// Sum of every credit actually applied for this event.
    pub distributed: u64,
    pub category: Category,
    pub timestamp: u64,
    /// How the ancestor walk ended for this event.
    pub chain_end: ChainEnd,
}

impl RewardEvent {
    /// Amount left undistributed (dust), in base units.
    pub fn undistributed(&self) -> u64 {
        self.gross_amount.saturating_sub(self.distributed)
    }
}

/// Deterministic event id over the identifying fields.
pub fn derive_event_id(
    sequence: u64,
    user_id: UserId,
    gross_amount: u64,
    category: &Category,
    timestamp: u64,
) -> EventId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&user_id.0.to_le_bytes());
    hasher.update(&gross_amount.to_le_bytes());
    // length-prefixed
    hasher.update(&(category.as_str().len() as u64).to_le_bytes());
    hasher.update(category.as_str().as_bytes());
    hasher.update(&timestamp.to_le_bytes());
    EventId(hasher.finalize().into())
}

/// Append-only event ledger with running totals.
#[derive(Debug, Clone, Default)]
pub struct EventLedger {
    events: Vec<RewardEvent>,
    total_distributed: u128,
    total_undistributed: u128,
    truncated_chains: u64,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed event and update the running totals.
    pub fn record(
        &mut self,
        user_id: UserId,
        gross_amount: u64,
        distributed: u64,
        category: Category,
        timestamp: u64,
        chain_end: ChainEnd,
    ) -> &RewardEvent {
        let sequence = self.events.len() as u64;
        let id = derive_event_id(sequence, user_id, gross_amount, &category, timestamp);
        let event = RewardEvent {
            id,
            sequence,
            user_id,
            gross_amount,
            distributed,
            category,
            timestamp,
            chain_end,
        };

        self.total_distributed += distributed as u128;
        self.total_undistributed += event.undistributed() as u128;
        if chain_end.is_truncated() {
            self.truncated_chains += 1;
        }

        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Sum of `distributed` across all events.
    pub fn total_distributed(&self) -> u128 {
        self.total_distributed
    }

    /// Sum of dust left behind across all events.
    pub fn total_undistributed(&self) -> u128 {
        self.total_undistributed
    }

    pub fn event_count(&self) -> u64 {
        self.events.len() as u64
    }

    /// Events whose chain stopped before ROOT (depth cap, cycle, dangling link).
    pub fn truncated_chains(&self) -> u64 {
        self.truncated_chains
    }

    /// Events in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RewardEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[RewardEvent] {
        &self.events
    }

    pub fn get(&self, sequence: u64) -> Option<&RewardEvent> {
        usize::try_from(sequence).ok().and_then(|i| self.events.get(i))
    }

    pub fn last(&self) -> Option<&RewardEvent> {
        self.events.last()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a EventLedger {
    type Item = &'a RewardEvent;
    type IntoIter = std::slice::Iter<'a, RewardEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
