//! Simulation context: graph, balances, and ledger behind one owner.
//!
//! [`RewardEngine`] applies growth events in order. A reward trigger is
//! fully processed (traversal, split, crediting, ledger append) before the
//! next event is looked at, and crediting is all-or-nothing: new balances
//! are staged with overflow checks and only written once every one of them
//! is known to fit.

use std::collections::HashMap;
use std::ops::AddAssign;

use cascade_core::error::{CascadeError, ConfigError, GraphError, RewardError};
use cascade_core::graph::ReferralGraph;
use cascade_core::growth::{GrowthDriver, GrowthEvent, RewardTrigger};
use cascade_core::ledger::EventLedger;
use cascade_core::types::UserId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculator::{ChainRewardCalculator, Distribution};
use crate::config::EngineConfig;

/// What happened during one tick.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub users_created: usize,
    pub users_deactivated: usize,
    pub events_processed: usize,
    /// Events (of any kind) that failed and were skipped.
    pub events_rejected: usize,
    pub distributed: u128,
}

/// Totals across a multi-tick run.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u64,
    pub users_created: usize,
    pub users_deactivated: usize,
    pub events_processed: usize,
    pub events_rejected: usize,
    pub distributed: u128,
}

impl AddAssign<&TickReport> for RunReport {
    fn add_assign(&mut self, tick: &TickReport) {
        self.ticks += 1;
        self.users_created += tick.users_created;
        self.users_deactivated += tick.users_deactivated;
        self.events_processed += tick.events_processed;
        self.events_rejected += tick.events_rejected;
        self.distributed += tick.distributed;
    }
}

/// Outcome of applying a single growth event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    UserCreated(UserId),
    UserDeactivated(UserId),
    Rewarded(Distribution),
}

/// Owner of all mutable simulation state.
#[derive(Debug, Clone)]
pub struct RewardEngine {
    graph: ReferralGraph,
    ledger: EventLedger,
    rewards: HashMap<UserId, u64>,
    calculator: ChainRewardCalculator,
    tick: u64,
}

impl RewardEngine {
    /// Create an engine with an empty graph at tick 0.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_graph(config, ReferralGraph::new())
    }

    /// Create an engine over an existing graph.
    pub fn with_graph(config: EngineConfig, graph: ReferralGraph) -> Result<Self, ConfigError> {
        Ok(Self {
            graph,
            ledger: EventLedger::new(),
            rewards: HashMap::new(),
            calculator: ChainRewardCalculator::new(config)?,
            tick: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.calculator.config()
    }

    pub fn graph(&self) -> &ReferralGraph {
        &self.graph
    }

    /// Mutable graph access for callers that mutate structure directly.
    pub fn graph_mut(&mut self) -> &mut ReferralGraph {
        &mut self.graph
    }

    pub fn ledger(&self) -> &EventLedger {
        &self.ledger
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Cumulative reward credited to `user_id` (0 if never credited).
    pub fn reward_of(&self, user_id: UserId) -> u64 {
        self.rewards.get(&user_id).copied().unwrap_or(0)
    }

    /// Per-user cumulative rewards. Users never credited are absent.
    pub fn rewards(&self) -> &HashMap<UserId, u64> {
        &self.rewards
    }

    pub fn total_distributed(&self) -> u128 {
        self.ledger.total_distributed()
    }

    /// Create a user joining at the current tick.
    pub fn create_user(&mut self, referrer: Option<UserId>) -> Result<UserId, GraphError> {
        self.graph.add_user(referrer, self.tick)
    }

    pub fn deactivate(&mut self, user_id: UserId) -> Result<(), GraphError> {
        self.graph.deactivate(user_id)
    }

    /// Compute, credit, and record one reward trigger.
    ///
    /// On error nothing is credited and nothing is recorded.
    pub fn process_trigger(&mut self, trigger: &RewardTrigger) -> Result<Distribution, RewardError> {
        let dist = self
            .calculator
            .compute(&self.graph, trigger.user_id, trigger.gross_amount)?;

        let mut staged = Vec::with_capacity(dist.recipients.len());
        for (&user, &amount) in dist.recipients.iter().zip(&dist.amounts) {
            let balance = self
                .reward_of(user)
                .checked_add(amount)
                .ok_or(RewardError::ArithmeticOverflow)?;
            staged.push((user, balance));
        }
        for (user, balance) in staged {
            self.rewards.insert(user, balance);
        }

        let distributed = dist.total();
        let event = self.ledger.record(
            trigger.user_id,
            dist.gross_amount,
            distributed,
            trigger.category.clone(),
            trigger.timestamp,
            dist.chain_end,
        );

        if dist.chain_end.is_truncated() {
            warn!(
                user = %trigger.user_id,
                chain_len = dist.chain_len,
                end = ?dist.chain_end,
                "reward: chain truncated before ROOT"
            );
        }
        debug!(
            event = %event.id,
            user = %trigger.user_id,
            gross = dist.gross_amount,
            distributed,
            dust = dist.remaining,
            recipients = dist.recipients.len(),
            "reward: distributed"
        );

        Ok(dist)
    }

    /// Apply a single growth event at the current tick.
    pub fn apply(&mut self, event: &GrowthEvent) -> Result<Applied, CascadeError> {
        match event {
            GrowthEvent::CreateUser { referrer } => {
                Ok(Applied::UserCreated(self.create_user(*referrer)?))
            }
            GrowthEvent::Deactivate { user_id } => {
                self.deactivate(*user_id)?;
                Ok(Applied::UserDeactivated(*user_id))
            }
            GrowthEvent::Trigger(trigger) => Ok(Applied::Rewarded(self.process_trigger(trigger)?)),
        }
    }

    /// Poll `driver` for the current tick, apply its events in order, and
    /// advance the clock. Failed events are logged and skipped.
    pub fn run_tick<D: GrowthDriver + ?Sized>(&mut self, driver: &mut D) -> TickReport {
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        for event in driver.poll(self.tick) {
            match self.apply(&event) {
                Ok(Applied::UserCreated(_)) => report.users_created += 1,
                Ok(Applied::UserDeactivated(_)) => report.users_deactivated += 1,
                Ok(Applied::Rewarded(dist)) => {
                    report.events_processed += 1;
                    report.distributed += dist.total() as u128;
                }
                Err(err) => {
                    report.events_rejected += 1;
                    warn!(tick = self.tick, error = %err, ?event, "engine: event rejected");
                }
            }
        }

        info!(
            tick = report.tick,
            created = report.users_created,
            deactivated = report.users_deactivated,
            processed = report.events_processed,
            rejected = report.events_rejected,
            users = self.graph.len(),
            active = self.graph.active_count(),
            "engine: tick complete"
        );

        self.tick += 1;
        report
    }

    /// Run exactly `ticks` ticks against `driver`.
    pub fn run<D: GrowthDriver + ?Sized>(&mut self, driver: &mut D, ticks: u64) -> RunReport {
        let mut total = RunReport::default();
        for _ in 0..ticks {
            let report = self.run_tick(driver);
            total += &report;
        }
        total
    }

    /// Run until `driver` reports it is exhausted, bounded by `max_ticks`.
    pub fn run_to_completion<D: GrowthDriver + ?Sized>(&mut self, driver: &mut D, max_ticks: u64) -> RunReport {
        let mut total = RunReport::default();
        while total.ticks < max_ticks && !driver.is_exhausted(self.tick) {
            let report = self.run_tick(driver);
            total += &report;
        }
        total
    }
}
