//! Chain reward calculator.
//!
//! Turns one reward request into a [`Distribution`] without touching any
//! state: walk the ancestor chain, reserve the originator's share, then
//! split the remainder across at most `max_recipients` ancestors with the
//! configured strategy. Committing the result is the
//! [`RewardEngine`](crate::RewardEngine)'s job, so a failed computation
//! leaves nothing behind.
//!
//! Arithmetic is integer-only: every bps product uses a `u128`
//! intermediate and floor division.

use cascade_core::amount;
use cascade_core::error::{ConfigError, RewardError};
use cascade_core::graph::{ReferralChain, ReferralGraph};
use cascade_core::types::{ChainEnd, UserId};
use cascade_decay::{geometric_split, DecayPolicy};
use serde::{Deserialize, Serialize};

use crate::config::{DecayMode, EngineConfig, Strategy};

/// Who receives what for one reward event.
///
/// `recipients` and `amounts` are parallel. Position 0 is always the
/// triggering user with its original share; ancestors follow nearest first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Distribution {
    pub user_id: UserId,
    pub gross_amount: u64,
    pub original_share: u64,
    pub recipients: Vec<UserId>,
    pub amounts: Vec<u64>,
    /// Undistributed dust. Zero in geometric mode whenever an ancestor exists.
    pub remaining: u64,
    pub chain_end: ChainEnd,
    /// Members walked, including the triggering user.
    pub chain_len: usize,
    pub mode: DecayMode,
}

impl Distribution {
    /// Sum of every amount, original share included.
    pub fn total(&self) -> u64 {
        self.amounts.iter().sum()
    }

    /// Ancestor credits only, nearest first.
    pub fn chain_credits(&self) -> impl Iterator<Item = (UserId, u64)> + '_ {
        self.recipients
            .iter()
            .copied()
            .zip(self.amounts.iter().copied())
            .skip(1)
    }

    /// Number of ancestors credited.
    pub fn chain_recipient_count(&self) -> usize {
        self.recipients.len().saturating_sub(1)
    }

    /// Whether the whole gross amount was handed out.
    pub fn is_exact(&self) -> bool {
        self.remaining == 0
    }
}

/// Pure reward splitter over a [`ReferralGraph`].
#[derive(Debug, Clone)]
pub struct ChainRewardCalculator {
    config: EngineConfig,
    strategy: Strategy,
}

impl ChainRewardCalculator {
    /// Build a calculator from a config, validating it first.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let strategy = config.strategy()?;
        Ok(Self { config, strategy })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the distribution for `user_id` requesting `gross_amount` base units.
    ///
    /// # Errors
    ///
    /// - [`RewardError::InvalidAmount`] if `gross_amount` is negative
    /// - [`RewardError::UnknownUser`] if `user_id` is not in the graph
    /// - [`RewardError::ArithmeticOverflow`] / [`RewardError::Decay`] on overflow
    pub fn compute(
        &self,
        graph: &ReferralGraph,
        user_id: UserId,
        gross_amount: i64,
    ) -> Result<Distribution, RewardError> {
        let gross = amount::from_signed(gross_amount)?;
        let chain = graph
            .ancestor_chain_bounded(user_id, self.config.max_chain_depth)
            .map_err(|_| RewardError::UnknownUser(user_id))?;
        self.split_chain(&chain, gross)
    }

    /// Split `gross` over an already-walked chain.
    pub fn split_chain(&self, chain: &ReferralChain, gross: u64) -> Result<Distribution, RewardError> {
        let user_id = chain.originator();
        let original_share = amount::apply_bps(gross, self.config.original_user_share_bps)?;
        let remaining = gross - original_share;

        let eligible = chain.ancestors().len().min(self.config.max_recipients);
        let ancestors = &chain.ancestors()[..eligible];

        let mut recipients = Vec::with_capacity(eligible + 1);
        let mut amounts = Vec::with_capacity(eligible + 1);
        recipients.push(user_id);
        amounts.push(original_share);

        let remaining = match self.strategy {
            Strategy::Geometric => {
                let parts = geometric_split(remaining, eligible)?;
                recipients.extend_from_slice(ancestors);
                amounts.extend_from_slice(&parts);
                if eligible == 0 { remaining } else { 0 }
            }
            Strategy::Decay(policy) => {
                decay_split(&policy, ancestors, remaining, &mut recipients, &mut amounts)?
            }
        };

        Ok(Distribution {
            user_id,
            gross_amount: gross,
            original_share,
            recipients,
            amounts,
            remaining,
            chain_end: chain.end(),
            chain_len: chain.len(),
            mode: self.config.decay_mode,
        })
    }
}

/// Walk `ancestors` in order, crediting each the policy's level reward
/// capped at what is left. Stops once the balance cannot cover the
/// minimum reward or nothing more can be paid. Returns the dust.
fn decay_split(
    policy: &DecayPolicy,
    ancestors: &[UserId],
    mut remaining: u64,
    recipients: &mut Vec<UserId>,
    amounts: &mut Vec<u64>,
) -> Result<u64, RewardError> {
    let min_reward = policy.min_reward();

    for (level, &ancestor) in ancestors.iter().enumerate() {
        if remaining < min_reward {
            break;
        }
        let reward = policy.level_reward(remaining, level as u32)?;
        let credit = reward.min(remaining);
        if credit == 0 {
            break;
        }
        recipients.push(ancestor);
        amounts.push(credit);
        remaining -= credit;
    }

    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::constants::UNIT;
    use cascade_decay::DecayType;
    use proptest::prelude::*;

    /// Straight line of `n` users; user `n` is the deepest.
    fn line(n: usize) -> ReferralGraph {
        let mut g = ReferralGraph::new();
        let mut prev = None;
        for _ in 0..n {
            prev = Some(g.add_user(prev, 0).unwrap());
        }
        g
    }

    fn geometric() -> ChainRewardCalculator {
        ChainRewardCalculator::new(EngineConfig::contract()).unwrap()
    }

    fn configurable(decay_type: DecayType, factor: u64, min_reward: u64) -> ChainRewardCalculator {
        ChainRewardCalculator::new(EngineConfig {
            decay_mode: DecayMode::Configurable,
            decay_type: Some(decay_type),
            decay_factor_bps: factor,
            min_reward,
            ..EngineConfig::contract()
        })
        .unwrap()
    }

    // ------------------------------------------------------------------
    // Geometric mode
    // ------------------------------------------------------------------

    #[test]
    fn worked_example_two_recipients() {
        // gross 100, share 80% -> 80 kept, 20 split as [13, 7]
        let g = line(3);
        let d = geometric().compute(&g, UserId(3), 100).unwrap();
        assert_eq!(d.original_share, 80);
        assert_eq!(d.recipients, vec![UserId(3), UserId(2), UserId(1)]);
        assert_eq!(d.amounts, vec![80, 13, 7]);
        assert_eq!(d.total(), 100);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.chain_end, ChainEnd::Root);
    }

    #[test]
    fn root_user_keeps_only_share() {
        let g = line(1);
        let d = geometric().compute(&g, UserId(1), 100).unwrap();
        assert_eq!(d.recipients, vec![UserId(1)]);
        assert_eq!(d.amounts, vec![80]);
        assert_eq!(d.total(), d.original_share);
        assert_eq!(d.remaining, 20);
        assert_eq!(d.chain_recipient_count(), 0);
    }

    #[test]
    fn recipients_capped_at_ten() {
        let g = line(30);
        let d = geometric().compute(&g, UserId(30), (1_000 * UNIT) as i64).unwrap();
        assert_eq!(d.chain_recipient_count(), 10);
        assert_eq!(d.total(), 1_000 * UNIT);
        let credited: Vec<u64> = d.chain_credits().map(|(u, _)| u.0).collect();
        assert_eq!(credited, (20..=29).rev().collect::<Vec<u64>>());
    }

    #[test]
    fn zero_gross_distributes_zeros() {
        let g = line(4);
        let d = geometric().compute(&g, UserId(4), 0).unwrap();
        assert_eq!(d.amounts, vec![0, 0, 0, 0]);
        assert!(d.is_exact());
    }

    #[test]
    fn full_share_leaves_nothing_for_chain() {
        let calc = ChainRewardCalculator::new(EngineConfig {
            original_user_share_bps: 10_000,
            ..EngineConfig::contract()
        })
        .unwrap();
        let d = calc.compute(&line(3), UserId(3), 55).unwrap();
        assert_eq!(d.amounts, vec![55, 0, 0]);
    }

    #[test]
    fn depth_cap_limits_recipients() {
        let calc = ChainRewardCalculator::new(EngineConfig {
            max_chain_depth: 3,
            ..EngineConfig::contract()
        })
        .unwrap();
        let d = calc.compute(&line(8), UserId(8), 100).unwrap();
        assert_eq!(d.chain_len, 3);
        assert_eq!(d.chain_end, ChainEnd::DepthLimit);
        assert_eq!(d.amounts, vec![80, 13, 7]);
    }

    // ------------------------------------------------------------------
    // Configurable mode
    // ------------------------------------------------------------------

    #[test]
    fn exponential_walks_remaining_balance() {
        // remaining 20: level 0 -> floor(20 * 0.5) = 10, remaining 10;
        // level 1 -> 10 * 0.5 * 0.5 = 2, remaining 8.
        let calc = configurable(DecayType::Exponential, 5_000, 1);
        let d = calc.compute(&line(3), UserId(3), 100).unwrap();
        assert_eq!(d.amounts, vec![80, 10, 2]);
        assert_eq!(d.remaining, 8);
        assert_eq!(d.total() + d.remaining, 100);
    }

    #[test]
    fn linear_level_zero_takes_everything() {
        let calc = configurable(DecayType::Linear, 1_000, 0);
        let d = calc.compute(&line(4), UserId(4), 100).unwrap();
        assert_eq!(d.amounts, vec![80, 20]);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.chain_recipient_count(), 1);
    }

    #[test]
    fn fixed_pays_flat_until_exhausted() {
        let calc = configurable(DecayType::Fixed, 6, 0);
        let d = calc.compute(&line(6), UserId(6), 100).unwrap();
        // remaining 20: 6, 6, 6, then 2 left -> capped credit of 2
        assert_eq!(d.amounts, vec![80, 6, 6, 6, 2]);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn stops_when_balance_below_min() {
        let calc = configurable(DecayType::Fixed, 6, 5);
        let d = calc.compute(&line(6), UserId(6), 100).unwrap();
        // 20 -> 14 -> 8 -> 2 (< 5, stop)
        assert_eq!(d.amounts, vec![80, 6, 6, 6]);
        assert_eq!(d.remaining, 2);
        assert!(!d.is_exact());
    }

    #[test]
    fn min_reward_floor_scenario() {
        // base 10 credits, 70% factor, 0.05 floor: first level gets exactly 7.0.
        let calc = ChainRewardCalculator::new(EngineConfig {
            original_user_share_bps: 0,
            ..EngineConfig::moderate()
        })
        .unwrap();
        let d = calc.compute(&line(2), UserId(2), (10 * UNIT) as i64).unwrap();
        assert_eq!(d.amounts, vec![0, 7 * UNIT]);
        assert_eq!(d.remaining, 3 * UNIT);
    }

    #[test]
    fn configurable_root_user_keeps_share_only() {
        let calc = configurable(DecayType::Exponential, 7_000, 0);
        let d = calc.compute(&line(1), UserId(1), 1_000).unwrap();
        assert_eq!(d.amounts, vec![800]);
        assert_eq!(d.remaining, 200);
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    #[test]
    fn negative_amount_rejected() {
        let err = geometric().compute(&line(2), UserId(2), -5).unwrap_err();
        assert_eq!(err, RewardError::InvalidAmount("-5".into()));
    }

    #[test]
    fn unknown_user_rejected() {
        let err = geometric().compute(&line(2), UserId(9), 5).unwrap_err();
        assert_eq!(err, RewardError::UnknownUser(UserId(9)));
    }

    #[test]
    fn invalid_config_rejected() {
        let err = ChainRewardCalculator::new(EngineConfig {
            decay_mode: DecayMode::Configurable,
            ..EngineConfig::contract()
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingDecayType);
    }

    // ------------------------------------------------------------------
    // Corrupt graphs
    // ------------------------------------------------------------------

    #[test]
    fn split_chain_accepts_only_validated_chains() {
        assert!(serde_json::from_str::<ReferralChain>(r#"{"members":[],"end":"root"}"#).is_err());

        let chain: ReferralChain =
            serde_json::from_str(r#"{"members":[7,4],"end":"dangling"}"#).unwrap();
        let d = geometric().split_chain(&chain, 100).unwrap();
        assert_eq!(d.recipients, vec![UserId(7), UserId(4)]);
        assert_eq!(d.amounts, vec![80, 20]);
        assert_eq!(d.chain_end, ChainEnd::Dangling);
    }

    #[test]
    fn cycle_does_not_double_credit() {
        let mut g = line(3);
        g.force_referrer(UserId(1), Some(UserId(3)));
        let d = geometric().compute(&g, UserId(3), 100).unwrap();
        assert_eq!(d.chain_end, ChainEnd::Cycle);
        assert_eq!(d.recipients, vec![UserId(3), UserId(2), UserId(1)]);
        assert_eq!(d.total(), 100);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn geometric_sums_exactly(
            gross in 0i64..i64::MAX,
            depth in 2usize..=11,
            share in 0u64..=10_000,
        ) {
            let calc = ChainRewardCalculator::new(EngineConfig {
                original_user_share_bps: share,
                ..EngineConfig::contract()
            }).unwrap();
            let d = calc.compute(&line(depth), UserId(depth as u64), gross).unwrap();
            prop_assert_eq!(d.chain_recipient_count(), depth - 1);
            prop_assert_eq!(d.total() as i64, gross);
        }

        #[test]
        fn configurable_never_exceeds_gross(
            gross in 0i64..1_000_000_000_000,
            depth in 1usize..40,
            factor in 0u64..=10_000,
            min in 0u64..10_000,
            kind in 0u8..3,
        ) {
            let decay_type = [DecayType::Linear, DecayType::Exponential, DecayType::Fixed][kind as usize];
            let calc = configurable(decay_type, factor, min);
            let d = calc.compute(&line(depth), UserId(depth as u64), gross).unwrap();
            prop_assert!(d.chain_recipient_count() <= 10);
            prop_assert_eq!(d.total() + d.remaining, gross as u64);
        }
    }
}
