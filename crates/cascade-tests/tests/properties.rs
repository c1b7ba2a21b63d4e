//! Property-based invariants across the graph, decay, and engine crates.
//!
//! Covered:
//! - Exact-sum distribution in geometric mode for 1..=10 ancestors
//! - Recipient cap for chains longer than 10
//! - Dust accounting and min-reward floor in configurable mode
//! - Exponential decay against its step recurrence
//! - Traversal idempotence over random forests
//! - Ledger totals agreeing with per-user balances after random runs

use cascade_core::constants::*;
use cascade_core::growth::{RewardTrigger, ScriptedDriver};
use cascade_core::types::{ChainEnd, UserId};
use cascade_decay::{DecayPolicy, DecayType};
use cascade_engine::{ChainRewardCalculator, DecayMode, EngineConfig, RewardEngine};
use cascade_tests::helpers::{forest, line_graph};
use proptest::prelude::*;

fn configurable(decay_type: DecayType, factor: u64, min_reward: u64, share_bps: u64) -> EngineConfig {
    EngineConfig {
        decay_mode: DecayMode::Configurable,
        decay_type: Some(decay_type),
        decay_factor_bps: factor,
        min_reward,
        original_user_share_bps: share_bps,
        max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        max_recipients: DEFAULT_MAX_RECIPIENTS,
    }
}

/// Unclamped reference: one floored multiplication per level.
fn exponential_recurrence(amount: u64, factor_bps: u64, level: u32) -> u64 {
    let mut r = amount as u128;
    for _ in 0..=level {
        r = r * factor_bps as u128 / BPS_PRECISION as u128;
    }
    r as u64
}

fn forest_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    proptest::collection::vec(proptest::option::weighted(0.85, any::<usize>()), 1..80)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn geometric_distribution_sums_to_gross(
        ancestors in 1usize..=10,
        gross in 0i64..=(1i64 << 53),
        share_bps in 0u64..=BPS_PRECISION,
    ) {
        let graph = line_graph(ancestors + 1);
        let calc = ChainRewardCalculator::new(EngineConfig {
            original_user_share_bps: share_bps,
            ..EngineConfig::contract()
        }).unwrap();

        let dist = calc.compute(&graph, UserId(ancestors as u64 + 1), gross).unwrap();

        prop_assert_eq!(dist.total(), gross as u64);
        prop_assert_eq!(dist.remaining, 0);
        prop_assert_eq!(dist.chain_recipient_count(), ancestors);
        prop_assert_eq!(dist.chain_end, ChainEnd::Root);
    }

    #[test]
    fn nearest_referrer_never_earns_less_than_next(
        ancestors in 2usize..=10,
        gross in 0i64..=(1i64 << 53),
    ) {
        let graph = line_graph(ancestors + 1);
        let calc = ChainRewardCalculator::new(EngineConfig::contract()).unwrap();
        let dist = calc.compute(&graph, UserId(ancestors as u64 + 1), gross).unwrap();

        let credits: Vec<u64> = dist.chain_credits().map(|(_, a)| a).collect();
        for pair in credits.windows(2) {
            prop_assert!(pair[0] >= pair[1], "credits not non-increasing: {:?}", credits);
        }
    }

    #[test]
    fn long_chains_credit_exactly_ten_ancestors(
        users in 12usize..=120,
        gross in 0i64..=(1i64 << 40),
    ) {
        let graph = line_graph(users);
        let calc = ChainRewardCalculator::new(EngineConfig::contract()).unwrap();
        let dist = calc.compute(&graph, UserId(users as u64), gross).unwrap();

        prop_assert_eq!(dist.chain_recipient_count(), GEOMETRIC_LEVELS);
        prop_assert_eq!(dist.total(), gross as u64);
        prop_assert!(dist.chain_len <= DEFAULT_MAX_CHAIN_DEPTH);

        // The ten credited ancestors are the ten nearest, in order.
        let expected: Vec<UserId> = (1..=GEOMETRIC_LEVELS as u64)
            .map(|k| UserId(users as u64 - k))
            .collect();
        let credited: Vec<UserId> = dist.chain_credits().map(|(u, _)| u).collect();
        prop_assert_eq!(credited, expected);
    }

    #[test]
    fn configurable_mode_accounts_for_every_unit(
        ancestors in 0usize..=15,
        gross in 0i64..=(1i64 << 45),
        factor in 0u64..=BPS_PRECISION,
        min_reward in 0u64..=UNIT,
        share_bps in 0u64..=BPS_PRECISION,
        kind in prop_oneof![
            Just(DecayType::Linear),
            Just(DecayType::Exponential),
            Just(DecayType::Fixed),
        ],
    ) {
        let graph = line_graph(ancestors + 1);
        let calc = ChainRewardCalculator::new(configurable(kind, factor, min_reward, share_bps)).unwrap();
        let dist = calc.compute(&graph, UserId(ancestors as u64 + 1), gross).unwrap();

        prop_assert_eq!(dist.total() + dist.remaining, gross as u64);
        prop_assert!(dist.chain_recipient_count() <= ancestors.min(DEFAULT_MAX_RECIPIENTS));
        for (_, credit) in dist.chain_credits() {
            prop_assert!(credit >= min_reward);
            prop_assert!(credit > 0);
        }
    }

    #[test]
    fn exponential_matches_recurrence_down_to_floor(
        amount in 0u64..=(1u64 << 50),
        factor in 1u64..BPS_PRECISION,
        level in 0u32..40,
        min_reward in 0u64..=UNIT,
    ) {
        let policy = DecayPolicy::Exponential { factor_bps: factor, min_reward };
        let got = policy.level_reward(amount, level).unwrap();
        let reference = exponential_recurrence(amount, factor, level);
        prop_assert_eq!(got, reference.max(min_reward));
    }

    #[test]
    fn ancestor_chain_is_idempotent(parents in forest_strategy()) {
        let graph = forest(&parents);
        for user in graph.iter() {
            let first = graph.ancestor_chain(user.id).unwrap();
            let second = graph.ancestor_chain(user.id).unwrap();
            prop_assert_eq!(&first, &second);

            let full = user.depth as usize + 1;
            prop_assert_eq!(first.len(), full.min(DEFAULT_MAX_CHAIN_DEPTH));
            if full <= DEFAULT_MAX_CHAIN_DEPTH {
                prop_assert_eq!(first.end(), ChainEnd::Root);
            } else {
                prop_assert_eq!(first.end(), ChainEnd::DepthLimit);
            }
        }
    }

    #[test]
    fn every_forest_member_splits_exactly(
        parents in forest_strategy(),
        gross in 0i64..=(1i64 << 40),
    ) {
        let graph = forest(&parents);
        let calc = ChainRewardCalculator::new(EngineConfig::contract()).unwrap();

        for user in graph.iter() {
            let dist = calc.compute(&graph, user.id, gross).unwrap();
            let chain = graph.ancestor_chain(user.id).unwrap();

            let cap = chain.ancestors().len().min(DEFAULT_MAX_RECIPIENTS) + 1;
            prop_assert_eq!(&dist.recipients[..], &chain.members()[..cap]);

            if user.referrer.is_some() {
                prop_assert_eq!(dist.total(), gross as u64);
            } else {
                prop_assert_eq!(dist.total(), dist.original_share);
                prop_assert_eq!(dist.recipients.len(), 1);
            }
        }
    }

    #[test]
    fn ledger_totals_match_balances_after_random_triggers(
        parents in forest_strategy(),
        triggers in proptest::collection::vec((any::<usize>(), 0i64..=(1i64 << 36)), 1..60),
        use_decay in any::<bool>(),
    ) {
        let config = if use_decay { EngineConfig::moderate() } else { EngineConfig::contract() };
        let mut engine = RewardEngine::with_graph(config, forest(&parents)).unwrap();
        let users = engine.graph().len();

        let mut expected_dust: u128 = 0;
        for (i, (pick, gross)) in triggers.iter().enumerate() {
            let user = UserId((pick % users) as u64 + 1);
            let dist = engine
                .process_trigger(&RewardTrigger::new(user, *gross, "purchase", i as u64))
                .unwrap();
            expected_dust += dist.remaining as u128;
        }

        let balances: u128 = engine.rewards().values().map(|&v| v as u128).sum();
        prop_assert_eq!(engine.total_distributed(), balances);
        prop_assert_eq!(engine.ledger().total_undistributed(), expected_dust);
        prop_assert_eq!(engine.ledger().event_count(), triggers.len() as u64);

        let sequences: Vec<u64> = engine.ledger().iter().map(|e| e.sequence).collect();
        let expected: Vec<u64> = (0..triggers.len() as u64).collect();
        prop_assert_eq!(sequences, expected);
    }

    #[test]
    fn scripted_runs_replay_identically(
        parents in forest_strategy(),
        gross in 1i64..=(1i64 << 36),
    ) {
        let mut script = ScriptedDriver::new();
        for (i, parent) in parents.iter().enumerate() {
            let referrer = match parent {
                Some(p) if i > 0 => Some(UserId((p % i) as u64 + 1)),
                _ => None,
            };
            script.create_user(0, referrer);
        }
        for id in 1..=parents.len() as u64 {
            script.trigger(1, UserId(id), gross, "purchase");
        }

        let mut a = RewardEngine::new(EngineConfig::contract()).unwrap();
        let mut b = RewardEngine::new(EngineConfig::contract()).unwrap();
        let ra = a.run_to_completion(&mut script.clone(), 10);
        let rb = b.run_to_completion(&mut script.clone(), 10);

        prop_assert_eq!(ra, rb);
        prop_assert_eq!(a.ledger().events(), b.ledger().events());
        prop_assert_eq!(a.rewards(), b.rewards());
    }
}
