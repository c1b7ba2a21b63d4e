//! Shared builders for integration tests.

use cascade_core::graph::ReferralGraph;
use cascade_core::growth::ScriptedDriver;
use cascade_core::types::UserId;
use cascade_engine::{EngineConfig, RewardEngine};

/// A straight referral line of `n` users: 1 <- 2 <- ... <- n.
pub fn line_graph(n: usize) -> ReferralGraph {
    let mut g = ReferralGraph::new();
    let mut prev = None;
    for t in 0..n {
        prev = Some(g.add_user(prev, t as u64).unwrap());
    }
    g
}

/// A forest built from parent selectors.
///
/// User `i + 1` is a root when `parents[i]` is `None`, otherwise it is
/// referred by user `p % i + 1`, one of those already created.
pub fn forest(parents: &[Option<usize>]) -> ReferralGraph {
    let mut g = ReferralGraph::new();
    for (i, parent) in parents.iter().enumerate() {
        let referrer = match parent {
            Some(p) if i > 0 => Some(UserId((p % i) as u64 + 1)),
            _ => None,
        };
        g.add_user(referrer, 0).unwrap();
    }
    g
}

/// Engine whose graph is a line of `n` users.
pub fn engine_with_line(config: EngineConfig, n: usize) -> RewardEngine {
    RewardEngine::with_graph(config, line_graph(n)).unwrap()
}

/// Script that builds a line of `n` users on tick 0 and has the deepest
/// user purchase `gross` on tick 1.
pub fn line_script(n: usize, gross: i64) -> ScriptedDriver {
    let mut d = ScriptedDriver::new();
    let mut prev = None;
    for id in 1..=n as u64 {
        d.create_user(0, prev);
        prev = Some(UserId(id));
    }
    if let Some(leaf) = prev {
        d.trigger(1, leaf, gross, "purchase");
    }
    d
}

/// Install a test-writer subscriber filtered by `RUST_LOG` (default `warn`).
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
