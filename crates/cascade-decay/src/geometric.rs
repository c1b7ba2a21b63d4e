//! Fixed 0.6-ratio geometric split.
//!
//! Recipient `i` of `n` receives `floor(amount * w[i] / W[n])` where `w` is
//! [`GEOMETRIC_WEIGHTS`] and `W` its prefix sums. The floors lose at most
//! `n - 1` base units in total; that shortfall goes to recipient 0 (the
//! nearest referrer), so the parts always add back up to `amount`.

use cascade_core::constants::{GEOMETRIC_CUMULATIVE, GEOMETRIC_LEVELS, GEOMETRIC_WEIGHTS};
use cascade_core::error::DecayError;
use tracing::trace;

/// Weights (bps) for the first `recipients` levels.
pub fn geometric_weights(recipients: usize) -> Result<&'static [u64], DecayError> {
    if recipients > GEOMETRIC_LEVELS {
        return Err(DecayError::LevelTableExceeded {
            requested: recipients,
            max: GEOMETRIC_LEVELS,
        });
    }
    Ok(&GEOMETRIC_WEIGHTS[..recipients])
}

/// Split `amount` across `recipients` levels using the geometric table.
///
/// Returns one amount per recipient, nearest first. The result sums to
/// exactly `amount` whenever `recipients > 0`; with zero recipients the
/// result is empty.
///
/// # Errors
///
/// - [`DecayError::LevelTableExceeded`] if `recipients > 10`
pub fn geometric_split(amount: u64, recipients: usize) -> Result<Vec<u64>, DecayError> {
    let weights = geometric_weights(recipients)?;
    if recipients == 0 {
        return Ok(Vec::new());
    }

    let total_weight = GEOMETRIC_CUMULATIVE[recipients] as u128;
    let mut parts: Vec<u64> = weights
        .iter()
        // weight <= total_weight, so each quotient is <= amount and fits u64.
        .map(|&w| (amount as u128 * w as u128 / total_weight) as u64)
        .collect();

    let assigned: u64 = parts.iter().sum();
    let shortfall = amount - assigned;
    parts[0] += shortfall;
    if shortfall > 0 {
        trace!(amount, recipients, shortfall, "geometric: rounding shortfall to nearest referrer");
    }

    Ok(parts)
}
