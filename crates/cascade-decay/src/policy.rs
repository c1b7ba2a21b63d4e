//! Decay policies: reward magnitude for one chain level.
//!
//! `level` is 0-based: level 0 is the triggering user's immediate referrer.
//! Every quotient is floored, never rounded.

use cascade_core::constants::BPS_PRECISION;
use cascade_core::error::DecayError;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Decay type tag as it appears in configuration.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecayType {
    Linear,
    Exponential,
    Fixed,
}

/// A decay policy with its parameters. Amounts are in base units.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecayPolicy {
    /// `remaining - remaining * factor_bps * level / 10_000`, floored at `min_reward`.
    Linear { factor_bps: u64, min_reward: u64 },
    /// `remaining * (factor_bps / 10_000)^(level + 1)`, one floor per step,
    /// clamped to `min_reward` as soon as a step drops below it.
    Exponential { factor_bps: u64, min_reward: u64 },
    /// A flat amount per level, never below `min_reward`.
    Fixed { flat_amount: u64, min_reward: u64 },
}

impl DecayPolicy {
    /// Build a policy from its configuration tag. For [`DecayType::Fixed`]
    /// the factor is read as a flat amount in base units.
    pub fn from_parts(decay_type: DecayType, factor: u64, min_reward: u64) -> Self {
        match decay_type {
            DecayType::Linear => Self::Linear { factor_bps: factor, min_reward },
            DecayType::Exponential => Self::Exponential { factor_bps: factor, min_reward },
            DecayType::Fixed => Self::Fixed { flat_amount: factor, min_reward },
        }
    }

    pub fn decay_type(&self) -> DecayType {
        match self {
            Self::Linear { .. } => DecayType::Linear,
            Self::Exponential { .. } => DecayType::Exponential,
            Self::Fixed { .. } => DecayType::Fixed,
        }
    }

    pub fn min_reward(&self) -> u64 {
        match *self {
            Self::Linear { min_reward, .. }
            | Self::Exponential { min_reward, .. }
            | Self::Fixed { min_reward, .. } => min_reward,
        }
    }

    /// Reward for chain level `level` given the amount still undistributed.
    ///
    /// The result is never below `min_reward` and may exceed `remaining`;
    /// callers cap the credit at what is actually left.
    pub fn level_reward(&self, remaining: u64, level: u32) -> Result<u64, DecayError> {
        match *self {
            Self::Linear { factor_bps, min_reward } => {
                linear(remaining, level, factor_bps, min_reward)
            }
            Self::Exponential { factor_bps, min_reward } => {
                exponential(remaining, level, factor_bps, min_reward)
            }
            Self::Fixed { flat_amount, min_reward } => Ok(flat_amount.max(min_reward)),
        }
    }
}

/// Free-function form of [`DecayPolicy::level_reward`].
pub fn level_reward(remaining: u64, level: u32, policy: &DecayPolicy) -> Result<u64, DecayError> {
    policy.level_reward(remaining, level)
}

fn linear(remaining: u64, level: u32, factor_bps: u64, min_reward: u64) -> Result<u64, DecayError> {
    // decay = remaining * factor_bps * level / BPS_PRECISION
    let decay = (remaining as u128)
        .checked_mul(factor_bps as u128)
        .and_then(|v| v.checked_mul(level as u128))
        .ok_or(DecayError::ArithmeticOverflow)?
        / BPS_PRECISION as u128;

    if decay >= remaining as u128 {
        return Ok(min_reward);
    }
    // decay < remaining, so it fits in u64.
    Ok((remaining - decay as u64).max(min_reward))
}

fn exponential(remaining: u64, level: u32, factor_bps: u64, min_reward: u64) -> Result<u64, DecayError> {
    if factor_bps == BPS_PRECISION {
        // Multiplying by 1.0 leaves the amount unchanged at every step.
        return Ok(remaining.max(min_reward));
    }

    let mut reward = remaining;
    for _ in 0..=level {
        let next = (reward as u128)
            .checked_mul(factor_bps as u128)
            .ok_or(DecayError::ArithmeticOverflow)?
            / BPS_PRECISION as u128;
        reward = u64::try_from(next).map_err(|_| DecayError::ArithmeticOverflow)?;
        if reward < min_reward {
            trace!(remaining, level, min_reward, "decay: clamped to min reward");
            return Ok(min_reward);
        }
        if reward == 0 {
            // Zero is a fixed point; further steps cannot change it.
            break;
        }
    }
    Ok(reward)
}
