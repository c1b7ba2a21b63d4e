//! Engine configuration.
//!
//! Provides [`EngineConfig`] with named presets and JSON loading. Every
//! constructor path ends in [`EngineConfig::validate`], so a config held by
//! a calculator is always consistent.

use std::path::Path;

use cascade_core::constants::{
    BPS_PRECISION, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_MAX_RECIPIENTS,
    DEFAULT_ORIGINAL_USER_SHARE_BPS, GEOMETRIC_LEVELS, UNIT,
};
use cascade_core::error::ConfigError;
use cascade_decay::{DecayPolicy, DecayType};
use serde::{Deserialize, Serialize};

/// Which splitting algorithm distributes the post-share remainder.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecayMode {
    /// Contract-matching 0.6 weight table; recipient amounts sum exactly.
    FixedGeometric,
    /// Runtime-selected [`DecayPolicy`]; may leave dust.
    Configurable,
}

/// Configuration for a [`ChainRewardCalculator`](crate::ChainRewardCalculator).
///
/// Amounts (`min_reward`, and `decay_factor_bps` under FIXED) are in base units.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub decay_mode: DecayMode,
    /// Required when `decay_mode` is `configurable`; ignored otherwise.
    #[serde(default)]
    pub decay_type: Option<DecayType>,
    /// Decay factor in bps, or the flat per-level amount for FIXED.
    pub decay_factor_bps: u64,
    pub min_reward: u64,
    /// Share of the gross amount kept by the triggering user, in bps.
    pub original_user_share_bps: u64,
    /// Maximum chain members walked, counting the triggering user.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
    /// Maximum ancestors credited per event.
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,
}

fn default_max_chain_depth() -> usize {
    DEFAULT_MAX_CHAIN_DEPTH
}

fn default_max_recipients() -> usize {
    DEFAULT_MAX_RECIPIENTS
}

/// The validated splitting strategy derived from a config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Geometric,
    Decay(DecayPolicy),
}

impl EngineConfig {
    /// Contract-faithful defaults: geometric split, 80% original share.
    pub fn contract() -> Self {
        Self {
            decay_mode: DecayMode::FixedGeometric,
            decay_type: None,
            decay_factor_bps: 0,
            min_reward: 0,
            original_user_share_bps: DEFAULT_ORIGINAL_USER_SHARE_BPS,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            max_recipients: DEFAULT_MAX_RECIPIENTS,
        }
    }

    fn exponential(factor_bps: u64, min_reward: u64, share_bps: u64) -> Self {
        Self {
            decay_mode: DecayMode::Configurable,
            decay_type: Some(DecayType::Exponential),
            decay_factor_bps: factor_bps,
            min_reward,
            original_user_share_bps: share_bps,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            max_recipients: DEFAULT_MAX_RECIPIENTS,
        }
    }

    /// Low engagement: 80% decay factor, 0.01 floor, 85% original share.
    pub fn conservative() -> Self {
        Self::exponential(8_000, UNIT / 100, 8_500)
    }

    /// Balanced: 70% decay factor, 0.05 floor, 80% original share.
    pub fn moderate() -> Self {
        Self::exponential(7_000, UNIT / 20, 8_000)
    }

    /// Viral growth: 60% decay factor, 0.10 floor, 75% original share.
    pub fn aggressive() -> Self {
        Self::exponential(6_000, UNIT / 10, 7_500)
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "contract" => Some(Self::contract()),
            "conservative" => Some(Self::conservative()),
            "moderate" => Some(Self::moderate()),
            "aggressive" => Some(Self::aggressive()),
            _ => None,
        }
    }

    /// Check bounds and mode consistency.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidBps`] for a share or decay factor above 10000 bps
    ///   (FIXED reads the factor as an amount and is exempt)
    /// - [`ConfigError::MissingDecayType`] in configurable mode without a type
    /// - [`ConfigError::InvalidLimit`] for a zero depth or recipient cap
    /// - [`ConfigError::RecipientsExceedTable`] for more than 10 recipients in geometric mode
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.original_user_share_bps > BPS_PRECISION {
            return Err(ConfigError::InvalidBps {
                field: "original_user_share_bps",
                value: self.original_user_share_bps,
            });
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::InvalidLimit { field: "max_chain_depth" });
        }
        if self.max_recipients == 0 {
            return Err(ConfigError::InvalidLimit { field: "max_recipients" });
        }

        match self.decay_mode {
            DecayMode::FixedGeometric => {
                if self.max_recipients > GEOMETRIC_LEVELS {
                    return Err(ConfigError::RecipientsExceedTable {
                        requested: self.max_recipients,
                        max: GEOMETRIC_LEVELS,
                    });
                }
            }
            DecayMode::Configurable => {
                let decay_type = self.decay_type.ok_or(ConfigError::MissingDecayType)?;
                if decay_type != DecayType::Fixed && self.decay_factor_bps > BPS_PRECISION {
                    return Err(ConfigError::InvalidBps {
                        field: "decay_factor_bps",
                        value: self.decay_factor_bps,
                    });
                }
            }
        }
        Ok(())
    }

    /// The decay policy for configurable mode, `None` for geometric mode.
    pub fn policy(&self) -> Option<DecayPolicy> {
        match self.decay_mode {
            DecayMode::FixedGeometric => None,
            DecayMode::Configurable => self
                .decay_type
                .map(|t| DecayPolicy::from_parts(t, self.decay_factor_bps, self.min_reward)),
        }
    }

    /// Validate and resolve the splitting strategy.
    pub fn strategy(&self) -> Result<Strategy, ConfigError> {
        self.validate()?;
        match self.policy() {
            Some(policy) => Ok(Strategy::Decay(policy)),
            None if self.decay_mode == DecayMode::FixedGeometric => Ok(Strategy::Geometric),
            None => Err(ConfigError::MissingDecayType),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }
}
