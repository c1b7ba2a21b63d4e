//! Error types for the Cascade engine.
use thiserror::Error;

use crate::types::UserId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown user: {0}")] UnknownUser(UserId),
    #[error("unknown referrer: {0}")] UnknownReferrer(UserId),
    #[error("reserved id cannot be used here: {0}")] ReservedId(UserId),
    #[error("invalid chain: {0}")] InvalidChain(&'static str),
    #[error("referrer {referrer} created at {referrer_created} after user time {created_at}")] ReferrerNotYetCreated { referrer: UserId, referrer_created: u64, created_at: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecayError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("level table exceeded: requested {requested} recipients, table has {max}")] LevelTableExceeded { requested: usize, max: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    #[error("invalid amount: {0}")] InvalidAmount(String),
    #[error("unknown user: {0}")] UnknownUser(UserId),
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("decay: {0}")] Decay(#[from] DecayError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at most 10000 bps, got {value}")] InvalidBps { field: &'static str, value: u64 },
    #[error("decay_type is required in configurable mode")] MissingDecayType,
    #[error("{field} must be positive")] InvalidLimit { field: &'static str },
    #[error("max_recipients {requested} exceeds geometric table size {max}")] RecipientsExceedTable { requested: usize, max: usize },
    #[error("parse: {0}")] Parse(String),
    #[error("io: {0}")] Io(String),
}

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error(transparent)] Graph(#[from] GraphError),
    #[error(transparent)] Decay(#[from] DecayError),
    #[error(transparent)] Reward(#[from] RewardError),
    #[error(transparent)] Config(#[from] ConfigError),
}
