//! Identifiers and small value types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique user identifier.
///
/// Ids are assigned sequentially from 1 by the referral graph.
/// [`UserId::ROOT`] is reserved and marks "no referrer".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct UserId(pub u64);

impl UserId {
    /// The ROOT sentinel: top of every referral tree, never a real user.
    pub const ROOT: Self = Self(0);

    /// Check if this is the ROOT sentinel.
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "ROOT")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Deterministic 32-byte reward event identifier (BLAKE3).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EventId(pub [u8; 32]);

impl EventId {
    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Free-form category tag attached to a reward trigger (e.g. "purchase").
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Category(pub String);

impl Category {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an ancestor traversal ended.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChainEnd {
    /// Reached a user with no referrer.
    Root,
    /// Stopped at the configured depth cap (ChainDepthExceeded, tolerated).
    DepthLimit,
    /// Next referrer was already visited; the graph contains a cycle.
    Cycle,
    /// Next referrer does not exist in the graph.
    Dangling,
}

impl ChainEnd {
    /// Whether the traversal stopped before reaching ROOT.
    pub fn is_truncated(&self) -> bool {
        !matches!(self, Self::Root)
    }
}
