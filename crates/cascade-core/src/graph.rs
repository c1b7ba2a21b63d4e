//! Referral graph: a forest of users keyed by id.
//!
//! Each user points at the referrer that invited them. The graph enforces
//! the forest invariants on insertion (referrer exists, was created no later
//! than the new user, and ids are never reused), so a cycle can only appear
//! through the test-only [`ReferralGraph::force_referrer`] hook. Traversal
//! still guards against cycles and dangling links and never exceeds its
//! depth bound.
//!
//! All lookups go through a `HashMap`; nothing scans the user set to
//! resolve a referrer.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::DEFAULT_MAX_CHAIN_DEPTH;
use crate::error::GraphError;
use crate::types::{ChainEnd, UserId};

/// A user in the referral forest.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Who referred this user. `None` for root users.
    pub referrer: Option<UserId>,
    /// Distance from the root of this user's tree (0 for root users).
    pub depth: u32,
    pub active: bool,
    /// Simulation step at which the user joined.
    pub created_at: u64,
    /// Users this user referred, in creation order.
    pub children: Vec<UserId>,
}

impl User {
    /// Number of users directly referred by this user.
    pub fn referral_count(&self) -> usize {
        self.children.len()
    }
}

/// Ancestor-first traversal result: the triggering user followed by its
/// referrer, that referrer's referrer, and so on.
///
/// Never empty, never contains duplicates or [`UserId::ROOT`]. Deserialized
/// chains are checked with the same rules as [`ReferralChain::new`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "RawChain")]
pub struct ReferralChain {
    members: Vec<UserId>,
    end: ChainEnd,
}

#[derive(Deserialize)]
struct RawChain {
    members: Vec<UserId>,
    end: ChainEnd,
}

impl TryFrom<RawChain> for ReferralChain {
    type Error = GraphError;

    fn try_from(raw: RawChain) -> Result<Self, Self::Error> {
        Self::new(raw.members, raw.end)
    }
}

impl ReferralChain {
    /// Build a chain from an externally walked member list.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidChain`] if `members` is empty, repeats a user,
    ///   or contains [`UserId::ROOT`]
    pub fn new(members: Vec<UserId>, end: ChainEnd) -> Result<Self, GraphError> {
        if members.is_empty() {
            return Err(GraphError::InvalidChain("no members"));
        }
        if members.iter().any(UserId::is_root) {
            return Err(GraphError::InvalidChain("contains ROOT"));
        }
        let mut seen = HashSet::with_capacity(members.len());
        if !members.iter().all(|m| seen.insert(*m)) {
            return Err(GraphError::InvalidChain("duplicate member"));
        }
        Ok(Self { members, end })
    }

    /// The user whose event started the traversal.
    pub fn originator(&self) -> UserId {
        self.members[0]
    }

    /// Every member, originator first.
    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    /// Ancestors only, nearest first.
    pub fn ancestors(&self) -> &[UserId] {
        &self.members[1..]
    }

    /// Why traversal stopped.
    pub fn end(&self) -> ChainEnd {
        self.end
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether traversal stopped before reaching ROOT.
    pub fn is_truncated(&self) -> bool {
        self.end.is_truncated()
    }
}

/// Id-indexed referral forest.
///
/// Not thread-safe: wrap in a mutex when the growth driver and the reward
/// calculator run on different threads.
#[derive(Debug, Clone)]
pub struct ReferralGraph {
    users: HashMap<UserId, User>,
    next_id: u64,
    active: usize,
}

impl Default for ReferralGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferralGraph {
    /// Create an empty graph. The first user gets id 1.
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            next_id: 1,
            active: 0,
        }
    }

    /// Insert a new active user.
    ///
    /// `referrer` of `None` or `Some(UserId::ROOT)` creates a root user at
    /// depth 0; otherwise depth is the referrer's depth plus one.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownReferrer`] if `referrer` is not in the graph
    /// - [`GraphError::ReferrerNotYetCreated`] if the referrer joined after `created_at`
    pub fn add_user(
        &mut self,
        referrer: Option<UserId>,
        created_at: u64,
    ) -> Result<UserId, GraphError> {
        let referrer = referrer.filter(|r| !r.is_root());

        let depth = match referrer {
            None => 0,
            Some(referrer_id) => {
                let parent = self
                    .users
                    .get(&referrer_id)
                    .ok_or(GraphError::UnknownReferrer(referrer_id))?;
                if parent.created_at > created_at {
                    return Err(GraphError::ReferrerNotYetCreated {
                        referrer: referrer_id,
                        referrer_created: parent.created_at,
                        created_at,
                    });
                }
                parent.depth.saturating_add(1)
            }
        };

        let id = UserId(self.next_id);
        self.next_id += 1;

        if let Some(referrer_id) = referrer {
            if let Some(parent) = self.users.get_mut(&referrer_id) {
                parent.children.push(id);
            }
        }

        self.users.insert(
            id,
            User {
                id,
                referrer,
                depth,
                active: true,
                created_at,
                children: Vec::new(),
            },
        );
        self.active += 1;

        debug!(user = %id, referrer = ?referrer, depth, "graph: user added");
        Ok(id)
    }

    /// Mark a user inactive (churned). Deactivating twice is a no-op.
    ///
    /// Churned users stay in the graph and keep their place in every chain.
    pub fn deactivate(&mut self, user_id: UserId) -> Result<(), GraphError> {
        if user_id.is_root() {
            return Err(GraphError::ReservedId(user_id));
        }
        let user = self
            .users
            .get_mut(&user_id)
            .ok_or(GraphError::UnknownUser(user_id))?;
        if user.active {
            user.active = false;
            self.active -= 1;
            debug!(user = %user_id, "graph: user deactivated");
        }
        Ok(())
    }

    /// Whether `user_id` exists and is active.
    pub fn is_active(&self, user_id: UserId) -> bool {
        self.users.get(&user_id).is_some_and(|u| u.active)
    }

    pub fn get(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.contains_key(&user_id)
    }

    /// Direct referrals of `user_id`, in creation order.
    pub fn children(&self, user_id: UserId) -> Result<&[UserId], GraphError> {
        self.users
            .get(&user_id)
            .map(|u| u.children.as_slice())
            .ok_or(GraphError::UnknownUser(user_id))
    }

    /// Number of direct referrals made by `user_id`.
    pub fn referral_count(&self, user_id: UserId) -> Result<usize, GraphError> {
        self.children(user_id).map(<[UserId]>::len)
    }

    /// Referral depth of `user_id` (0 for root users).
    pub fn depth(&self, user_id: UserId) -> Result<u32, GraphError> {
        self.users
            .get(&user_id)
            .map(|u| u.depth)
            .ok_or(GraphError::UnknownUser(user_id))
    }

    /// Total number of users, active or not.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Total direct referrals across all users (one per non-root user).
    pub fn total_referrals(&self) -> usize {
        self.users.values().map(User::referral_count).sum()
    }

    /// All users in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by_key(|u| u.id);
        users.into_iter()
    }

    /// Ancestor chain using [`DEFAULT_MAX_CHAIN_DEPTH`].
    pub fn ancestor_chain(&self, user_id: UserId) -> Result<ReferralChain, GraphError> {
        self.ancestor_chain_bounded(user_id, DEFAULT_MAX_CHAIN_DEPTH)
    }

    /// Walk from `user_id` towards ROOT, collecting at most `max_depth`
    /// members (the triggering user counts as one).
    ///
    /// Traversal never fails once the starting user is found: hitting the
    /// depth cap, a revisited id, or a missing referrer ends the walk and
    /// the partial chain is returned with the matching [`ChainEnd`].
    pub fn ancestor_chain_bounded(
        &self,
        user_id: UserId,
        max_depth: usize,
    ) -> Result<ReferralChain, GraphError> {
        if user_id.is_root() {
            return Err(GraphError::ReservedId(user_id));
        }
        let max_depth = max_depth.max(1);
        let mut current = self
            .users
            .get(&user_id)
            .ok_or(GraphError::UnknownUser(user_id))?;

        let mut members = Vec::with_capacity(max_depth.min(current.depth as usize + 1));
        let mut seen = HashSet::new();
        members.push(user_id);
        seen.insert(user_id);

        let end = loop {
            let Some(next) = current.referrer else {
                break ChainEnd::Root;
            };
            if next.is_root() {
                break ChainEnd::Root;
            }
            if members.len() >= max_depth {
                break ChainEnd::DepthLimit;
            }
            if !seen.insert(next) {
                break ChainEnd::Cycle;
            }
            let Some(parent) = self.users.get(&next) else {
                break ChainEnd::Dangling;
            };
            members.push(next);
            current = parent;
        };

        if end.is_truncated() {
            debug!(user = %user_id, len = members.len(), ?end, "graph: chain truncated");
        }

        Ok(ReferralChain { members, end })
    }

    /// Rewire `user_id` to point at `referrer` without any validation.
    ///
    /// Exists only to build corrupt graphs (cycles, dangling links) for
    /// traversal-safety tests. Depths and child lists are not updated.
    #[cfg(any(test, feature = "testing"))]
    pub fn force_referrer(&mut self, user_id: UserId, referrer: Option<UserId>) {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.referrer = referrer;
        }
    }
}
