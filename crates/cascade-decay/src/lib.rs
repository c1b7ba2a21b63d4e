//! # cascade-decay
//! Per-level reward magnitudes.
//!
//! All calculations use integer arithmetic only, with `u128` intermediates
//! and floor division, so results match basis-point contract math exactly.
//!
//! Two families live here:
//! - **Decay policies** ([`DecayPolicy`]): LINEAR, EXPONENTIAL, and FIXED
//!   per-level rewards with a minimum floor, used by the configurable path.
//! - **Geometric split** ([`geometric_split`]): the contract's fixed
//!   0.6-ratio weight table, which divides an amount across up to ten
//!   recipients and hands the rounding shortfall to the nearest one so the
//!   parts always sum to the whole.

pub mod geometric;
pub mod policy;

pub use geometric::{geometric_split, geometric_weights};
pub use policy::{level_reward, DecayPolicy, DecayType};
