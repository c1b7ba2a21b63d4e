//! Integration test suite for Cascade.
//!
//! Exercises the graph, decay, and engine crates together: exact-sum and
//! cap properties over random referral forests, traversal safety on
//! corrupted graphs, and full scripted runs.

pub mod helpers;
