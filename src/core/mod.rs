//! Core deterministic primitives.
//!
//! Randomness and hashing used by the rules engine. Nothing in here reads
//! the clock or the environment.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{Chance, DeterministicRng, RandomSource, ScriptedRng};
pub use hash::{StateHash, StateHasher, compute_state_hash};
