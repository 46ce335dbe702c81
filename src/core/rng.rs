//! Deterministic Random Number Generator
//!
//! Every random decision in the rules (spread roll, spread color, cure roll,
//! starting intensities) goes through the [`RandomSource`] trait so that the
//! engine can be driven by a seeded Xorshift128+ generator in play and by a
//! scripted source in tests.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Resolution of a [`Chance`]: 10_000 basis points = 100%.
pub const CHANCE_SCALE: u32 = 10_000;

/// A probability expressed in basis points.
///
/// Integer-only so that a seeded run replays bit-for-bit on every platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Chance(u32);

impl Chance {
    /// Never succeeds.
    pub const NEVER: Chance = Chance(0);

    /// Always succeeds.
    pub const ALWAYS: Chance = Chance(CHANCE_SCALE);

    /// Create from basis points, clamped to [0, 10_000].
    pub const fn from_basis_points(bp: u32) -> Self {
        if bp > CHANCE_SCALE {
            Chance(CHANCE_SCALE)
        } else {
            Chance(bp)
        }
    }

    /// Create from a whole percentage, clamped to [0, 100].
    pub const fn percent(pct: u32) -> Self {
        Self::from_basis_points(pct.saturating_mul(100))
    }

    /// Basis points (0..=10_000).
    pub const fn basis_points(self) -> u32 {
        self.0
    }
}

/// Source of randomness for the rules engine.
pub trait RandomSource {
    /// Returns true with the given probability.
    fn roll(&mut self, chance: Chance) -> bool;

    /// Uniform index in [0, len). Returns 0 when `len` is 0.
    fn pick(&mut self, len: usize) -> usize;
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use pandemic_seal::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG seeded from a session id and its start time.
    pub fn for_session(session_id: &[u8; 16], start_timestamp: i64) -> Self {
        Self::new(derive_session_seed(session_id, start_timestamp))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }
}

impl RandomSource for DeterministicRng {
    #[inline]
    fn roll(&mut self, chance: Chance) -> bool {
        self.next_int(CHANCE_SCALE) < chance.basis_points()
    }

    #[inline]
    fn pick(&mut self, len: usize) -> usize {
        let max = u32::try_from(len).unwrap_or(u32::MAX);
        self.next_int(max) as usize
    }
}

/// Scripted random source for reproducing exact scenarios.
///
/// Every roll returns `succeed`, every pick returns `index` (clamped to the
/// range asked for).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptedRng {
    /// Outcome of every probability gate.
    pub succeed: bool,
    /// Index returned by every pick.
    pub index: usize,
}

impl ScriptedRng {
    /// Gate always passes, always picks `index`.
    pub const fn always(index: usize) -> Self {
        Self { succeed: true, index }
    }

    /// Gate never passes.
    pub const fn never() -> Self {
        Self { succeed: false, index: 0 }
    }
}

impl RandomSource for ScriptedRng {
    fn roll(&mut self, _chance: Chance) -> bool {
        self.succeed
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.index.min(len - 1)
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a session seed from the session id and start timestamp.
pub fn derive_session_seed(session_id: &[u8; 16], start_timestamp: i64) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"PANDEMIC_SEAL_SEED_V1");
    hasher.update(session_id);
    hasher.update(start_timestamp.to_le_bytes());

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        // Very unlikely to match
        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_next_int() {
        let mut rng = DeterministicRng::new(1234);

        for _ in 0..1000 {
            assert!(rng.next_int(100) < 100);
        }

        assert_eq!(rng.next_int(0), 0);
        assert_eq!(rng.next_int(1), 0);
    }

    #[test]
    fn test_roll_extremes() {
        let mut rng = DeterministicRng::new(99);
        for _ in 0..500 {
            assert!(rng.roll(Chance::ALWAYS));
            assert!(!rng.roll(Chance::NEVER));
        }
    }

    #[test]
    fn test_roll_rate_is_close_to_chance() {
        let mut rng = DeterministicRng::new(2024);
        let hits = (0..10_000).filter(|_| rng.roll(Chance::percent(30))).count();
        // 30% of 10k with generous tolerance
        assert!((2_700..=3_300).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn test_pick_in_range() {
        let mut rng = DeterministicRng::new(7);
        for _ in 0..1000 {
            assert!(rng.pick(4) < 4);
        }
        assert_eq!(rng.pick(0), 0);
    }

    #[test]
    fn test_chance_clamps() {
        assert_eq!(Chance::percent(250), Chance::ALWAYS);
        assert_eq!(Chance::from_basis_points(20_000).basis_points(), CHANCE_SCALE);
        assert_eq!(Chance::percent(30).basis_points(), 3_000);
    }

    #[test]
    fn test_scripted_rng() {
        let mut rng = ScriptedRng::always(2);
        assert!(rng.roll(Chance::NEVER));
        assert_eq!(rng.pick(4), 2);
        assert_eq!(rng.pick(2), 1);

        let mut never = ScriptedRng::never();
        assert!(!never.roll(Chance::ALWAYS));
    }

    #[test]
    fn test_derive_session_seed() {
        let id = [1u8; 16];
        assert_eq!(derive_session_seed(&id, 100), derive_session_seed(&id, 100));
        assert_ne!(derive_session_seed(&id, 100), derive_session_seed(&id, 101));
        assert_ne!(derive_session_seed(&id, 100), derive_session_seed(&[2u8; 16], 100));
    }
}
