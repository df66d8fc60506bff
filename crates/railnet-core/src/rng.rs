//! Deterministic randomness for the failure model and allotments.
//!
//! Everything random in the engine draws from a [`RandomSource`], so a game
//! is reproducible from its seed. [`SimRng`] is the default source; tests
//! can inject their own.

use crate::fixed::Fixed64;

/// A source of uniformly distributed 64-bit values.
pub trait RandomSource {
    /// Generate the next `u64` in the sequence.
    fn next_u64(&mut self) -> u64;

    /// Returns `true` with the given probability (Fixed64 in [0, 1]).
    ///
    /// - probability <= 0 always returns false without drawing
    /// - probability >= 1 always returns true without drawing
    fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        // For p in (0,1) the low 32 bits of the Q32.32 representation hold
        // the fraction scaled to [0, 2^32); compare against a uniform u32.
        let upper = (self.next_u64() >> 32) as u32;
        (upper as u64) < probability.to_bits() as u64
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn below(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "below(0) has no valid result");
        // Multiply-shift keeps the result unbiased enough for game use
        // without a rejection loop.
        ((self.next_u64() as u128 * len as u128) >> 64) as usize
    }
}

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Get the internal state (for hashing).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl RandomSource for SimRng {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }

    fn chance(&mut self, probability: Fixed64) -> bool {
        (**self).chance(probability)
    }

    fn below(&mut self, len: usize) -> usize {
        (**self).below(len)
    }
}
