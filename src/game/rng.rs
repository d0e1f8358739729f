//! Mulberry32 PRNG - counter-based, 32-bit state, reproducible across runs.
//!
//! Algorithm: state += 0x6D2B79F5, then a two-round xor-shift-multiply mix
//! of the new counter value. The whole generator is its `u32` state, so the
//! resolver can store it inside `WorldState` and rebuild it on every tick.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

const GOLDEN_STEP: u32 = 0x6D2B79F5;

/// 2^32 as f64, divides a u32 draw into [0, 1)
const U32_RANGE: f64 = 4_294_967_296.0;

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        // Every u32 (zero included) is a valid counter value
        Self { state: seed }
    }

    /// Rebuild a generator from a stored state
    pub fn from_state(state: u32) -> Self {
        Self { state }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }

    /// Generate next random u32.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_STEP);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / U32_RANGE
    }

    /// Uniform index in [0, len). Returns 0 for an empty range.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// Symmetric noise in [-amplitude, amplitude)
    pub fn next_signed(&mut self, amplitude: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * amplitude
    }
}
