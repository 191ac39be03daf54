//! Deterministic randomness for replaying cascade decisions.
//!
//! The cascade takes any `rand::Rng`. In production that is a seeded
//! `StdRng`; [`ScriptedDraws`] instead replays a fixed list of unit draws so
//! a scenario can force individual gates to pass or fail.

use rand::{Error, RngCore};
use std::collections::VecDeque;

/// Replays unit-interval draws in order, then repeats a fallback value
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    queue: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedDraws {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            queue: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Every draw returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new([], value)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    // `Standard` builds an f64 from the top 53 bits of a u64
    fn encode(value: f64) -> u64 {
        let clamped = value.clamp(0.0, 1.0 - f64::EPSILON);
        ((clamped * (1u64 << 53) as f64) as u64) << 11
    }
}

impl RngCore for ScriptedDraws {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.queue.pop_front().unwrap_or(self.fallback);
        Self::encode(value)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
