//! Injectable random sources.
//!
//! The crit roll and the speed tie-break are the only random draws in a
//! battle. Both go through [`RandomSource`] so a battle can be replayed from
//! a seed or scripted outright.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform draws in `[0, 1)`.
///
/// Implementations must be `Send` so an engine holding one can be handed
/// to another thread.
pub trait RandomSource: Send {
    /// Next draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// `true` with the given percent probability (clamped to 0..=100).
    ///
    /// Always consumes exactly one draw.
    fn chance(&mut self, percent: u32) -> bool {
        let percent = percent.min(100);
        self.next_f64() < f64::from(percent) / 100.0
    }
}

/// Non-reproducible draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible draws from a seeded `StdRng`.
///
/// # Examples
///
/// ```rust
/// use duelcore::random::{RandomSource, SeededRandom};
///
/// let mut a = SeededRandom::new(7);
/// let mut b = SeededRandom::new(7);
/// assert_eq!(a.next_f64(), b.next_f64());
/// ```
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Generator seeded from `seed`; equal seeds give equal draws.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// An empty list always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Replay `draws` in order.
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
        }
    }

    /// Every draw is `value`.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Draws that never land a crit below 100%.
    pub fn never() -> Self {
        Self::constant(0.999_999)
    }

    /// Draws that land any non-zero chance.
    pub fn always() -> Self {
        Self::constant(0.0)
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}
