//! Random draw sources for the micro-step rule.
//!
//! Each micro-step consumes draws in a fixed order: two coordinates for the
//! source cell, two offsets for the neighbour, one unit draw for imitation,
//! one unit draw for mutation, and two more coordinates when a mutation
//! fires. The [`DrawSource`] trait abstracts where those numbers come from.
//!
//! [`SeededDraws`] is the production source: one seedable generator per run,
//! so a `(config, seed)` pair always replays the same trajectory.
//! [`ScriptedDraws`] replays hand-written sequences so that individual steps
//! can be traced exactly in tests.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of the random numbers consumed by the micro-step rule.
pub trait DrawSource {
    /// A coordinate uniformly distributed over `[0, side)`.
    fn coordinate(&mut self, side: u32) -> u32;

    /// A neighbour offset drawn uniformly from `{-1, 0, +1}`.
    fn offset(&mut self) -> i32;

    /// A real number uniformly distributed over `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// Seeded pseudo-random draw source.
#[derive(Debug, Clone)]
pub struct SeededDraws {
    rng: SmallRng,
}

impl SeededDraws {
    /// Create a source whose sequence is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl DrawSource for SeededDraws {
    fn coordinate(&mut self, side: u32) -> u32 {
        if side == 0 {
            return 0;
        }
        self.rng.random_range(0..side)
    }

    fn offset(&mut self) -> i32 {
        self.rng.random_range(-1..=1)
    }

    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Draw source that replays fixed sequences.
///
/// Each draw kind has its own queue. An exhausted queue yields coordinate
/// `0`, offset `0`, and unit `1.0`; the last one never passes a `< p` test,
/// so running past the script disables imitation and mutation.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    coordinates: VecDeque<u32>,
    offsets: VecDeque<i32>,
    units: VecDeque<f64>,
}

impl ScriptedDraws {
    /// Create a scripted source from the three draw sequences.
    pub fn new(
        coordinates: impl IntoIterator<Item = u32>,
        offsets: impl IntoIterator<Item = i32>,
        units: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            coordinates: coordinates.into_iter().collect(),
            offsets: offsets.into_iter().collect(),
            units: units.into_iter().collect(),
        }
    }

    /// Whether every scripted draw has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.coordinates.is_empty() && self.offsets.is_empty() && self.units.is_empty()
    }
}

impl DrawSource for ScriptedDraws {
    fn coordinate(&mut self, side: u32) -> u32 {
        let raw = self.coordinates.pop_front().unwrap_or(0);
        raw.checked_rem(side).unwrap_or(0)
    }

    fn offset(&mut self) -> i32 {
        self.offsets.pop_front().unwrap_or(0).clamp(-1, 1)
    }

    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(1.0)
    }
}
