//! Strategy identifiers and lattice coordinates.
//!
//! Strategy identifiers are dense: the initial lattice uses `0`, and every
//! mutation mints the next unused integer. The engine relies on that density
//! to index per-strategy tables directly by identifier.

use serde::{Deserialize, Serialize};

/// Identifier of a strategy (an "idea") held by a lattice cell.
///
/// Serialized as a bare integer so snapshot grids read as plain integer
/// matrices downstream.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StrategyId(pub u64);

impl StrategyId {
    /// The strategy every cell holds before the first step.
    pub const INITIAL: Self = Self(0);

    /// Wrap a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw identifier.
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// The identifier following this one, or `None` if the id space is
    /// exhausted.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Position of this strategy in a table indexed by identifier, or
    /// `None` if it does not fit in `usize`.
    pub fn as_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl core::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StrategyId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<StrategyId> for u64 {
    fn from(id: StrategyId) -> Self {
        id.0
    }
}

/// A cell position on the lattice. `x` selects the row, `y` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Row coordinate in `[0, side)`.
    pub x: u32,
    /// Column coordinate in `[0, side)`.
    pub y: u32,
}

impl Cell {
    /// Create a cell from its coordinates.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
