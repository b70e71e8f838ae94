//! Per-cell strategy histories (the anti-cycling rule).
//!
//! Every cell remembers each strategy it has ever held. A cell may only
//! imitate a strategy that is absent from its history, so once a cell has
//! moved on from an idea it never goes back to it.
//!
//! # Representation
//!
//! Strategy identifiers grow without bound over a run (one per mutation), so
//! a bitset over the id space would grow with run length for every cell.
//! Histories are instead kept as one [`BTreeSet`] per cell: a typical cell
//! holds only a handful of strategies, membership tests are logarithmic in
//! that handful, and iteration order is deterministic.

use std::collections::BTreeSet;

use ideaspread_types::StrategyId;

/// Strategy histories for every cell of a lattice, indexed like the lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyHistory {
    sets: Vec<BTreeSet<StrategyId>>,
}

impl StrategyHistory {
    /// Histories for `cell_count` cells, each seeded with `initial`.
    pub fn new(cell_count: usize, initial: StrategyId) -> Self {
        Self {
            sets: vec![BTreeSet::from([initial]); cell_count],
        }
    }

    /// Whether the cell at `index` has ever held `strategy`.
    ///
    /// Out-of-range indices hold nothing.
    pub fn contains(&self, index: usize, strategy: StrategyId) -> bool {
        self.sets
            .get(index)
            .is_some_and(|set| set.contains(&strategy))
    }

    /// Record that the cell at `index` now holds `strategy`.
    ///
    /// Returns `true` if the strategy was new to that cell.
    pub fn record(&mut self, index: usize, strategy: StrategyId) -> bool {
        self.sets
            .get_mut(index)
            .is_some_and(|set| set.insert(strategy))
    }

    /// The history of the cell at `index`.
    pub fn of(&self, index: usize) -> Option<&BTreeSet<StrategyId>> {
        self.sets.get(index)
    }

    /// Number of strategies the cell at `index` has held.
    pub fn len_of(&self, index: usize) -> usize {
        self.sets.get(index).map_or(0, BTreeSet::len)
    }

    /// Number of cells tracked.
    pub fn cell_count(&self) -> usize {
        self.sets.len()
    }

    /// Sum of all history sizes.
    pub fn total_entries(&self) -> usize {
        self.sets.iter().map(BTreeSet::len).sum()
    }

    /// Iterate over all cell histories in index order.
    pub fn iter(&self) -> impl Iterator<Item = &BTreeSet<StrategyId>> {
        self.sets.iter()
    }
}
