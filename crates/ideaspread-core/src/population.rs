//! Running per-strategy cell counts.
//!
//! The imitation threshold is the share of the grid holding a strategy.
//! Scanning all `N^2` cells for it on every micro-step would make a run cost
//! `O(tmax * N^4)`. Instead the engine keeps these counts in step with every
//! lattice write, which makes the threshold a table lookup. The counts always
//! equal what [`Lattice::count`] would return.
//!
//! [`Lattice::count`]: ideaspread_types::Lattice::count

use ideaspread_types::{Lattice, StrategyId};

/// Number of cells holding each strategy, indexed by strategy id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationCounts {
    counts: Vec<u64>,
}

impl PopulationCounts {
    /// Count every strategy on the given lattice.
    pub fn from_lattice(lattice: &Lattice) -> Self {
        let mut population = Self::default();
        for &strategy in lattice.cells() {
            population.increment(strategy);
        }
        population
    }

    /// Number of cells currently holding `strategy`.
    pub fn count(&self, strategy: StrategyId) -> u64 {
        strategy
            .as_index()
            .and_then(|index| self.counts.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Share of `total_cells` holding `strategy`, in `[0, 1]`.
    pub fn fraction(&self, strategy: StrategyId, total_cells: u64) -> f64 {
        if total_cells == 0 {
            return 0.0;
        }
        // Counts never exceed the cell count, which is far below 2^53.
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.count(strategy) as f64 / total_cells as f64;
        fraction
    }

    /// Move one cell from `from` to `to`.
    pub fn transfer(&mut self, from: StrategyId, to: StrategyId) {
        if from == to {
            return;
        }
        if let Some(slot) = from.as_index().and_then(|index| self.counts.get_mut(index)) {
            *slot = slot.saturating_sub(1);
        }
        self.increment(to);
    }

    /// Number of strategies held by at least one cell.
    pub fn present(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Sum of all counts (equals the number of cells).
    pub fn total(&self) -> u64 {
        self.counts.iter().copied().fold(0_u64, u64::saturating_add)
    }

    fn increment(&mut self, strategy: StrategyId) {
        let Some(index) = strategy.as_index() else {
            return;
        };
        if index >= self.counts.len() {
            self.counts.resize(index.saturating_add(1), 0);
        }
        if let Some(slot) = self.counts.get_mut(index) {
            *slot = slot.saturating_add(1);
        }
    }
}
