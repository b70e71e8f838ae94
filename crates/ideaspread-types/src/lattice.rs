//! The toroidal strategy grid.
//!
//! A [`Lattice`] stores `side * side` strategy identifiers in one flat
//! row-major vector. Cell `(x, y)` lives at index `x * side + y`. All
//! coordinate arithmetic wraps around both edges, so every cell has exactly
//! eight neighbours (nine including itself).
//!
//! Lattices are plain values: cloning one produces an independent copy, which
//! is how snapshots freeze the grid while the engine keeps mutating it.
//!
//! On the wire a lattice is an `N x N` integer matrix: a list of `N` rows of
//! `N` strategy identifiers each.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize, Serializer};

use crate::ids::{Cell, StrategyId};

/// Raised when lattice data does not form a square grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lattice with side {side} cannot hold {cells} cells")]
pub struct LatticeShapeError {
    /// Declared side length (the number of rows for matrix input).
    pub side: u32,
    /// Number of cells actually present.
    pub cells: usize,
}

/// Square grid of strategy identifiers with toroidal boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Vec<StrategyId>>")]
pub struct Lattice {
    /// Side length (the `N` of an `N x N` grid).
    side: u32,
    /// Row-major cell values.
    cells: Vec<StrategyId>,
}

impl Serialize for Lattice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

impl TryFrom<Vec<Vec<StrategyId>>> for Lattice {
    type Error = LatticeShapeError;

    /// Build a lattice from a matrix of rows. Every row must be as long as
    /// there are rows.
    fn try_from(rows: Vec<Vec<StrategyId>>) -> Result<Self, Self::Error> {
        let cells = rows.iter().map(Vec::len).fold(0_usize, usize::saturating_add);
        let square = rows.iter().all(|row| row.len() == rows.len());
        let side = u32::try_from(rows.len()).ok().filter(|_| square);
        let Some(side) = side else {
            return Err(LatticeShapeError {
                side: u32::try_from(rows.len()).unwrap_or(u32::MAX),
                cells,
            });
        };
        Self::from_cells(side, rows.into_iter().flatten().collect())
    }
}

impl Lattice {
    /// Create a `side x side` lattice with every cell holding
    /// [`StrategyId::INITIAL`].
    pub fn new(side: u32) -> Self {
        let count = usize::try_from(u64::from(side).saturating_mul(u64::from(side)))
            .unwrap_or(usize::MAX);
        Self {
            side,
            cells: vec![StrategyId::INITIAL; count],
        }
    }

    /// Build a lattice from row-major cell values.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeShapeError`] if `cells.len()` is not `side * side`.
    pub fn from_cells(side: u32, cells: Vec<StrategyId>) -> Result<Self, LatticeShapeError> {
        let expected = u64::from(side).checked_mul(u64::from(side));
        let actual = u64::try_from(cells.len()).ok();
        if expected.is_none() || expected != actual {
            return Err(LatticeShapeError {
                side,
                cells: cells.len(),
            });
        }
        Ok(Self { side, cells })
    }

    /// Side length of the grid.
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Total number of cells (`side * side`).
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[StrategyId] {
        &self.cells
    }

    /// Iterate over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &[StrategyId]> {
        // chunks() rejects a zero chunk size; an empty grid has no rows anyway.
        self.cells.chunks(self.side.max(1) as usize)
    }

    /// Flat index of a cell, or `None` if it lies outside the grid.
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if cell.x >= self.side || cell.y >= self.side {
            return None;
        }
        let side = self.side as usize;
        (cell.x as usize)
            .checked_mul(side)
            .and_then(|row| row.checked_add(cell.y as usize))
    }

    /// Cell coordinates of a flat index, or `None` if it is out of range.
    pub fn cell_at(&self, index: usize) -> Option<Cell> {
        if index >= self.cells.len() {
            return None;
        }
        let side = self.side as usize;
        let x = u32::try_from(index.checked_div(side)?).ok()?;
        let y = u32::try_from(index.checked_rem(side)?).ok()?;
        Some(Cell::new(x, y))
    }

    /// Strategy held by a cell.
    pub fn get(&self, cell: Cell) -> Option<StrategyId> {
        self.index_of(cell).and_then(|i| self.get_index(i))
    }

    /// Strategy held by the cell at a flat index.
    pub fn get_index(&self, index: usize) -> Option<StrategyId> {
        self.cells.get(index).copied()
    }

    /// Overwrite a cell, returning the strategy it held before.
    pub fn set(&mut self, cell: Cell, strategy: StrategyId) -> Option<StrategyId> {
        let index = self.index_of(cell)?;
        self.set_index(index, strategy)
    }

    /// Overwrite the cell at a flat index, returning its previous strategy.
    pub fn set_index(&mut self, index: usize, strategy: StrategyId) -> Option<StrategyId> {
        let slot = self.cells.get_mut(index)?;
        Some(core::mem::replace(slot, strategy))
    }

    /// The cell reached from `cell` by moving `dx` rows and `dy` columns,
    /// wrapping around the torus.
    pub fn offset(&self, cell: Cell, dx: i32, dy: i32) -> Cell {
        Cell::new(
            wrap_coordinate(cell.x, dx, self.side),
            wrap_coordinate(cell.y, dy, self.side),
        )
    }

    /// The eight toroidal neighbours of a cell (Moore neighbourhood,
    /// excluding the cell itself). On grids smaller than 3x3 some
    /// neighbours coincide.
    pub fn moore_neighbors(&self, cell: Cell) -> [Cell; 8] {
        [
            self.offset(cell, -1, -1),
            self.offset(cell, -1, 0),
            self.offset(cell, -1, 1),
            self.offset(cell, 0, -1),
            self.offset(cell, 0, 1),
            self.offset(cell, 1, -1),
            self.offset(cell, 1, 0),
            self.offset(cell, 1, 1),
        ]
    }

    /// Number of cells currently holding `strategy` (full scan).
    pub fn count(&self, strategy: StrategyId) -> usize {
        self.cells.iter().filter(|&&s| s == strategy).count()
    }

    /// The set of distinct strategies present on the grid.
    pub fn distinct(&self) -> BTreeSet<StrategyId> {
        self.cells.iter().copied().collect()
    }

    /// Largest strategy identifier present, or `None` for an empty grid.
    pub fn max_strategy(&self) -> Option<StrategyId> {
        self.cells.iter().copied().max()
    }
}

/// Add a signed offset to a coordinate modulo `side`.
fn wrap_coordinate(coord: u32, delta: i32, side: u32) -> u32 {
    let shifted = i64::from(coord).saturating_add(i64::from(delta));
    shifted
        .checked_rem_euclid(i64::from(side))
        .and_then(|wrapped| u32::try_from(wrapped).ok())
        .unwrap_or(0)
}
