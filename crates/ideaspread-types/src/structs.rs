//! Run configuration, snapshots, and the result bundle.
//!
//! The [`ResultBundle`] is the only thing the simulation hands to the
//! outside world. Its field names follow what downstream analysis expects
//! (`config.N`, `config.alpha`, an ordered list of timestamped grids).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lattice::Lattice;

/// Model parameters fixed for the duration of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Grid side length `N`.
    #[serde(rename = "N")]
    pub grid_size: u32,

    /// Run length in sweeps. The engine performs `tmax * N^2` micro-steps.
    pub tmax: u64,

    /// Probability of a mutation event per micro-step.
    pub alpha: f64,
}

impl RunConfig {
    /// Number of cells on the grid (`N^2`), or `None` on overflow.
    pub const fn cell_count(&self) -> Option<u64> {
        (self.grid_size as u64).checked_mul(self.grid_size as u64)
    }

    /// Total micro-step budget (`tmax * N^2`), or `None` on overflow.
    pub const fn total_steps(&self) -> Option<u64> {
        match self.cell_count() {
            Some(cells) => self.tmax.checked_mul(cells),
            None => None,
        }
    }
}

/// A frozen copy of the lattice at a given micro-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Micro-step index at which the copy was taken.
    pub timestamp: u64,
    /// The lattice as it stood after that micro-step. Serialized as an
    /// `N x N` matrix of strategy identifiers.
    pub lattice: Lattice,
}

/// Everything one simulation run produced.
///
/// Built once in memory after the last micro-step and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Unique run identifier (UUID v7, time-ordered).
    pub run_id: Uuid,
    /// Wall-clock time at which the bundle was assembled.
    pub created_at: DateTime<Utc>,
    /// Seed of the random source that drove the run.
    pub seed: u64,
    /// Target snapshot count the cadence was derived from.
    pub resolution: u64,
    /// Model parameters.
    pub config: RunConfig,
    /// Snapshots in capture order.
    pub snapshots: Vec<Snapshot>,
}

impl ResultBundle {
    /// Assemble a bundle with a fresh run id and the current time.
    pub fn new(config: RunConfig, seed: u64, resolution: u64, snapshots: Vec<Snapshot>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            created_at: Utc::now(),
            seed,
            resolution,
            config,
            snapshots,
        }
    }

    /// The last snapshot taken, if any.
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Convert a micro-step timestamp into sweeps (`t / N^2`).
    pub fn sweeps(&self, timestamp: u64) -> f64 {
        let cells = self.config.cell_count().unwrap_or(1).max(1);
        // Both values are far below 2^53 for any grid that fits in memory.
        #[allow(clippy::cast_precision_loss)]
        let sweeps = timestamp as f64 / cells as f64;
        sweeps
    }
}
