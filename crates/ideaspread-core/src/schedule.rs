//! Snapshot cadence.
//!
//! A run of `tmax` sweeps is sampled roughly `resolution` times. The spacing
//! is `floor(tmax / resolution)` sweeps, i.e. `floor(tmax / resolution) * N^2`
//! micro-steps, and a snapshot is taken whenever the micro-step index is a
//! multiple of that spacing. Step 0 is always captured.
//!
//! The integer division is deliberate: when `resolution` does not divide
//! `tmax` the effective snapshot count drifts above `resolution`, and
//! downstream analysis depends on exactly that count.

/// Which micro-steps capture a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSchedule {
    /// Spacing between snapshots in sweeps (`floor(tmax / resolution)`).
    sweeps_between: u64,
    /// Spacing between snapshots in micro-steps.
    interval: u64,
    /// Total micro-steps in the run.
    total_steps: u64,
}

impl SnapshotSchedule {
    /// Derive the cadence for a run.
    ///
    /// Returns `None` if the spacing would be zero (`resolution` is zero or
    /// larger than `tmax`) or if any product overflows.
    pub fn new(tmax: u64, resolution: u64, cell_count: u64) -> Option<Self> {
        let sweeps_between = tmax.checked_div(resolution)?;
        let interval = sweeps_between.checked_mul(cell_count)?;
        if interval == 0 {
            return None;
        }
        Some(Self {
            sweeps_between,
            interval,
            total_steps: tmax.checked_mul(cell_count)?,
        })
    }

    /// Spacing between snapshots in micro-steps.
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    /// Spacing between snapshots in sweeps.
    pub const fn sweeps_between(&self) -> u64 {
        self.sweeps_between
    }

    /// Total micro-steps in the run.
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Whether micro-step `step` captures a snapshot.
    pub const fn is_capture_step(&self, step: u64) -> bool {
        matches!(step.checked_rem(self.interval), Some(0))
    }

    /// Number of snapshots a complete run captures
    /// (`ceil(total_steps / interval)`).
    pub const fn expected_count(&self) -> u64 {
        self.total_steps.div_ceil(self.interval)
    }

    /// Micro-step index of the final snapshot, or `None` for an empty run.
    pub const fn last_capture_step(&self) -> Option<u64> {
        match self.total_steps.checked_sub(1) {
            Some(last_step) => match last_step.checked_div(self.interval) {
                Some(captures) => captures.checked_mul(self.interval),
                None => None,
            },
            None => None,
        }
    }

    /// All capture steps in order.
    pub fn capture_steps(&self) -> impl Iterator<Item = u64> {
        let interval = self.interval;
        let total = self.total_steps;
        core::iter::successors(Some(0_u64), move |&step| step.checked_add(interval))
            .take_while(move |&step| step < total)
    }
}
