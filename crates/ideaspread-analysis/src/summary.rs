//! One aggregated statistics record per run.

use ideaspread_core::sampling::take_spread;
use ideaspread_types::ResultBundle;
use serde::Serialize;
use uuid::Uuid;

use crate::clusters::spatial_clusters;
use crate::counts::strategy_counts;
use crate::dominance::{dominant_changes, dominant_strategy, waiting_times};
use crate::sites::site_distribution;
use crate::survival::lifetimes;

/// Headline statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleSummary {
    /// Run the summary belongs to.
    pub run_id: Uuid,
    /// Seed of the run.
    pub seed: u64,
    /// Grid side length.
    pub grid_size: u32,
    /// Mutation rate.
    pub alpha: f64,
    /// Number of snapshots.
    pub snapshot_count: usize,
    /// Timestamps of evenly spread overview snapshots.
    pub overview_timestamps: Vec<u64>,
    /// Distinct strategies in the final snapshot.
    pub final_distinct: usize,
    /// Most distinct strategies at any snapshot.
    pub peak_distinct: usize,
    /// Strategies seen in any snapshot.
    pub strategies_seen: usize,
    /// Dominant strategy of the final snapshot.
    pub final_dominant: Option<u64>,
    /// Number of changes of the dominant strategy.
    pub dominant_changes: usize,
    /// Mean reign of a dominant strategy, in sweeps.
    pub mean_waiting_time: f64,
    /// Longest reign of a dominant strategy, in sweeps.
    pub max_waiting_time: f64,
    /// Size of the largest connected cluster in the final snapshot.
    pub largest_final_cluster: usize,
    /// Largest number of distinct sites any strategy occupied.
    pub widest_spread: usize,
    /// Mean observed strategy lifetime, in sweeps.
    pub mean_lifetime: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // Lengths are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let len = values.len() as f64;
    values.iter().sum::<f64>() / len
}

/// Compute the summary of a run, spreading `overview_count` snapshots for
/// the overview.
pub fn summarize(bundle: &ResultBundle, overview_count: usize) -> BundleSummary {
    let counts = strategy_counts(bundle);
    let waits = waiting_times(bundle);
    let lives = lifetimes(bundle);
    let final_lattice = bundle.final_snapshot().map(|s| &s.lattice);

    let summary = BundleSummary {
        run_id: bundle.run_id,
        seed: bundle.seed,
        grid_size: bundle.config.grid_size,
        alpha: bundle.config.alpha,
        snapshot_count: bundle.snapshots.len(),
        overview_timestamps: take_spread(&bundle.snapshots, overview_count)
            .into_iter()
            .map(|s| s.timestamp)
            .collect(),
        final_distinct: counts.last().map_or(0, |p| p.distinct),
        peak_distinct: counts.iter().map(|p| p.distinct).max().unwrap_or(0),
        strategies_seen: lives.len(),
        final_dominant: final_lattice
            .and_then(dominant_strategy)
            .map(|s| s.into_inner()),
        dominant_changes: dominant_changes(bundle),
        mean_waiting_time: mean(&waits),
        max_waiting_time: waits.iter().copied().fold(0.0, f64::max),
        largest_final_cluster: final_lattice
            .and_then(|l| spatial_clusters(l).first().map(|c| c.size))
            .unwrap_or(0),
        widest_spread: site_distribution(bundle)
            .sites_per_strategy
            .values()
            .copied()
            .max()
            .unwrap_or(0),
        mean_lifetime: mean(&lives.iter().map(|l| l.sweeps).collect::<Vec<_>>()),
    };

    tracing::debug!(
        run_id = %summary.run_id,
        strategies_seen = summary.strategies_seen,
        dominant_changes = summary.dominant_changes,
        "Run summarized"
    );
    summary
}
