//! Strategy counts and grid shares over time.

use std::collections::BTreeMap;

use ideaspread_types::{Lattice, ResultBundle, StrategyId};
use serde::Serialize;

/// Number of cells holding each strategy present on the lattice.
pub fn strategy_histogram(lattice: &Lattice) -> BTreeMap<StrategyId, usize> {
    let mut histogram = BTreeMap::new();
    for &strategy in lattice.cells() {
        let count: &mut usize = histogram.entry(strategy).or_default();
        *count = count.saturating_add(1);
    }
    histogram
}

/// Share of the lattice held by each entry of a histogram.
fn shares(histogram: &BTreeMap<StrategyId, usize>, cells: usize) -> BTreeMap<StrategyId, f64> {
    if cells == 0 {
        return BTreeMap::new();
    }
    // Cell counts are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let total = cells as f64;
    histogram
        .iter()
        .map(|(&strategy, &count)| {
            #[allow(clippy::cast_precision_loss)]
            let share = count as f64 / total;
            (strategy, share)
        })
        .collect()
}

/// Distinct strategies alive at one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyCountPoint {
    /// Snapshot time in sweeps.
    pub sweep: f64,
    /// Number of distinct strategies on the grid.
    pub distinct: usize,
}

/// Number of distinct strategies at every snapshot.
pub fn strategy_counts(bundle: &ResultBundle) -> Vec<StrategyCountPoint> {
    bundle
        .snapshots
        .iter()
        .map(|snapshot| StrategyCountPoint {
            sweep: bundle.sweeps(snapshot.timestamp),
            distinct: snapshot.lattice.distinct().len(),
        })
        .collect()
}

/// Per-strategy grid share at every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterShareSeries {
    /// Snapshot times in sweeps.
    pub sweeps: Vec<f64>,
    /// For each selected strategy, its share of the grid at each snapshot
    /// (0 where absent). Every vector has the same length as `sweeps`.
    pub shares: BTreeMap<StrategyId, Vec<f64>>,
}

/// Relative cluster sizes of every strategy whose share of the grid reaches
/// at least `min_peak_share` at some snapshot.
///
/// Long runs mint tens of thousands of short-lived strategies; the peak
/// filter keeps the series to the ones that ever mattered. Pass `0.0` to
/// keep everything.
pub fn relative_cluster_sizes(bundle: &ResultBundle, min_peak_share: f64) -> ClusterShareSeries {
    let per_snapshot: Vec<BTreeMap<StrategyId, f64>> = bundle
        .snapshots
        .iter()
        .map(|s| shares(&strategy_histogram(&s.lattice), s.lattice.cell_count()))
        .collect();

    let mut peaks: BTreeMap<StrategyId, f64> = BTreeMap::new();
    for snapshot_shares in &per_snapshot {
        for (&strategy, &share) in snapshot_shares {
            let peak = peaks.entry(strategy).or_insert(0.0);
            *peak = peak.max(share);
        }
    }

    let shares = peaks
        .into_iter()
        .filter(|&(_, peak)| peak >= min_peak_share)
        .map(|(strategy, _)| {
            let series = per_snapshot
                .iter()
                .map(|snapshot_shares| snapshot_shares.get(&strategy).copied().unwrap_or(0.0))
                .collect();
            (strategy, series)
        })
        .collect();

    ClusterShareSeries {
        sweeps: bundle
            .snapshots
            .iter()
            .map(|s| bundle.sweeps(s.timestamp))
            .collect(),
        shares,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use ideaspread_types::{RunConfig, Snapshot};

    use super::*;

    /// Build a bundle from hand-written 2x2 grids, one snapshot per sweep.
    pub(crate) fn bundle_of(grids: &[[u64; 4]]) -> ResultBundle {
        let snapshots = grids
            .iter()
            .zip(0_u64..)
            .map(|(grid, i)| Snapshot {
                timestamp: i.saturating_mul(4),
                lattice: Lattice::from_cells(2, grid.iter().copied().map(StrategyId::new).collect())
                    .unwrap(),
            })
            .collect();
        let tmax = u64::try_from(grids.len()).unwrap();
        ResultBundle::new(
            RunConfig {
                grid_size: 2,
                tmax,
                alpha: 0.1,
            },
            1,
            tmax,
            snapshots,
        )
    }

    #[test]
    fn histogram_counts_cells() {
        let bundle = bundle_of(&[[0, 2, 2, 5]]);
        let histogram = strategy_histogram(&bundle.snapshots[0].lattice);
        assert_eq!(
            histogram.into_iter().collect::<Vec<_>>(),
            vec![
                (StrategyId::new(0), 1),
                (StrategyId::new(2), 2),
                (StrategyId::new(5), 1)
            ]
        );
    }

    #[test]
    fn counts_track_distinct_strategies() {
        let bundle = bundle_of(&[[0, 0, 0, 0], [0, 1, 0, 0], [2, 1, 1, 3]]);
        let counts = strategy_counts(&bundle);
        let distinct: Vec<usize> = counts.iter().map(|p| p.distinct).collect();
        assert_eq!(distinct, vec![1, 2, 3]);
        assert!((counts[2].sweep - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shares_fill_absent_strategies_with_zero() {
        let bundle = bundle_of(&[[0, 0, 0, 0], [0, 1, 1, 1], [2, 1, 1, 1]]);
        let series = relative_cluster_sizes(&bundle, 0.0);
        assert_eq!(series.sweeps, vec![0.0, 1.0, 2.0]);
        assert_eq!(series.shares[&StrategyId::new(0)], vec![1.0, 0.25, 0.0]);
        assert_eq!(series.shares[&StrategyId::new(1)], vec![0.0, 0.75, 0.75]);
        assert_eq!(series.shares[&StrategyId::new(2)], vec![0.0, 0.0, 0.25]);

        let filtered = relative_cluster_sizes(&bundle, 0.5);
        assert_eq!(
            filtered.shares.keys().copied().collect::<Vec<_>>(),
            vec![StrategyId::new(0), StrategyId::new(1)]
        );
    }
}
