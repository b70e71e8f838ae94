//! Dominant strategies and the waiting times between their changes.
//!
//! The dominant strategy of a snapshot is the one held by the most cells.
//! Over a run the dominant strategy stays put for a while, then is overtaken;
//! the lengths of those reigns are the waiting times whose distribution
//! signals self-organized criticality.

use std::collections::BTreeMap;

use ideaspread_types::{Lattice, ResultBundle, StrategyId};

use crate::counts::strategy_histogram;

/// The most common strategy on the lattice. Ties go to the smallest id.
///
/// Returns `None` only for an empty lattice.
pub fn dominant_strategy(lattice: &Lattice) -> Option<StrategyId> {
    top_strategies(lattice, 1).first().copied()
}

/// The `num` most common strategies, most common first. Equal counts are
/// ordered by ascending id.
pub fn top_strategies(lattice: &Lattice, num: usize) -> Vec<StrategyId> {
    let histogram: BTreeMap<StrategyId, usize> = strategy_histogram(lattice);
    let mut ranked: Vec<(StrategyId, usize)> = histogram.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(num).map(|(s, _)| s).collect()
}

/// Dominant strategy at every snapshot, in capture order.
pub fn dominant_series(bundle: &ResultBundle) -> Vec<StrategyId> {
    bundle
        .snapshots
        .iter()
        .filter_map(|s| dominant_strategy(&s.lattice))
        .collect()
}

/// Lengths of the runs of consecutive equal values in `series`.
///
/// `[a, a, b, b, b, a]` gives `[2, 3, 1]`. A constant series is a single
/// run; an empty series has none.
pub fn domain_durations<T: PartialEq>(series: &[T]) -> Vec<usize> {
    let mut durations = Vec::new();
    let mut iter = series.iter();
    let Some(mut current) = iter.next() else {
        return durations;
    };
    let mut length: usize = 1;
    for value in iter {
        if value == current {
            length = length.saturating_add(1);
        } else {
            durations.push(length);
            current = value;
            length = 1;
        }
    }
    durations.push(length);
    durations
}

/// Number of times the dominant strategy changes over the run.
pub fn dominant_changes(bundle: &ResultBundle) -> usize {
    domain_durations(&dominant_series(bundle)).len().saturating_sub(1)
}

/// Reign lengths of the dominant strategy, in sweeps.
///
/// Each snapshot stands for `floor(tmax / resolution)` sweeps, so a reign
/// of `k` consecutive snapshots lasts `k` times that.
pub fn waiting_times(bundle: &ResultBundle) -> Vec<f64> {
    let spacing = bundle
        .config
        .tmax
        .checked_div(bundle.resolution)
        .unwrap_or(0);
    // Spacing and reign lengths are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let spacing = spacing as f64;
    domain_durations(&dominant_series(bundle))
        .into_iter()
        .map(|length| {
            #[allow(clippy::cast_precision_loss)]
            let length = length as f64;
            length * spacing
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::counts::tests::bundle_of;

    #[test]
    fn dominant_prefers_most_common_then_smallest() {
        let bundle = bundle_of(&[[3, 3, 1, 2], [4, 1, 4, 1]]);
        assert_eq!(
            dominant_strategy(&bundle.snapshots[0].lattice),
            Some(StrategyId::new(3))
        );
        assert_eq!(
            dominant_strategy(&bundle.snapshots[1].lattice),
            Some(StrategyId::new(1))
        );
        assert_eq!(
            top_strategies(&bundle.snapshots[0].lattice, 5),
            vec![StrategyId::new(3), StrategyId::new(1), StrategyId::new(2)]
        );
    }

    #[test]
    fn durations_are_run_lengths() {
        assert_eq!(domain_durations(&[1, 1, 2, 2, 2, 1]), vec![2, 3, 1]);
        assert_eq!(domain_durations(&[7, 7, 7]), vec![3]);
        assert_eq!(domain_durations(&[1, 2, 3]), vec![1, 1, 1]);
        assert!(domain_durations::<u32>(&[]).is_empty());
    }

    #[test]
    fn waiting_times_scale_by_snapshot_spacing() {
        let mut bundle = bundle_of(&[
            [0, 0, 0, 0],
            [0, 0, 1, 1],
            [1, 1, 1, 0],
            [1, 1, 1, 2],
            [2, 2, 2, 1],
        ]);
        assert_eq!(
            dominant_series(&bundle),
            [0, 0, 1, 1, 2].map(StrategyId::new).to_vec()
        );
        assert_eq!(dominant_changes(&bundle), 2);
        assert_eq!(waiting_times(&bundle), vec![2.0, 2.0, 1.0]);

        // Same snapshots, three sweeps apart.
        bundle.config.tmax = 15;
        assert_eq!(waiting_times(&bundle), vec![6.0, 6.0, 3.0]);
    }
}
