//! Site occupation of strategies over a whole run.
//!
//! For every strategy, count the distinct sites that held it in at least
//! one snapshot. In the critical regime the number of strategies that ever
//! reached `s` sites falls off as a power law in `s`.

use std::collections::{BTreeMap, BTreeSet};

use ideaspread_types::{ResultBundle, StrategyId};
use serde::Serialize;

/// Distinct sites per strategy and the histogram of those counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteDistribution {
    /// Number of distinct sites each strategy occupied in any snapshot.
    pub sites_per_strategy: BTreeMap<StrategyId, usize>,
    /// `histogram[s]` is the number of strategies that occupied exactly
    /// `s` distinct sites.
    pub histogram: Vec<usize>,
}

/// Count the distinct sites each strategy occupied across all snapshots.
pub fn site_distribution(bundle: &ResultBundle) -> SiteDistribution {
    let mut occupied: BTreeMap<StrategyId, BTreeSet<usize>> = BTreeMap::new();
    for snapshot in &bundle.snapshots {
        for (index, &strategy) in snapshot.lattice.cells().iter().enumerate() {
            occupied.entry(strategy).or_default().insert(index);
        }
    }

    let sites_per_strategy: BTreeMap<StrategyId, usize> = occupied
        .into_iter()
        .map(|(strategy, sites)| (strategy, sites.len()))
        .collect();

    let largest = sites_per_strategy.values().copied().max().unwrap_or(0);
    let mut histogram = vec![0_usize; largest.saturating_add(1)];
    for &sites in sites_per_strategy.values() {
        if let Some(slot) = histogram.get_mut(sites) {
            *slot = slot.saturating_add(1);
        }
    }

    SiteDistribution {
        sites_per_strategy,
        histogram,
    }
}
