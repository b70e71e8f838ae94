//! Connected same-strategy regions on the torus.
//!
//! Two cells belong to the same cluster when they hold the same strategy
//! and are Moore neighbours (the same neighbourhood imitation draws from),
//! with wrap-around at the edges.

use std::collections::BTreeMap;

use ideaspread_types::{Lattice, ResultBundle, StrategyId};

/// One connected region of cells sharing a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Strategy held by every cell of the cluster.
    pub strategy: StrategyId,
    /// Number of cells in the cluster.
    pub size: usize,
}

/// All clusters on the lattice, largest first (equal sizes by ascending
/// strategy id).
pub fn spatial_clusters(lattice: &Lattice) -> Vec<Cluster> {
    let cell_count = lattice.cell_count();
    let mut visited = vec![false; cell_count];
    let mut stack: Vec<usize> = Vec::new();
    let mut clusters = Vec::new();

    for start in 0..cell_count {
        let Some(strategy) = lattice.get_index(start) else {
            continue;
        };
        if visited.get(start).copied().unwrap_or(true) {
            continue;
        }
        if let Some(seen) = visited.get_mut(start) {
            *seen = true;
        }
        stack.push(start);
        let mut size: usize = 0;

        while let Some(index) = stack.pop() {
            size = size.saturating_add(1);
            let Some(cell) = lattice.cell_at(index) else {
                continue;
            };
            for neighbor in lattice.moore_neighbors(cell) {
                let Some(next) = lattice.index_of(neighbor) else {
                    continue;
                };
                if lattice.get_index(next) != Some(strategy) {
                    continue;
                }
                if let Some(seen) = visited.get_mut(next) {
                    if !*seen {
                        *seen = true;
                        stack.push(next);
                    }
                }
            }
        }

        clusters.push(Cluster { strategy, size });
    }

    clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.strategy.cmp(&b.strategy)));
    clusters
}

/// Cluster-size distribution pooled over every snapshot of a run:
/// cluster size -> number of clusters of that size.
pub fn cluster_size_distribution(bundle: &ResultBundle) -> BTreeMap<usize, usize> {
    let mut distribution = BTreeMap::new();
    for snapshot in &bundle.snapshots {
        for cluster in spatial_clusters(&snapshot.lattice) {
            let count: &mut usize = distribution.entry(cluster.size).or_default();
            *count = count.saturating_add(1);
        }
    }
    distribution
}
