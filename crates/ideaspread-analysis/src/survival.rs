//! Strategy lifetimes and survival curves.
//!
//! A strategy's lifetime is the time between the first and the last
//! snapshot in which any cell holds it. Strategies still present in the
//! final snapshot are marked as surviving; their true lifetime is unknown.

use std::collections::BTreeMap;

use ideaspread_types::{ResultBundle, StrategyId};
use serde::Serialize;

/// Observed lifetime of one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Lifetime {
    /// The strategy.
    pub strategy: StrategyId,
    /// Timestamp (micro-steps) of the first snapshot containing it.
    pub first_seen: u64,
    /// Timestamp (micro-steps) of the last snapshot containing it.
    pub last_seen: u64,
    /// `last_seen - first_seen`, in sweeps.
    pub sweeps: f64,
    /// Whether the strategy is present in the final snapshot.
    pub survives: bool,
}

/// Lifetimes of every strategy that appears in any snapshot, by id.
pub fn lifetimes(bundle: &ResultBundle) -> Vec<Lifetime> {
    let mut spans: BTreeMap<StrategyId, (u64, u64)> = BTreeMap::new();
    for snapshot in &bundle.snapshots {
        for strategy in snapshot.lattice.distinct() {
            spans
                .entry(strategy)
                .and_modify(|span| span.1 = snapshot.timestamp)
                .or_insert((snapshot.timestamp, snapshot.timestamp));
        }
    }

    let final_step = bundle.final_snapshot().map(|s| s.timestamp);
    spans
        .into_iter()
        .map(|(strategy, (first_seen, last_seen))| Lifetime {
            strategy,
            first_seen,
            last_seen,
            sweeps: bundle.sweeps(last_seen.saturating_sub(first_seen)),
            survives: Some(last_seen) == final_step,
        })
        .collect()
}

/// One point of a survival curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurvivalPoint {
    /// Lifetime in sweeps.
    pub sweeps: f64,
    /// Fraction of strategies whose lifetime is at least `sweeps`.
    pub surviving: f64,
}

/// Empirical survival function of strategy lifetimes: for each distinct
/// observed lifetime `L`, the fraction of strategies living at least `L`.
pub fn survival_curve(lifetimes: &[Lifetime]) -> Vec<SurvivalPoint> {
    let mut sorted: Vec<f64> = lifetimes.iter().map(|l| l.sweeps).collect();
    sorted.sort_by(f64::total_cmp);
    // Lifetime counts are far below 2^53.
    #[allow(clippy::cast_precision_loss)]
    let total = sorted.len() as f64;

    let mut curve: Vec<SurvivalPoint> = Vec::new();
    for (rank, &sweeps) in sorted.iter().enumerate() {
        if curve.last().is_some_and(|p| p.sweeps.total_cmp(&sweeps).is_eq()) {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let at_least = sorted.len().saturating_sub(rank) as f64;
        curve.push(SurvivalPoint {
            sweeps,
            surviving: at_least / total,
        });
    }
    curve
}
