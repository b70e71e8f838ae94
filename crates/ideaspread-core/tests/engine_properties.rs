//! Property tests for complete simulation runs.
//!
//! These drive seeded runs end to end through the public API and check the
//! statistical bookkeeping the analysis layer depends on: snapshot cadence,
//! reproducibility, and the behaviour at the extremes of the mutation rate.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use ideaspread_core::engine::{RunPlan, Simulation};
use ideaspread_core::runner::{NoOpCallback, run_simulation};
use ideaspread_types::{RunConfig, StrategyId};

fn plan(grid_size: u32, tmax: u64, resolution: u64, alpha: f64, seed: u64) -> RunPlan {
    RunPlan {
        config: RunConfig {
            grid_size,
            tmax,
            alpha,
        },
        resolution,
        seed,
    }
}

#[test]
fn cadence_on_a_four_by_four_grid() {
    // tmax = 8 = 2 * resolution; freq = 2 sweeps = 32 micro-steps of 128.
    let bundle = run_simulation(plan(4, 8, 4, 0.01, 11), &mut NoOpCallback).unwrap();
    let timestamps: Vec<u64> = bundle.snapshots.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 32, 64, 96]);
    assert!(bundle.snapshots.iter().all(|s| s.lattice.side() == 4));
}

#[test]
fn snapshot_count_follows_truncated_interval() {
    // freq = floor(10 / 3) = 3 sweeps = 27 steps; 90 steps -> ceil(90 / 27) = 4.
    let bundle = run_simulation(plan(3, 10, 3, 0.0, 1), &mut NoOpCallback).unwrap();
    let timestamps: Vec<u64> = bundle.snapshots.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![0, 27, 54, 81]);
    // The final timestamp is the last multiple of the interval below tmax * N^2.
    assert_eq!(timestamps.last().copied(), Some(81));
}

#[test]
fn same_seed_same_snapshots() {
    let p = plan(8, 30, 10, 0.02, 1234);
    let a = run_simulation(p, &mut NoOpCallback).unwrap();
    let b = run_simulation(p, &mut NoOpCallback).unwrap();
    assert_eq!(a.snapshots, b.snapshots);
    assert_eq!(
        serde_json::to_vec(&a.snapshots).unwrap(),
        serde_json::to_vec(&b.snapshots).unwrap()
    );

    let other = run_simulation(plan(8, 30, 10, 0.02, 4321), &mut NoOpCallback).unwrap();
    assert_ne!(a.snapshots, other.snapshots);
}

#[test]
fn zero_mutation_rate_freezes_the_lattice() {
    let mut sim = Simulation::seeded(plan(8, 100, 50, 0.0, 5)).unwrap();
    while sim.advance().is_some() {
        assert_eq!(sim.state().next_strategy(), StrategyId::new(1));
    }
    let bundle = sim.into_bundle();
    assert_eq!(bundle.snapshots.len(), 50);
    for snapshot in &bundle.snapshots {
        assert_eq!(snapshot.lattice.max_strategy(), Some(StrategyId::INITIAL));
    }
}

#[test]
fn unit_mutation_rate_mints_one_strategy_per_step() {
    let mut sim = Simulation::seeded(plan(5, 4, 2, 1.0, 77)).unwrap();
    let mut steps: u64 = 0;
    while let Some(outcome) = sim.advance() {
        steps = steps.saturating_add(1);
        assert!(outcome.mutation.is_some());
        assert_eq!(sim.state().next_strategy(), StrategyId::new(1 + steps));
    }
    assert_eq!(steps, 100);
    assert!(sim.state().verify().is_ok());
}

#[test]
fn lattice_values_stay_below_the_counter() {
    let mut sim = Simulation::seeded(plan(6, 50, 25, 0.1, 9)).unwrap();
    while sim.advance().is_some() {
        let next = sim.state().next_strategy();
        assert!(sim.state().lattice().cells().iter().all(|&s| s < next));
    }
    let bundle = sim.into_bundle();
    let timestamps: Vec<u64> = bundle.snapshots.iter().map(|s| s.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn snapshots_are_copies_not_views() {
    let bundle = run_simulation(plan(6, 40, 20, 0.2, 3), &mut NoOpCallback).unwrap();
    let first = &bundle.snapshots[0].lattice;
    let last = &bundle.final_snapshot().unwrap().lattice;
    // With alpha = 0.2 over 1440 steps the grid cannot be unchanged.
    assert_ne!(first, last);
    assert!(first.max_strategy() < last.max_strategy());
}
