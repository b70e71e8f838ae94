//! Run orchestration: single runs, concurrent batches, and snapshot
//! callbacks.
//!
//! [`run_simulation`] drives one seeded [`Simulation`] to completion and
//! returns its [`ResultBundle`]. [`run_batch`] runs several independent
//! plans concurrently on the tokio blocking pool. Each run owns its
//! lattice, histories, and generator; nothing is shared between them, so
//! a batch produces exactly what the same plans would produce one by one.
//!
//! A [`SnapshotCallback`] is notified after every captured snapshot. The
//! micro-step loop itself never blocks or performs I/O.

use ideaspread_types::{ResultBundle, Snapshot};
use tracing::{debug, info, warn};

use crate::draws::DrawSource;
use crate::engine::{RunPlan, Simulation, SimulationError, SimulationState};

/// Errors that can occur while running simulations.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A run could not be started.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },

    /// A blocking run task panicked or was cancelled.
    #[error("simulation task failed: {message}")]
    Join {
        /// Description of the task failure.
        message: String,
    },
}

/// Callback invoked after each captured snapshot.
pub trait SnapshotCallback: Send {
    /// Called right after `snapshot` is appended for the run `plan`.
    fn on_snapshot(&mut self, plan: &RunPlan, snapshot: &Snapshot, state: &SimulationState);
}

/// A no-op snapshot callback.
pub struct NoOpCallback;

impl SnapshotCallback for NoOpCallback {
    fn on_snapshot(&mut self, _plan: &RunPlan, _snapshot: &Snapshot, _state: &SimulationState) {}
}

/// Logs run progress through `tracing`.
///
/// Every snapshot is logged at debug level; every `every`-th snapshot is
/// also logged at info level (`every = 0` disables the info lines).
#[derive(Debug, Clone)]
pub struct ProgressLog {
    every: u64,
    captured: u64,
    expected: u64,
}

impl ProgressLog {
    /// Create a progress logger for a run expected to capture `expected`
    /// snapshots.
    pub const fn new(every: u64, expected: u64) -> Self {
        Self {
            every,
            captured: 0,
            expected,
        }
    }

    /// Progress logger sized from a plan's schedule. Invalid plans get an
    /// expected count of zero; they are rejected before the first step.
    pub fn for_plan(every: u64, plan: &RunPlan) -> Self {
        let expected = plan.validate().map_or(0, |s| s.expected_count());
        Self::new(every, expected)
    }

    /// Snapshots seen so far.
    pub const fn captured(&self) -> u64 {
        self.captured
    }
}

impl SnapshotCallback for ProgressLog {
    fn on_snapshot(&mut self, plan: &RunPlan, snapshot: &Snapshot, state: &SimulationState) {
        self.captured = self.captured.saturating_add(1);
        let strategies_present = state.population().present();
        let next_strategy = state.next_strategy().into_inner();

        if self.every > 0 && self.captured.checked_rem(self.every) == Some(0) {
            info!(
                seed = plan.seed,
                captured = self.captured,
                expected = self.expected,
                step = snapshot.timestamp,
                strategies_present,
                next_strategy,
                "Run progress"
            );
        } else {
            debug!(
                seed = plan.seed,
                captured = self.captured,
                step = snapshot.timestamp,
                strategies_present,
                "Snapshot captured"
            );
        }
    }
}

/// Drive a simulation through its remaining micro-steps, notifying
/// `callback` after every captured snapshot.
pub fn drive<D: DrawSource>(simulation: &mut Simulation<D>, callback: &mut dyn SnapshotCallback) {
    let mut seen = simulation.snapshots().len();
    while simulation.advance().is_some() {
        let snapshots = simulation.snapshots();
        if snapshots.len() > seen {
            seen = snapshots.len();
            if let Some(snapshot) = snapshots.last() {
                callback.on_snapshot(simulation.plan(), snapshot, simulation.state());
            }
        }
    }
}

/// Run one seeded simulation to completion.
///
/// # Errors
///
/// Returns [`RunnerError::Simulation`] if the plan is invalid. No work is
/// done in that case.
pub fn run_simulation(
    plan: RunPlan,
    callback: &mut dyn SnapshotCallback,
) -> Result<ResultBundle, RunnerError> {
    let mut simulation = Simulation::seeded(plan)?;
    let schedule = *simulation.schedule();

    info!(
        grid_size = plan.config.grid_size,
        tmax = plan.config.tmax,
        alpha = plan.config.alpha,
        resolution = plan.resolution,
        seed = plan.seed,
        total_steps = schedule.total_steps(),
        snapshot_interval = schedule.interval(),
        expected_snapshots = schedule.expected_count(),
        "Simulation starting"
    );

    drive(&mut simulation, callback);
    Ok(simulation.into_bundle())
}

/// Run independent plans concurrently, returning bundles in plan order.
///
/// Every plan is validated before any run starts, so a bad plan anywhere in
/// the batch yields an error and no bundles.
///
/// # Errors
///
/// Returns [`RunnerError::Simulation`] for an invalid plan, or
/// [`RunnerError::Join`] if a run task fails.
pub async fn run_batch<F, C>(
    plans: Vec<RunPlan>,
    make_callback: F,
) -> Result<Vec<ResultBundle>, RunnerError>
where
    F: Fn(&RunPlan) -> C,
    C: SnapshotCallback + 'static,
{
    for plan in &plans {
        plan.validate()?;
    }

    info!(runs = plans.len(), "Batch starting");

    let tasks = plans.into_iter().map(|plan| {
        let mut callback = make_callback(&plan);
        tokio::task::spawn_blocking(move || run_simulation(plan, &mut callback))
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => result,
            Err(e) => Err(RunnerError::Join {
                message: format!("{e}"),
            }),
        })
        .collect()
}

/// Log the end of a run.
pub fn log_simulation_end(bundle: &ResultBundle) {
    info!(
        run_id = %bundle.run_id,
        seed = bundle.seed,
        grid_size = bundle.config.grid_size,
        alpha = bundle.config.alpha,
        snapshots = bundle.snapshots.len(),
        "Simulation ended"
    );

    if let Some(snapshot) = bundle.final_snapshot() {
        info!(
            step = snapshot.timestamp,
            sweep = bundle.sweeps(snapshot.timestamp),
            strategies_present = snapshot.lattice.distinct().len(),
            max_strategy = snapshot.lattice.max_strategy().map(|s| s.into_inner()),
            "Final snapshot"
        );
    } else {
        warn!("Simulation ended with no snapshots captured");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use ideaspread_types::RunConfig;

    use super::*;

    fn plan(seed: u64, alpha: f64) -> RunPlan {
        RunPlan {
            config: RunConfig {
                grid_size: 6,
                tmax: 20,
                alpha,
            },
            resolution: 10,
            seed,
        }
    }

    struct CountCallback {
        count: u64,
        timestamps: Vec<u64>,
    }

    impl SnapshotCallback for CountCallback {
        fn on_snapshot(&mut self, _plan: &RunPlan, snapshot: &Snapshot, _state: &SimulationState) {
            self.count = self.count.saturating_add(1);
            self.timestamps.push(snapshot.timestamp);
        }
    }

    #[test]
    fn callback_sees_every_snapshot() {
        let mut cb = CountCallback {
            count: 0,
            timestamps: Vec::new(),
        };
        let bundle = run_simulation(plan(1, 0.01), &mut cb).unwrap();

        // 20 sweeps of 36 steps, one snapshot every 2 sweeps.
        assert_eq!(cb.count, 10);
        assert_eq!(bundle.snapshots.len(), 10);
        let expected: Vec<u64> = (0..10).map(|i| i * 72).collect();
        assert_eq!(cb.timestamps, expected);
    }

    #[test]
    fn progress_log_counts_snapshots() {
        let p = plan(3, 0.01);
        let mut log = ProgressLog::for_plan(4, &p);
        let _ = run_simulation(p, &mut log).unwrap();
        assert_eq!(log.captured(), 10);
    }

    #[test]
    fn invalid_plan_produces_no_bundle() {
        let mut bad = plan(1, 0.01);
        bad.resolution = 0;
        let result = run_simulation(bad, &mut NoOpCallback);
        assert!(matches!(result, Err(RunnerError::Simulation { .. })));
    }

    #[tokio::test]
    async fn batch_preserves_order_and_determinism() {
        let plans = vec![plan(1, 0.01), plan(2, 0.05), plan(1, 0.01)];
        let bundles = run_batch(plans.clone(), |_| NoOpCallback).await.unwrap();

        assert_eq!(bundles.len(), 3);
        for (bundle, plan) in bundles.iter().zip(&plans) {
            assert_eq!(bundle.seed, plan.seed);
            assert_eq!(bundle.config, plan.config);
        }
        assert_eq!(bundles[0].snapshots, bundles[2].snapshots);

        let sequential = run_simulation(plans[1], &mut NoOpCallback).unwrap();
        assert_eq!(sequential.snapshots, bundles[1].snapshots);
    }

    #[tokio::test]
    async fn batch_rejects_any_invalid_plan() {
        let mut bad = plan(2, 0.01);
        bad.config.alpha = 2.0;
        let result = run_batch(vec![plan(1, 0.01), bad], |_| NoOpCallback).await;
        assert!(matches!(result, Err(RunnerError::Simulation { .. })));
    }
}
