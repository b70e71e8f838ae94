//! The stochastic update engine.
//!
//! [`SimulationState`] owns everything that changes during a run: the
//! lattice, the per-cell strategy histories, the running population counts,
//! and the next unused strategy identifier. [`SimulationState::step`] applies
//! one micro-step of the imitation + mutation rule:
//!
//! 1. Pick a source cell `i` uniformly.
//! 2. Pick a neighbour `j` by shifting each coordinate of `i` by -1, 0 or +1
//!    (toroidal wrap; `j` may equal `i`).
//! 3. The imitation threshold is the share of the grid holding `j`'s
//!    strategy, read before anything in this step changes.
//! 4. With that probability, and only if `i` has never held `j`'s strategy,
//!    `i` adopts it.
//! 5. Independently, with probability `alpha`, a uniformly chosen cell `k`
//!    receives a brand-new strategy.
//!
//! [`Simulation`] wraps a state with its run plan, draw source, and snapshot
//! schedule, and advances one micro-step at a time until the step budget of
//! `tmax * N^2` is spent. Imitation and mutation may both fire in the same
//! micro-step, on the same cell or on different ones.

use ideaspread_types::{Cell, Lattice, ResultBundle, RunConfig, Snapshot, StrategyId};

use crate::draws::{DrawSource, SeededDraws};
use crate::history::StrategyHistory;
use crate::population::PopulationCounts;
use crate::schedule::SnapshotSchedule;

/// Errors raised by the simulation engine.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The run plan cannot be simulated. Raised before any step runs.
    #[error("invalid simulation configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A state consistency check failed.
    #[error("simulation invariant violated: {reason}")]
    InvariantViolated {
        /// Which invariant failed and where.
        reason: String,
    },
}

/// Everything needed to start one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPlan {
    /// Model parameters.
    pub config: RunConfig,
    /// Target number of snapshots.
    pub resolution: u64,
    /// Seed for the run's random source.
    pub seed: u64,
}

impl RunPlan {
    /// Check the plan and derive its snapshot schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] if the grid is empty, the
    /// run has no steps, `alpha` is not a probability, `resolution` is zero
    /// or exceeds `tmax`, or the step budget overflows.
    pub fn validate(&self) -> Result<SnapshotSchedule, SimulationError> {
        let config = &self.config;
        if config.grid_size == 0 {
            return Err(invalid("grid_size must be at least 1"));
        }
        if config.tmax == 0 {
            return Err(invalid("tmax must be at least 1"));
        }
        if !(0.0..=1.0).contains(&config.alpha) {
            return Err(invalid(format!(
                "alpha must lie in [0, 1], got {}",
                config.alpha
            )));
        }
        if self.resolution == 0 || self.resolution > config.tmax {
            return Err(invalid(format!(
                "resolution must lie in [1, tmax = {}], got {}",
                config.tmax, self.resolution
            )));
        }
        if config.total_steps().is_none() {
            return Err(invalid(format!(
                "step budget tmax * N^2 overflows (tmax = {}, N = {})",
                config.tmax, config.grid_size
            )));
        }
        let cells = config.cell_count().unwrap_or(0);
        SnapshotSchedule::new(config.tmax, self.resolution, cells)
            .ok_or_else(|| invalid("snapshot interval is zero or overflows"))
    }
}

fn invalid(reason: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfig {
        reason: reason.into(),
    }
}

/// A mutation event: `cell` received the brand-new `strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// The cell that mutated.
    pub cell: Cell,
    /// The strategy it received.
    pub strategy: StrategyId,
}

/// What happened during one micro-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// The source cell `i`.
    pub source: Cell,
    /// The neighbour `j` whose strategy was proposed.
    pub neighbor: Cell,
    /// Adoption probability for the proposal.
    pub threshold: f64,
    /// The strategy `i` adopted, if imitation succeeded.
    pub adopted: Option<StrategyId>,
    /// The mutation event, if one fired.
    pub mutation: Option<Mutation>,
}

/// Mutable model state for a single run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    lattice: Lattice,
    history: StrategyHistory,
    population: PopulationCounts,
    next_strategy: StrategyId,
}

impl SimulationState {
    /// A `side x side` grid where every cell holds strategy 0 and has
    /// history `{0}`. The next strategy id equals the number of distinct
    /// initial values, i.e. 1.
    pub fn new(side: u32) -> Self {
        let lattice = Lattice::new(side);
        let history = StrategyHistory::new(lattice.cell_count(), StrategyId::INITIAL);
        let population = PopulationCounts::from_lattice(&lattice);
        let distinct = u64::try_from(lattice.distinct().len()).unwrap_or(u64::MAX);
        Self {
            lattice,
            history,
            population,
            next_strategy: StrategyId::new(distinct),
        }
    }

    /// The current lattice.
    pub const fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Per-cell strategy histories.
    pub const fn history(&self) -> &StrategyHistory {
        &self.history
    }

    /// Running per-strategy counts.
    pub const fn population(&self) -> &PopulationCounts {
        &self.population
    }

    /// The identifier the next mutation will introduce.
    pub const fn next_strategy(&self) -> StrategyId {
        self.next_strategy
    }

    fn cell_total(&self) -> u64 {
        u64::try_from(self.lattice.cell_count()).unwrap_or(u64::MAX)
    }

    /// Imitation threshold for proposals coming from `cell`: the share of
    /// the grid currently holding the same strategy.
    pub fn threshold(&self, cell: Cell) -> f64 {
        self.lattice.get(cell).map_or(0.0, |strategy| {
            self.population.fraction(strategy, self.cell_total())
        })
    }

    /// Let `source` adopt the strategy of `neighbor` if `roll < threshold`
    /// and `source` has never held it. Returns the adopted strategy.
    pub fn try_imitate(
        &mut self,
        source: Cell,
        neighbor: Cell,
        roll: f64,
        threshold: f64,
    ) -> Option<StrategyId> {
        if roll >= threshold {
            return None;
        }
        let proposed = self.lattice.get(neighbor)?;
        let index = self.lattice.index_of(source)?;
        if self.history.contains(index, proposed) {
            return None;
        }
        self.assign(index, proposed)?;
        Some(proposed)
    }

    /// Give `cell` the next unused strategy. Returns `None` if the id space
    /// is exhausted.
    pub fn mutate(&mut self, cell: Cell) -> Option<StrategyId> {
        let strategy = self.next_strategy;
        let following = strategy.next()?;
        let index = self.lattice.index_of(cell)?;
        self.assign(index, strategy)?;
        self.next_strategy = following;
        Some(strategy)
    }

    fn assign(&mut self, index: usize, strategy: StrategyId) -> Option<()> {
        let previous = self.lattice.set_index(index, strategy)?;
        self.history.record(index, strategy);
        self.population.transfer(previous, strategy);
        Some(())
    }

    fn random_cell<D: DrawSource + ?Sized>(&self, draws: &mut D) -> Cell {
        let side = self.lattice.side();
        let x = draws.coordinate(side);
        let y = draws.coordinate(side);
        Cell::new(x, y)
    }

    /// Apply one micro-step with mutation probability `alpha`.
    pub fn step<D: DrawSource + ?Sized>(&mut self, draws: &mut D, alpha: f64) -> StepOutcome {
        let source = self.random_cell(draws);
        let dx = draws.offset();
        let dy = draws.offset();
        let neighbor = self.lattice.offset(source, dx, dy);

        let threshold = self.threshold(neighbor);
        let roll = draws.unit();
        let adopted = self.try_imitate(source, neighbor, roll, threshold);

        let mutation = if draws.unit() < alpha {
            let cell = self.random_cell(draws);
            self.mutate(cell).map(|strategy| Mutation { cell, strategy })
        } else {
            None
        };

        StepOutcome {
            source,
            neighbor,
            threshold,
            adopted,
            mutation,
        }
    }

    /// Check every consistency invariant of the state.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvariantViolated`] naming the first
    /// broken invariant: a cell's current strategy missing from its history,
    /// a strategy at or beyond the next unused id, or population counts
    /// disagreeing with the lattice.
    pub fn verify(&self) -> Result<(), SimulationError> {
        for (index, &strategy) in self.lattice.cells().iter().enumerate() {
            if !self.history.contains(index, strategy) {
                return Err(SimulationError::InvariantViolated {
                    reason: format!("cell {index} holds {strategy} outside its history"),
                });
            }
            if strategy >= self.next_strategy {
                return Err(SimulationError::InvariantViolated {
                    reason: format!(
                        "cell {index} holds {strategy}, next strategy is {}",
                        self.next_strategy
                    ),
                });
            }
        }
        for strategy in self.lattice.distinct() {
            let scanned = u64::try_from(self.lattice.count(strategy)).unwrap_or(u64::MAX);
            if self.population.count(strategy) != scanned {
                return Err(SimulationError::InvariantViolated {
                    reason: format!(
                        "population of {strategy} is {}, lattice holds {scanned}",
                        self.population.count(strategy)
                    ),
                });
            }
        }
        if self.population.total() != self.cell_total() {
            return Err(SimulationError::InvariantViolated {
                reason: "population counts do not sum to the cell count".to_owned(),
            });
        }
        Ok(())
    }
}

/// A single run in progress.
#[derive(Debug, Clone)]
pub struct Simulation<D> {
    plan: RunPlan,
    schedule: SnapshotSchedule,
    state: SimulationState,
    draws: D,
    step: u64,
    snapshots: Vec<Snapshot>,
}

impl Simulation<SeededDraws> {
    /// Start a run driven by a generator seeded with `plan.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] if the plan is invalid.
    pub fn seeded(plan: RunPlan) -> Result<Self, SimulationError> {
        Self::with_draws(plan, SeededDraws::new(plan.seed))
    }
}

impl<D: DrawSource> Simulation<D> {
    /// Start a run driven by an arbitrary draw source.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfig`] if the plan is invalid.
    pub fn with_draws(plan: RunPlan, draws: D) -> Result<Self, SimulationError> {
        let schedule = plan.validate()?;
        let capacity = usize::try_from(schedule.expected_count()).unwrap_or(0);
        Ok(Self {
            plan,
            schedule,
            state: SimulationState::new(plan.config.grid_size),
            draws,
            step: 0,
            snapshots: Vec::with_capacity(capacity),
        })
    }

    /// The plan this run was started with.
    pub const fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// The snapshot cadence.
    pub const fn schedule(&self) -> &SnapshotSchedule {
        &self.schedule
    }

    /// The current model state.
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Index of the next micro-step to run.
    pub const fn current_step(&self) -> u64 {
        self.step
    }

    /// Snapshots captured so far.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Whether the step budget is spent.
    pub const fn is_finished(&self) -> bool {
        self.step >= self.schedule.total_steps()
    }

    /// Run one micro-step, capturing a snapshot if the cadence says so.
    ///
    /// Returns `None` once the step budget is spent.
    pub fn advance(&mut self) -> Option<StepOutcome> {
        if self.is_finished() {
            return None;
        }
        let outcome = self.state.step(&mut self.draws, self.plan.config.alpha);
        if self.schedule.is_capture_step(self.step) {
            self.snapshots.push(Snapshot {
                timestamp: self.step,
                lattice: self.state.lattice.clone(),
            });
        }
        self.step = self.step.saturating_add(1);
        Some(outcome)
    }

    /// Run every remaining micro-step.
    pub fn run_to_end(&mut self) {
        while self.advance().is_some() {}
    }

    /// Close the run and assemble its result bundle.
    pub fn into_bundle(self) -> ResultBundle {
        ResultBundle::new(
            self.plan.config,
            self.plan.seed,
            self.plan.resolution,
            self.snapshots,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::draws::ScriptedDraws;

    fn plan(grid_size: u32, tmax: u64, resolution: u64, alpha: f64) -> RunPlan {
        RunPlan {
            config: RunConfig {
                grid_size,
                tmax,
                alpha,
            },
            resolution,
            seed: 42,
        }
    }

    fn ids(raw: &[u64]) -> BTreeSet<StrategyId> {
        raw.iter().copied().map(StrategyId::new).collect()
    }

    #[test]
    fn initial_state_is_uniform() {
        let state = SimulationState::new(3);
        assert_eq!(state.next_strategy(), StrategyId::new(1));
        assert_eq!(state.lattice().count(StrategyId::INITIAL), 9);
        assert!((state.threshold(Cell::new(1, 1)) - 1.0).abs() < f64::EPSILON);
        assert!(state.verify().is_ok());
    }

    #[test]
    fn invalid_plans_are_rejected() {
        let cases = [
            plan(0, 8, 4, 0.1),
            plan(4, 0, 1, 0.1),
            plan(4, 8, 4, -0.1),
            plan(4, 8, 4, 1.5),
            plan(4, 8, 4, f64::NAN),
            plan(4, 8, 0, 0.1),
            plan(4, 8, 9, 0.1),
            plan(u32::MAX, u64::MAX, 1, 0.0),
        ];
        for case in cases {
            let result = Simulation::seeded(case);
            assert!(
                matches!(result, Err(SimulationError::InvalidConfig { .. })),
                "plan should be rejected: {case:?}"
            );
        }
        assert!(Simulation::seeded(plan(4, 8, 4, 1.0)).is_ok());
        assert!(Simulation::seeded(plan(4, 8, 8, 0.0)).is_ok());
    }

    #[test]
    fn large_mutating_runs_pass_validation() {
        // 256 x 256 over the reference 80 000 sweeps: 5.2e9 micro-steps.
        let schedule = plan(256, 80_000, 40_000, 25e-6).validate().unwrap();
        assert_eq!(schedule.total_steps(), 5_242_880_000);
        assert_eq!(schedule.expected_count(), 40_000);

        // 2^32 micro-steps in a single sweep.
        let schedule = plan(1 << 16, 1, 1, 1e-9).validate().unwrap();
        assert_eq!(schedule.total_steps(), 1 << 32);
    }

    #[test]
    fn mutation_ids_continue_past_the_u32_range() {
        let mut state = SimulationState::new(2);
        state.next_strategy = StrategyId::new(u64::from(u32::MAX));
        assert_eq!(
            state.mutate(Cell::new(0, 0)),
            Some(StrategyId::new(u64::from(u32::MAX)))
        );
        assert_eq!(
            state.mutate(Cell::new(1, 1)),
            Some(StrategyId::new(u64::from(u32::MAX) + 1))
        );
        assert_eq!(state.population().count(StrategyId::INITIAL), 2);
    }

    #[test]
    fn imitation_never_readopts_a_discarded_strategy() {
        let mut state = SimulationState::new(2);
        let first = state.mutate(Cell::new(0, 0)).unwrap();
        assert_eq!(first, StrategyId::new(1));

        // (0, 1) adopts strategy 1 from (0, 0).
        let adopted = state.try_imitate(Cell::new(0, 1), Cell::new(0, 0), 0.0, 0.25);
        assert_eq!(adopted, Some(first));

        // (0, 1) mutates away, then is offered strategy 1 again.
        let second = state.mutate(Cell::new(0, 1)).unwrap();
        assert_eq!(second, StrategyId::new(2));
        let again = state.try_imitate(Cell::new(0, 1), Cell::new(0, 0), 0.0, 1.0);
        assert_eq!(again, None);
        assert_eq!(state.lattice().get(Cell::new(0, 1)), Some(second));
        assert!(state.verify().is_ok());
    }

    #[test]
    fn roll_must_fall_below_threshold() {
        let mut state = SimulationState::new(2);
        state.mutate(Cell::new(1, 1));
        assert_eq!(state.try_imitate(Cell::new(0, 0), Cell::new(1, 1), 0.25, 0.25), None);
        assert_eq!(
            state.try_imitate(Cell::new(0, 0), Cell::new(1, 1), 0.24, 0.25),
            Some(StrategyId::new(1))
        );
    }

    #[test]
    fn hand_traced_two_by_two_run() {
        // N = 2, tmax = 1 (4 micro-steps), alpha = 1: every step mutates.
        //
        // step 0: i=(0,0) j=(0,0) thr=1.00 roll .5 -> 0 already held
        //         mutate (1,1) -> 1                   lattice [0,0,0,1]
        // step 1: i=(0,1) j=(1,1) thr=.25  roll .2 -> adopt 1
        //         mutate (0,0) -> 2                   lattice [2,1,0,1]
        // step 2: i=(1,1) j=(0,0) thr=.25  roll .1 -> adopt 2
        //         mutate (1,0) -> 3                   lattice [2,1,3,2]
        // step 3: i=(1,1) j=(0,1) thr=.25  roll .0 -> 1 already held
        //         mutate (0,1) -> 4                   lattice [2,4,3,2]
        let draws = ScriptedDraws::new(
            [0, 0, 1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 1],
            [0, 0, 1, 0, -1, -1, -1, 0],
            [0.5, 0.1, 0.2, 0.3, 0.1, 0.9, 0.0, 0.5],
        );
        let mut sim = Simulation::with_draws(plan(2, 1, 1, 1.0), draws).unwrap();

        let outcomes: Vec<StepOutcome> = core::iter::from_fn(|| sim.advance()).collect();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes.iter().map(|o| o.adopted).collect::<Vec<_>>(),
            vec![None, Some(StrategyId::new(1)), Some(StrategyId::new(2)), None]
        );
        assert!((outcomes[0].threshold - 1.0).abs() < f64::EPSILON);
        assert!((outcomes[3].threshold - 0.25).abs() < f64::EPSILON);
        assert_eq!(outcomes[2].neighbor, Cell::new(0, 0));

        let state = sim.state();
        let cells: Vec<u64> = state.lattice().cells().iter().map(|s| s.into_inner()).collect();
        assert_eq!(cells, vec![2, 4, 3, 2]);
        assert_eq!(state.next_strategy(), StrategyId::new(5));
        assert_eq!(state.history().of(0), Some(&ids(&[0, 2])));
        assert_eq!(state.history().of(1), Some(&ids(&[0, 1, 4])));
        assert_eq!(state.history().of(2), Some(&ids(&[0, 3])));
        assert_eq!(state.history().of(3), Some(&ids(&[0, 1, 2])));
        assert!(state.verify().is_ok());

        // interval = floor(1 / 1) * 4 = 4: only step 0 is captured.
        let bundle = sim.into_bundle();
        assert_eq!(bundle.snapshots.len(), 1);
        let first: Vec<u64> = bundle.snapshots[0]
            .lattice
            .cells()
            .iter()
            .map(|s| s.into_inner())
            .collect();
        assert_eq!(first, vec![0, 0, 0, 1]);
    }

    #[test]
    fn hand_traced_run_without_mutation_stays_uniform() {
        // N = 2, tmax = 1 (4 micro-steps), alpha = 0. Every proposal is
        // strategy 0 with threshold 1, which every cell already holds.
        //
        // step 0: i=(0,0) + (+1,+1) -> j=(1,1)
        // step 1: i=(0,1) + (-1, 0) -> j=(1,1)
        // step 2: i=(1,0) + ( 0,-1) -> j=(1,1)
        // step 3: i=(1,1) + (+1,-1) -> j=(0,0)
        let draws = ScriptedDraws::new(
            [0, 0, 0, 1, 1, 0, 1, 1],
            [1, 1, -1, 0, 0, -1, 1, -1],
            [0.0, 0.5, 0.3, 0.9, 0.7, 0.1, 0.99, 0.0],
        );
        let mut sim = Simulation::with_draws(plan(2, 1, 1, 0.0), draws).unwrap();

        let outcomes: Vec<StepOutcome> = core::iter::from_fn(|| sim.advance()).collect();
        assert_eq!(
            outcomes.iter().map(|o| o.neighbor).collect::<Vec<_>>(),
            vec![Cell::new(1, 1), Cell::new(1, 1), Cell::new(1, 1), Cell::new(0, 0)]
        );
        for outcome in &outcomes {
            assert!((outcome.threshold - 1.0).abs() < f64::EPSILON);
            assert_eq!(outcome.adopted, None);
            assert_eq!(outcome.mutation, None);
        }

        let state = sim.state();
        assert!(state.lattice().cells().iter().all(|&s| s == StrategyId::INITIAL));
        assert!(state.history().iter().all(|h| *h == ids(&[0])));
        assert_eq!(state.next_strategy(), StrategyId::new(1));
        assert!(state.verify().is_ok());
    }

    #[test]
    fn neighbor_wraps_around_the_torus() {
        // i=(0,0), offsets (-1,-1) -> j=(1,1) on a 2x2 grid.
        let draws = ScriptedDraws::new([0, 0], [-1, -1], [0.9, 0.9]);
        let mut sim = Simulation::with_draws(plan(2, 1, 1, 0.0), draws).unwrap();
        let outcome = sim.advance().unwrap();
        assert_eq!(outcome.source, Cell::new(0, 0));
        assert_eq!(outcome.neighbor, Cell::new(1, 1));
    }

    #[test]
    fn invariants_hold_after_every_step() {
        let mut sim = Simulation::seeded(plan(5, 40, 10, 0.05)).unwrap();
        let mut previous_sizes: Vec<usize> = vec![1; 25];
        while let Some(outcome) = sim.advance() {
            let state = sim.state();
            assert!(state.verify().is_ok(), "step {}", sim.current_step());
            let sizes: Vec<usize> = (0..25).map(|i| state.history().len_of(i)).collect();
            assert!(sizes.iter().zip(&previous_sizes).all(|(now, before)| now >= before));
            previous_sizes = sizes;
            if let Some(mutation) = outcome.mutation {
                assert_eq!(
                    mutation.strategy.next(),
                    Some(state.next_strategy()),
                    "mutation must mint the latest id"
                );
            }
        }
        assert!(sim.is_finished());
        assert!(sim.state().next_strategy() > StrategyId::new(1));
    }
}
