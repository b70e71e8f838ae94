//! Stochastic update engine and run orchestration for the idea-spreading
//! lattice simulation (the Bornholdt–Sneppen model).
//!
//! Cells on a toroidal grid hold strategy identifiers. Each micro-step a
//! random cell may imitate a random neighbour with probability equal to the
//! neighbour strategy's share of the grid, provided it has never held that
//! strategy before; rare mutations inject brand-new strategies. The run
//! records full-grid snapshots at a fixed cadence.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `ideaspread-config.yaml` into
//!   strongly-typed structs.
//! - [`draws`] -- [`DrawSource`] trait, [`SeededDraws`], and
//!   [`ScriptedDraws`].
//! - [`engine`] -- [`SimulationState`], the micro-step rule, and
//!   [`Simulation`].
//! - [`history`] -- Per-cell strategy histories (anti-cycling rule).
//! - [`population`] -- Running per-strategy cell counts.
//! - [`runner`] -- Single and batch runs with snapshot callbacks.
//! - [`sampling`] -- Evenly spread snapshot selection.
//! - [`schedule`] -- Snapshot cadence.
//!
//! [`DrawSource`]: draws::DrawSource
//! [`SeededDraws`]: draws::SeededDraws
//! [`ScriptedDraws`]: draws::ScriptedDraws
//! [`SimulationState`]: engine::SimulationState
//! [`Simulation`]: engine::Simulation

pub mod config;
pub mod draws;
pub mod engine;
pub mod history;
pub mod population;
pub mod runner;
pub mod sampling;
pub mod schedule;
