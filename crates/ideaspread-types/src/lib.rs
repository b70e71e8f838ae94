//! Shared type definitions for the idea-spreading lattice simulation.
//!
//! Every crate in the workspace speaks in these types: the engine mutates a
//! [`Lattice`], freezes copies of it into [`Snapshot`]s, and hands a finished
//! [`ResultBundle`] to whatever serializes or analyses it.
//!
//! # Modules
//!
//! - [`ids`] -- [`StrategyId`] and [`Cell`] coordinates
//! - [`lattice`] -- Flat row-major toroidal grid of strategy identifiers
//! - [`structs`] -- Run configuration, snapshots, and the result bundle

pub mod ids;
pub mod lattice;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::{Cell, StrategyId};
pub use lattice::{Lattice, LatticeShapeError};
pub use structs::{ResultBundle, RunConfig, Snapshot};
