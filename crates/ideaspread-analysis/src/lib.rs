//! Statistics over the snapshot series of finished runs.
//!
//! Everything here is a pure function of a [`ResultBundle`] (or a single
//! [`Lattice`]); nothing feeds back into the engine.
//!
//! # Modules
//!
//! - [`counts`] -- Distinct-strategy counts and per-strategy grid shares
//!   over time.
//! - [`dominance`] -- Dominant strategy per snapshot, domain durations, and
//!   waiting times between changes of the dominant strategy.
//! - [`sites`] -- How many distinct sites each strategy ever occupied.
//! - [`clusters`] -- Connected same-strategy regions on the torus.
//! - [`survival`] -- Strategy lifetimes and survival curves.
//! - [`summary`] -- One aggregated record per run, for logs and reports.
//!
//! [`ResultBundle`]: ideaspread_types::ResultBundle
//! [`Lattice`]: ideaspread_types::Lattice

pub mod clusters;
pub mod counts;
pub mod dominance;
pub mod sites;
pub mod summary;
pub mod survival;

pub use summary::{BundleSummary, summarize};
