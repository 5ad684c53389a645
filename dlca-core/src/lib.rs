//! Diffusion-limited cluster aggregation on discrete lattices.
//!
//! Main components:
//! - [`grid`] — site occupancy table.
//! - [`forest`] — union-find forest resolving a particle to its cluster label.
//! - [`registry`] — per-cluster particle lists and the surviving labels.
//! - [`state`] — the three structures above, kept consistent.
//! - [`engine`] — the step loop and cluster merging.
//! - [`lattice`] — the geometry/motion interface the engine is driven by.
//! - [`square`] — 2-D and 3-D square lattices implementing [`lattice::Lattice`].
//! - [`config`] — run configuration.
//! - [`error`] — construction and configuration errors.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod engine;
pub mod error;
pub mod forest;
pub mod grid;
pub mod lattice;
pub mod registry;
pub mod square;
pub mod state;
pub mod types;

pub use config::{Boundary, Config, StepPolicy};
pub use engine::Dlca;
pub use error::{ConfigError, DlcaError};
pub use lattice::Lattice;
pub use square::{Geometry, Square2, Square3, SquareLattice};
pub use types::{Label, Pid, Site};
