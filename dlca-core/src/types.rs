/// Identifier for a particle.
///
/// Particles are numbered `0..n` when a [`crate::engine::Dlca`] is built and
/// keep their id for the lifetime of the simulation.
pub type Pid = usize;

/// Label of a cluster: the [`Pid`] of its union-find representative.
///
/// Only meaningful while the label is still in the surviving-labels set.
pub type Label = Pid;

/// Flattened lattice coordinate, an index into [`crate::grid::Grid`].
///
/// The flattening scheme is owned by the [`crate::lattice::Lattice`]
/// implementation.
pub type Site = usize;
