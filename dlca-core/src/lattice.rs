use std::fmt;

use crate::{
    state::ClusterState,
    types::{Label, Site},
};

/// Geometry and motion rules plugged into a [`crate::engine::Dlca`].
///
/// The engine owns the cluster bookkeeping; a `Lattice` decides where
/// particles start, which clusters move, how they move and when they touch.
pub trait Lattice {
    /// Number of cells in the lattice. Sites range over `0..num_cells()`.
    fn num_cells(&self) -> usize;

    /// Returns `n` distinct sites for the initial particles.
    fn initial_sites(&mut self, n: usize) -> Vec<Site>;

    /// Pushes onto `out` the labels that move during this step.
    ///
    /// `labels` is the current surviving set in no particular order. Every
    /// pushed label must be in it.
    fn schedule(&mut self, labels: &[Label], out: &mut Vec<Label>);

    /// Moves cluster `label` by one lattice step.
    ///
    /// Returns the labels of the other clusters the cluster is in contact
    /// with afterwards, or an empty `Vec` when it touches nothing. The
    /// engine merges them in order. Reporting `label` itself, or a label
    /// that is not surviving, is a contract violation.
    fn diffuse(&mut self, label: Label, state: &mut ClusterState) -> Vec<Label>;

    /// Writes the particle at `site`, without a trailing newline.
    fn print_particle(&self, f: &mut fmt::Formatter<'_>, site: Site) -> fmt::Result;
}

impl<L: Lattice + ?Sized> Lattice for Box<L> {
    fn num_cells(&self) -> usize {
        (**self).num_cells()
    }

    fn initial_sites(&mut self, n: usize) -> Vec<Site> {
        (**self).initial_sites(n)
    }

    fn schedule(&mut self, labels: &[Label], out: &mut Vec<Label>) {
        (**self).schedule(labels, out)
    }

    fn diffuse(&mut self, label: Label, state: &mut ClusterState) -> Vec<Label> {
        (**self).diffuse(label, state)
    }

    fn print_particle(&self, f: &mut fmt::Formatter<'_>, site: Site) -> fmt::Result {
        (**self).print_particle(f, site)
    }
}
