//! The three structures the engine keeps in lock-step: lattice occupancy,
//! union-find membership and the per-cluster particle lists.

use log::{debug, info};

use crate::{
    forest::Forest,
    grid::Grid,
    registry::{Members, Registry},
    types::{Label, Pid, Site},
};

/// Simulation state shared between the engine and its [`crate::lattice::Lattice`].
///
/// A lattice receives `&mut ClusterState` while diffusing. It can read
/// positions, resolve labels and move particles, but merging clusters is
/// reserved to the engine.
#[derive(Debug, Clone)]
pub struct ClusterState {
    grid: Grid,
    forest: Forest,
    registry: Registry,
    /// `positions[pid]` is the site `pid` occupies; inverse of `grid`.
    positions: Vec<Site>,
}

impl ClusterState {
    /// Places particle `i` on `sites[i]`, each in its own cluster.
    ///
    /// The caller has already checked that sites are distinct and in range.
    pub(crate) fn new(cells: usize, sites: Vec<Site>) -> Self {
        let n = sites.len();
        let mut grid = Grid::with_len(cells);
        for (pid, &site) in sites.iter().enumerate() {
            grid.place(site, pid);
        }

        Self {
            grid,
            forest: Forest::with_len(n),
            registry: Registry::singletons(n),
            positions: sites,
        }
    }

    /// Number of particles.
    pub fn n(&self) -> usize {
        self.positions.len()
    }

    /// Lattice occupancy.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Site currently occupied by `pid`.
    #[inline]
    pub fn site_of(&self, pid: Pid) -> Site {
        self.positions[pid]
    }

    /// Label of the cluster containing `pid`.
    #[inline]
    pub fn find(&mut self, pid: Pid) -> Label {
        self.forest.find(pid)
    }

    /// Label of the cluster occupying `site`, if the site is occupied.
    #[inline]
    pub fn label_at(&mut self, site: Site) -> Option<Label> {
        self.grid.occupant(site).map(|pid| self.forest.find(pid))
    }

    /// Surviving labels, in no particular order.
    pub fn labels(&self) -> &[Label] {
        self.registry.labels()
    }

    /// Number of surviving clusters.
    pub fn num_clusters(&self) -> usize {
        self.registry.num_clusters()
    }

    /// Returns `true` if `label` names a surviving cluster.
    pub fn is_alive(&self, label: Label) -> bool {
        self.registry.contains(label)
    }

    /// Number of particles in cluster `label`.
    ///
    /// ### Panics
    /// Panics if `label` is not surviving.
    pub fn cluster_size(&self, label: Label) -> usize {
        self.registry.size(label)
    }

    /// Iterates over the particles of cluster `label`.
    ///
    /// ### Panics
    /// Panics if `label` is not surviving.
    pub fn members(&self, label: Label) -> Members<'_> {
        self.registry.members(label)
    }

    /// Moves each `(pid, site)` pair to its new site in one go.
    ///
    /// ### Parameters
    /// - `moves` - Particles to move and their target sites.
    ///
    /// All listed particles are lifted off the grid before any is put down,
    /// so a rigid translation may move a particle onto a cell another
    /// member is leaving.
    ///
    /// ### Panics
    /// Panics if a target is out of range or still occupied once every
    /// listed particle has been lifted.
    pub fn relocate(&mut self, moves: &[(Pid, Site)]) {
        for &(pid, _) in moves {
            let vacated = self.grid.vacate(self.positions[pid]);
            debug_assert_eq!(vacated, pid);
        }
        for &(pid, site) in moves {
            self.grid.place(site, pid);
            self.positions[pid] = site;
        }
    }

    /// Merges clusters `a` and `b` and returns the surviving label.
    ///
    /// The forest picks the survivor, the registry splices the loser's
    /// particles onto it and retires the loser's label.
    ///
    /// ### Panics
    /// Panics if `a == b` or either label is not surviving.
    pub(crate) fn unite_and_splice(&mut self, a: Label, b: Label) -> Label {
        assert_ne!(a, b, "cannot merge cluster {a} with itself");
        assert!(self.is_alive(a), "cluster {a} is not a surviving label");
        assert!(self.is_alive(b), "cluster {b} is not a surviving label");

        let survivor = self.forest.union(a, b);
        let loser = if survivor == a { b } else { a };
        self.registry.splice(survivor, loser);

        debug!(
            "merged cluster {loser} into {survivor} (size {}), {} clusters left",
            self.registry.size(survivor),
            self.registry.num_clusters()
        );
        if self.registry.num_clusters() == 1 {
            info!("all {} particles joined cluster {survivor}", self.n());
        }
        survivor
    }

    /// Checks that grid, forest and registry agree with each other.
    ///
    /// Runs in O(n + cells). Meant for tests and debug drivers.
    ///
    /// ### Panics
    /// Panics with a description of the first inconsistency found.
    pub fn assert_consistent(&self) {
        let n = self.n();

        // Every particle sits on exactly the cell the position table says.
        assert_eq!(self.grid.occupied_count(), n, "grid holds wrong particle count");
        for (site, pid) in self.grid.occupied() {
            assert!(pid < n, "unknown particle {pid} on site {site}");
            assert_eq!(self.positions[pid], site, "particle {pid} position mismatch");
        }

        // Registry membership matches the forest.
        let mut total = 0;
        for &label in self.registry.labels() {
            assert!(self.forest.is_root(label), "label {label} is not a root");
            let mut size = 0;
            for pid in self.registry.members(label) {
                assert_eq!(
                    self.forest.find_no_compress(pid),
                    label,
                    "particle {pid} listed under {label}"
                );
                size += 1;
            }
            assert_eq!(size, self.forest.size(label), "size mismatch for {label}");
            total += size;
        }
        assert_eq!(total, n, "clusters do not cover every particle");

        // Every root is a surviving label.
        for pid in 0..n {
            let label = self.forest.find_no_compress(pid);
            assert!(self.registry.contains(label), "root {label} not surviving");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_state() -> ClusterState {
        // Four particles on sites 0, 2, 4, 6 of an 8-cell strip.
        ClusterState::new(8, vec![0, 2, 4, 6])
    }

    #[test]
    fn new_places_singletons() {
        let mut state = line_state();

        assert_eq!(state.n(), 4);
        assert_eq!(state.num_clusters(), 4);
        for pid in 0..4 {
            assert_eq!(state.site_of(pid), pid * 2);
            assert_eq!(state.find(pid), pid);
            assert_eq!(state.label_at(pid * 2), Some(pid));
        }
        assert_eq!(state.label_at(1), None);
        state.assert_consistent();
    }

    #[test]
    fn unite_and_splice_sums_sizes() {
        let mut state = line_state();
        let ab = state.unite_and_splice(0, 1);
        let cd = state.unite_and_splice(2, 3);
        let before = state.num_clusters();
        let (sa, sb) = (state.cluster_size(ab), state.cluster_size(cd));

        let all = state.unite_and_splice(ab, cd);

        assert_eq!(state.num_clusters(), before - 1);
        assert_eq!(state.cluster_size(all), sa + sb);
        state.assert_consistent();
    }

    #[test]
    fn relocate_allows_overlapping_translation() {
        let mut state = ClusterState::new(4, vec![0, 1]);
        let label = state.unite_and_splice(0, 1);

        // Shift the pair one cell right: particle 0 lands where 1 was.
        state.relocate(&[(0, 1), (1, 2)]);

        assert_eq!(state.grid().occupant(0), None);
        assert_eq!(state.label_at(1), Some(label));
        assert_eq!(state.label_at(2), Some(label));
        state.assert_consistent();
    }

    #[test]
    #[should_panic(expected = "occupied")]
    fn relocate_onto_foreign_particle_panics() {
        let mut state = line_state();
        state.relocate(&[(0, 2)]);
    }

    #[test]
    #[should_panic(expected = "not a surviving label")]
    fn merging_retired_label_panics() {
        let mut state = line_state();
        let survivor = state.unite_and_splice(0, 1);
        let loser = if survivor == 0 { 1 } else { 0 };
        state.unite_and_splice(loser, 2);
    }
}
