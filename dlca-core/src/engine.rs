//! The aggregation engine.
//!
//! One call to [`Dlca::evolve`] is one time step:
//! 1. the step counter is incremented,
//! 2. the [`Lattice`] schedules the clusters that move,
//! 3. each scheduled cluster still alive is diffused by the lattice,
//! 4. every contact it reports is merged through [`Dlca::unite_and_splice`].
//!
//! The engine is Running while more than one cluster survives and
//! Converged once a single cluster holds every particle. It never stops on
//! its own; the driver decides how long to call `evolve`.

use std::{fmt, io};

use log::{info, trace};

use crate::{
    error::DlcaError,
    lattice::Lattice,
    registry::Members,
    state::ClusterState,
    types::{Label, Pid, Site},
};

pub struct Dlca<L: Lattice> {
    lattice: L,
    state: ClusterState,
    counter: u64,
    /// Scratch list reused by `evolve`.
    movers: Vec<Label>,
    /// `moved_at[label]` is the last step in which cluster `label` moved.
    moved_at: Vec<u64>,
}

impl<L: Lattice> Dlca<L> {
    /// Builds a simulation of `n` particles at sites chosen by `lattice`.
    ///
    /// ### Parameters
    /// - `lattice` - Geometry and diffusion rule of the run.
    /// - `n` - Number of particles, each starting as its own cluster.
    ///
    /// ### Returns
    /// The simulation at step 0, or a [`DlcaError`] if `n` is zero, does not
    /// fit on the lattice, or the lattice hands back an invalid placement.
    pub fn new(mut lattice: L, n: usize) -> Result<Self, DlcaError> {
        if n == 0 {
            return Err(DlcaError::NoParticles);
        }
        let cells = lattice.num_cells();
        if n > cells {
            return Err(DlcaError::TooManyParticles {
                particles: n,
                cells,
            });
        }
        let sites = lattice.initial_sites(n);
        if sites.len() != n {
            return Err(DlcaError::SiteCountMismatch {
                expected: n,
                got: sites.len(),
            });
        }
        Self::with_sites(lattice, sites)
    }

    /// Builds a simulation with particle `i` on `sites[i]`.
    ///
    /// ### Parameters
    /// - `lattice` - Geometry and diffusion rule of the run.
    /// - `sites` - Starting site of every particle; must be distinct and
    ///   below `lattice.num_cells()`.
    ///
    /// ### Returns
    /// The simulation at step 0, or a [`DlcaError`] describing the first
    /// bad site.
    pub fn with_sites(lattice: L, sites: Vec<Site>) -> Result<Self, DlcaError> {
        if sites.is_empty() {
            return Err(DlcaError::NoParticles);
        }
        let cells = lattice.num_cells();
        if sites.len() > cells {
            return Err(DlcaError::TooManyParticles {
                particles: sites.len(),
                cells,
            });
        }

        let mut seen = vec![false; cells];
        for &site in &sites {
            let Some(taken) = seen.get_mut(site) else {
                return Err(DlcaError::SiteOutOfRange { site, cells });
            };
            if *taken {
                return Err(DlcaError::DuplicateSite { site });
            }
            *taken = true;
        }

        info!("placed {} particles on {cells} cells", sites.len());
        let n = sites.len();
        Ok(Self {
            lattice,
            state: ClusterState::new(cells, sites),
            counter: 0,
            movers: Vec::new(),
            moved_at: vec![0; n],
        })
    }

    /// Advances the simulation by one step.
    ///
    /// A scheduled cluster is skipped when an earlier mover of the same step
    /// was merged into it, so no particle moves twice in one step.
    ///
    /// ### Panics
    /// Panics if the lattice schedules a retired label or reports an
    /// invalid contact.
    pub fn evolve(&mut self) {
        self.counter += 1;

        let mut movers = std::mem::take(&mut self.movers);
        movers.clear();
        self.lattice.schedule(self.state.labels(), &mut movers);
        for &label in &movers {
            assert!(
                self.state.is_alive(label),
                "lattice scheduled retired cluster {label}"
            );
        }

        for &label in &movers {
            // Retired, or merged with a cluster that already moved this step.
            if !self.state.is_alive(label) || self.moved_at[label] == self.counter {
                continue;
            }
            let survivor = self.diffuse(label);
            self.moved_at[survivor] = self.counter;
        }
        self.movers = movers;

        trace!(
            "step {} done, {} clusters",
            self.counter,
            self.state.num_clusters()
        );
    }

    /// Calls [`Dlca::evolve`] `steps` times.
    ///
    /// ### Parameters
    /// - `steps` - Number of steps to take, converged or not.
    pub fn evolve_n(&mut self, steps: u64) {
        for _ in 0..steps {
            self.evolve();
        }
    }

    /// Evolves until at most `target` clusters remain or `max_steps` steps
    /// have been taken.
    ///
    /// ### Parameters
    /// - `target` - Cluster count to stop at; `1` runs to convergence.
    /// - `max_steps` - Upper bound on the steps taken by this call.
    ///
    /// ### Returns
    /// The number of steps taken by this call.
    pub fn run_until(&mut self, target: usize, max_steps: u64) -> u64 {
        let start = self.counter;
        while self.num_clusters() > target && self.counter - start < max_steps {
            self.evolve();
        }
        self.counter - start
    }

    /// Diffuses `label`, merges every reported contact and returns the
    /// label of the resulting cluster.
    fn diffuse(&mut self, label: Label) -> Label {
        let partners = self.lattice.diffuse(label, &mut self.state);
        for &partner in &partners {
            assert_ne!(partner, label, "cluster {label} reported contact with itself");
            assert!(
                self.state.is_alive(partner),
                "cluster {label} reported contact with retired cluster {partner}"
            );
        }

        let mut current = label;
        for partner in partners {
            let partner = self.state.find(partner);
            if partner != current {
                current = self.unite_and_splice(current, partner);
            }
        }
        current
    }

    /// Merges clusters `a` and `b`.
    ///
    /// Reduces [`Dlca::num_clusters`] by exactly one; the survivor holds
    /// the particles of both.
    ///
    /// ### Parameters
    /// - `a`, `b` - Distinct surviving labels. On equal sizes `a` survives.
    ///
    /// ### Returns
    /// The surviving label, either `a` or `b`.
    ///
    /// ### Panics
    /// Panics if `a == b` or either label is not surviving.
    pub fn unite_and_splice(&mut self, a: Label, b: Label) -> Label {
        self.state.unite_and_splice(a, b)
    }

    /// Number of steps taken so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Number of surviving clusters.
    pub fn num_clusters(&self) -> usize {
        self.state.num_clusters()
    }

    /// Returns `true` once a single cluster holds every particle.
    pub fn is_converged(&self) -> bool {
        self.state.num_clusters() == 1
    }

    /// Number of particles.
    pub fn n(&self) -> usize {
        self.state.n()
    }

    /// Label of the cluster containing `pid`.
    pub fn find(&mut self, pid: Pid) -> Label {
        self.state.find(pid)
    }

    /// Surviving labels, in no particular order.
    pub fn labels(&self) -> &[Label] {
        self.state.labels()
    }

    /// Number of particles in cluster `label`.
    pub fn cluster_size(&self, label: Label) -> usize {
        self.state.cluster_size(label)
    }

    /// Particles of cluster `label`.
    pub fn members(&self, label: Label) -> Members<'_> {
        self.state.members(label)
    }

    /// Site currently occupied by `pid`.
    pub fn site_of(&self, pid: Pid) -> Site {
        self.state.site_of(pid)
    }

    /// Read-only view of grid, forest and registry.
    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// The lattice driving diffusion.
    pub fn lattice(&self) -> &L {
        &self.lattice
    }

    pub fn lattice_mut(&mut self) -> &mut L {
        &mut self.lattice
    }

    /// Cluster sizes, largest first.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self
            .labels()
            .iter()
            .map(|&label| self.cluster_size(label))
            .collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    /// Size of the largest cluster.
    pub fn largest_cluster(&self) -> usize {
        self.labels()
            .iter()
            .map(|&label| self.cluster_size(label))
            .max()
            .unwrap_or(0)
    }

    /// Writes a `#` header line followed by every particle, see the
    /// [`fmt::Display`] impl.
    ///
    /// ### Parameters
    /// - `out` - Destination of the dump.
    ///
    /// ### Returns
    /// Any I/O error raised by `out`.
    pub fn visualize(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(
            out,
            "# step {} clusters {} particles {}",
            self.counter,
            self.num_clusters(),
            self.n()
        )?;
        write!(out, "{self}")
    }
}

/// One particle per line, rendered by [`Lattice::print_particle`];
/// clusters are separated by a blank line.
impl<L: Lattice> fmt::Display for Dlca<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &label) in self.labels().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for pid in self.members(label) {
                self.lattice.print_particle(f, self.site_of(pid))?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl<L: Lattice> fmt::Debug for Dlca<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dlca")
            .field("counter", &self.counter)
            .field("n", &self.n())
            .field("num_clusters", &self.num_clusters())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// A closed 1-D strip. Each scheduled cluster is shifted by the next
    /// scripted offset; contacts are left and right neighbours.
    struct Strip {
        cells: usize,
        script: VecDeque<isize>,
        all: bool,
        /// Scheduled instead of the real labels when set.
        bogus_mover: Option<Label>,
        /// Reported instead of the real contacts when set.
        bogus_contact: Option<Label>,
    }

    impl Strip {
        fn new(cells: usize, script: &[isize]) -> Self {
            Self {
                cells,
                script: script.iter().copied().collect(),
                all: false,
                bogus_mover: None,
                bogus_contact: None,
            }
        }
    }

    impl Lattice for Strip {
        fn num_cells(&self) -> usize {
            self.cells
        }

        fn initial_sites(&mut self, n: usize) -> Vec<Site> {
            (0..n).map(|i| i * 2).collect()
        }

        fn schedule(&mut self, labels: &[Label], out: &mut Vec<Label>) {
            if let Some(label) = self.bogus_mover {
                out.push(label);
                return;
            }
            let mut sorted = labels.to_vec();
            sorted.sort_unstable();
            if self.all {
                out.extend(sorted);
            } else {
                out.push(sorted[0]);
            }
        }

        fn diffuse(&mut self, label: Label, state: &mut ClusterState) -> Vec<Label> {
            if let Some(other) = self.bogus_contact {
                return vec![other];
            }
            let step = self.script.pop_front().unwrap_or(0);
            let members: Vec<Pid> = state.members(label).collect();
            let moves: Vec<(Pid, Site)> = members
                .iter()
                .map(|&p| (p, state.site_of(p).saturating_add_signed(step)))
                .collect();
            let free = moves.iter().all(|&(_, s)| {
                s < self.cells && state.label_at(s).is_none_or(|l| l == label)
            });
            if free {
                state.relocate(&moves);
            }

            let mut partners = Vec::new();
            for &p in &members {
                let site = state.site_of(p);
                for nb in [site.wrapping_sub(1), site + 1] {
                    if nb >= self.cells {
                        continue;
                    }
                    if let Some(other) = state.label_at(nb)
                        && other != label
                        && !partners.contains(&other)
                    {
                        partners.push(other);
                    }
                }
            }
            partners
        }

        fn print_particle(&self, f: &mut fmt::Formatter<'_>, site: Site) -> fmt::Result {
            write!(f, "{site}")
        }
    }

    #[test]
    fn new_places_one_particle_per_cluster() {
        let dlca = Dlca::new(Strip::new(10, &[]), 4).unwrap();

        assert_eq!(dlca.n(), 4);
        assert_eq!(dlca.num_clusters(), 4);
        assert_eq!(dlca.counter(), 0);
        assert!(!dlca.is_converged());
        dlca.state().assert_consistent();
    }

    #[test]
    fn new_rejects_bad_input() {
        assert_eq!(
            Dlca::new(Strip::new(4, &[]), 0).unwrap_err(),
            DlcaError::NoParticles
        );
        assert_eq!(
            Dlca::new(Strip::new(4, &[]), 5).unwrap_err(),
            DlcaError::TooManyParticles {
                particles: 5,
                cells: 4
            }
        );
        assert_eq!(
            Dlca::with_sites(Strip::new(4, &[]), vec![1, 1]).unwrap_err(),
            DlcaError::DuplicateSite { site: 1 }
        );
        assert_eq!(
            Dlca::with_sites(Strip::new(4, &[]), vec![0, 4]).unwrap_err(),
            DlcaError::SiteOutOfRange { site: 4, cells: 4 }
        );
    }

    #[test]
    fn evolve_counts_every_step() {
        // Particles at 0, 4, 8; the leftmost one bounces without touching.
        let mut dlca = Dlca::with_sites(Strip::new(10, &[1, -1, 1, -1]), vec![0, 4, 8]).unwrap();

        for k in 1..=4 {
            dlca.evolve();
            assert_eq!(dlca.counter(), k);
            assert_eq!(dlca.num_clusters(), 3);
        }
        dlca.state().assert_consistent();
    }

    #[test]
    fn contact_merges_clusters() {
        // 0 at site 0, 1 at site 3: moving 0 right twice makes them touch.
        let mut dlca = Dlca::with_sites(Strip::new(6, &[1, 1]), vec![0, 3]).unwrap();

        dlca.evolve();
        assert_eq!(dlca.num_clusters(), 2);

        dlca.evolve();
        assert_eq!(dlca.num_clusters(), 1);
        assert!(dlca.is_converged());
        assert_eq!(dlca.counter(), 2);

        let label = dlca.find(0);
        assert_eq!(dlca.find(1), label);
        assert_eq!(dlca.cluster_size(label), 2);
        dlca.state().assert_consistent();
    }

    #[test]
    fn one_move_can_merge_several_clusters() {
        // Particle 0 sits between 1 and 2 and reports both as contacts.
        let mut dlca = Dlca::with_sites(Strip::new(8, &[0]), vec![2, 1, 3]).unwrap();
        dlca.evolve();
        assert_eq!(dlca.num_clusters(), 1);
        assert_eq!(dlca.cluster_size(dlca.labels()[0]), 3);
        dlca.state().assert_consistent();
    }

    #[test]
    fn all_clusters_policy_skips_absorbed_movers() {
        let mut strip = Strip::new(8, &[1, 0, 0]);
        strip.all = true;
        // Particle 0 moves into contact with 1; label 1 is then retired and
        // must not be diffused in the same step.
        let mut dlca = Dlca::with_sites(strip, vec![0, 2, 6]).unwrap();
        dlca.evolve();

        assert_eq!(dlca.num_clusters(), 2);
        assert_eq!(dlca.counter(), 1);
        dlca.state().assert_consistent();
    }

    #[test]
    fn all_clusters_policy_moves_each_particle_once_per_step() {
        let mut strip = Strip::new(10, &[2, 5]);
        strip.all = true;
        // Particle 0 at 0, the pair {1, 2} at 3 and 4. Particle 0 moves to 2
        // and is absorbed by the larger pair, which must then stay put.
        let mut dlca = Dlca::with_sites(strip, vec![0, 3, 4]).unwrap();
        let pair = dlca.unite_and_splice(1, 2);
        assert_eq!(pair, 1);

        dlca.evolve();

        assert!(dlca.is_converged());
        assert_eq!(dlca.find(0), pair);
        assert_eq!(dlca.site_of(0), 2);
        assert_eq!(dlca.site_of(1), 3);
        assert_eq!(dlca.site_of(2), 4);
        assert_eq!(dlca.lattice().script, VecDeque::from([5]));
        dlca.state().assert_consistent();
    }

    #[test]
    #[should_panic(expected = "lattice scheduled retired cluster 1")]
    fn scheduling_retired_cluster_panics() {
        let mut dlca = Dlca::with_sites(Strip::new(10, &[]), vec![0, 5]).unwrap();
        assert_eq!(dlca.unite_and_splice(0, 1), 0);
        dlca.lattice_mut().bogus_mover = Some(1);
        dlca.evolve();
    }

    #[test]
    #[should_panic(expected = "reported contact with itself")]
    fn contact_with_itself_panics() {
        let mut dlca = Dlca::with_sites(Strip::new(10, &[]), vec![0, 5]).unwrap();
        dlca.lattice_mut().bogus_contact = Some(0);
        dlca.evolve();
    }

    #[test]
    #[should_panic(expected = "reported contact with retired cluster 2")]
    fn contact_with_retired_cluster_panics() {
        let mut dlca = Dlca::with_sites(Strip::new(10, &[]), vec![0, 5, 8]).unwrap();
        assert_eq!(dlca.unite_and_splice(1, 2), 1);
        dlca.lattice_mut().bogus_contact = Some(2);
        dlca.evolve();
    }

    #[test]
    fn run_until_stops_at_target() {
        let mut dlca = Dlca::with_sites(Strip::new(6, &[1, 1, 1, 1]), vec![0, 3]).unwrap();

        let taken = dlca.run_until(1, 100);

        assert_eq!(taken, 2);
        assert!(dlca.is_converged());
        assert_eq!(dlca.run_until(1, 100), 0);
    }

    #[test]
    fn run_until_respects_step_limit() {
        let mut dlca = Dlca::with_sites(Strip::new(10, &[]), vec![0, 5]).unwrap();

        assert_eq!(dlca.run_until(1, 7), 7);
        assert_eq!(dlca.counter(), 7);
        assert_eq!(dlca.num_clusters(), 2);
    }

    #[test]
    fn unite_and_splice_reduces_count_by_one() {
        let mut dlca = Dlca::new(Strip::new(10, &[]), 5).unwrap();
        let before = dlca.num_clusters();
        let (sa, sb) = (dlca.cluster_size(1), dlca.cluster_size(3));

        let survivor = dlca.unite_and_splice(1, 3);

        assert_eq!(dlca.num_clusters(), before - 1);
        assert_eq!(dlca.cluster_size(survivor), sa + sb);
        assert_eq!(dlca.cluster_sizes(), vec![2, 1, 1, 1]);
        assert_eq!(dlca.largest_cluster(), 2);
    }

    #[test]
    #[should_panic(expected = "with itself")]
    fn unite_with_itself_panics() {
        let mut dlca = Dlca::new(Strip::new(10, &[]), 3).unwrap();
        dlca.unite_and_splice(2, 2);
    }

    #[test]
    fn display_lists_every_particle() {
        let mut dlca = Dlca::with_sites(Strip::new(10, &[]), vec![0, 5, 9]).unwrap();
        dlca.unite_and_splice(0, 1);

        let text = dlca.to_string();
        let mut sites: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        sites.sort_unstable();
        assert_eq!(sites, vec!["0", "5", "9"]);
        // Two clusters, one separator.
        assert_eq!(text.lines().filter(|l| l.is_empty()).count(), 1);

        let mut out = Vec::new();
        dlca.visualize(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("# step 0 clusters 2 particles 3\n"));
    }
}
