//! Square lattices in two and three dimensions.
//!
//! [`SquareLattice`] implements the DLCA diffusion rule on top of any
//! [`Geometry`]:
//! - a cluster translates rigidly by one unit step, drawn uniformly from the
//!   `2 * DIM` axis directions;
//! - a cluster already touching another cluster stays put and reports it;
//! - the move is rejected if a target cell leaves a closed box or holds a
//!   particle of another cluster;
//! - moved or not, the cluster then reports every foreign cluster found on
//!   a cell adjacent to one of its particles.

use std::{collections::VecDeque, fmt, ops::Add};

use glam::{IVec2, IVec3};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};

use crate::{
    config::{Boundary, Config, StepPolicy},
    error::ConfigError,
    lattice::Lattice,
    state::ClusterState,
    types::{Label, Pid, Site},
};

/// Maps between flattened sites and integer lattice points.
pub trait Geometry {
    type Point: Copy + fmt::Debug + PartialEq + Add<Output = Self::Point> + 'static;

    /// Number of axes.
    const DIM: u32;

    /// Creates a cube with `extent` sites per axis.
    ///
    /// ### Panics
    /// Panics if `extent` is zero or `extent^DIM` does not fit in `usize`.
    fn with_extent(extent: u32) -> Self;

    fn extent(&self) -> u32;

    fn num_cells(&self) -> usize;

    /// The `2 * DIM` unit steps along the axes.
    fn steps(&self) -> &'static [Self::Point];

    fn point(&self, site: Site) -> Self::Point;

    /// Site of `p` after applying `boundary`, or `None` when `p` lies
    /// outside a closed box.
    fn site(&self, p: Self::Point, boundary: Boundary) -> Option<Site>;

    /// Writes the coordinates of `p` separated by single spaces.
    fn write_point(&self, f: &mut fmt::Formatter<'_>, p: Self::Point) -> fmt::Result;
}

/// Brings one coordinate back into `0..extent`.
#[inline]
fn resolve_axis(v: i32, extent: i32, boundary: Boundary) -> Option<i32> {
    match boundary {
        Boundary::Periodic => Some(v.rem_euclid(extent)),
        Boundary::Closed => (0..extent).contains(&v).then_some(v),
    }
}

/// Number of cells of a `dim`-dimensional cube with `extent` sites per axis.
fn checked_cells(extent: u32, dim: u32) -> usize {
    assert!(
        extent > 0 && extent <= i32::MAX as u32,
        "invalid lattice extent {extent}"
    );
    match (extent as usize).checked_pow(dim) {
        Some(cells) => cells,
        None => panic!("lattice extent {extent} is too large for {dim} dimensions"),
    }
}

/// Two-dimensional square lattice, `site = x + L * y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square2 {
    extent: i32,
    cells: usize,
}

const STEPS_2D: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];

impl Geometry for Square2 {
    type Point = IVec2;
    const DIM: u32 = 2;

    fn with_extent(extent: u32) -> Self {
        let cells = checked_cells(extent, Self::DIM);
        Self {
            extent: extent as i32,
            cells,
        }
    }

    fn extent(&self) -> u32 {
        self.extent as u32
    }

    fn num_cells(&self) -> usize {
        self.cells
    }

    fn steps(&self) -> &'static [IVec2] {
        &STEPS_2D
    }

    fn point(&self, site: Site) -> IVec2 {
        let l = self.extent as usize;
        IVec2::new((site % l) as i32, (site / l) as i32)
    }

    fn site(&self, p: IVec2, boundary: Boundary) -> Option<Site> {
        let x = resolve_axis(p.x, self.extent, boundary)?;
        let y = resolve_axis(p.y, self.extent, boundary)?;
        let l = self.extent as usize;
        Some(x as usize + l * y as usize)
    }

    fn write_point(&self, f: &mut fmt::Formatter<'_>, p: IVec2) -> fmt::Result {
        write!(f, "{} {}", p.x, p.y)
    }
}

/// Three-dimensional cubic lattice, `site = x + L * y + L * L * z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Square3 {
    extent: i32,
    cells: usize,
}

const STEPS_3D: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

impl Geometry for Square3 {
    type Point = IVec3;
    const DIM: u32 = 3;

    fn with_extent(extent: u32) -> Self {
        let cells = checked_cells(extent, Self::DIM);
        Self {
            extent: extent as i32,
            cells,
        }
    }

    fn extent(&self) -> u32 {
        self.extent as u32
    }

    fn num_cells(&self) -> usize {
        self.cells
    }

    fn steps(&self) -> &'static [IVec3] {
        &STEPS_3D
    }

    fn point(&self, site: Site) -> IVec3 {
        let l = self.extent as usize;
        IVec3::new(
            (site % l) as i32,
            (site / l % l) as i32,
            (site / (l * l)) as i32,
        )
    }

    fn site(&self, p: IVec3, boundary: Boundary) -> Option<Site> {
        let x = resolve_axis(p.x, self.extent, boundary)?;
        let y = resolve_axis(p.y, self.extent, boundary)?;
        let z = resolve_axis(p.z, self.extent, boundary)?;
        let l = self.extent as usize;
        Some(x as usize + l * (y as usize + l * z as usize))
    }

    fn write_point(&self, f: &mut fmt::Formatter<'_>, p: IVec3) -> fmt::Result {
        write!(f, "{} {} {}", p.x, p.y, p.z)
    }
}

/// DLCA motion on a square lattice of any dimension.
#[derive(Debug, Clone)]
pub struct SquareLattice<G: Geometry, R: Rng = StdRng> {
    geometry: G,
    boundary: Boundary,
    policy: StepPolicy,
    rng: R,
    /// Queued `(label, step)` moves, played before any random move.
    script: VecDeque<(Label, G::Point)>,
    members: Vec<Pid>,
    moves: Vec<(Pid, Site)>,
}

impl<G: Geometry, R: Rng> SquareLattice<G, R> {
    /// Creates a lattice with an empty move script.
    ///
    /// ### Parameters
    /// - `geometry` - Shape and size of the box.
    /// - `boundary` - Behaviour at the box faces.
    /// - `policy` - Which clusters move each step.
    /// - `rng` - Source of all randomness of the lattice.
    pub fn new(geometry: G, boundary: Boundary, policy: StepPolicy, rng: R) -> Self {
        Self {
            geometry,
            boundary,
            policy,
            rng,
            script: VecDeque::new(),
            members: Vec::new(),
            moves: Vec::new(),
        }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn policy(&self) -> StepPolicy {
        self.policy
    }

    /// Queues a deterministic move of cluster `label` by `step`.
    ///
    /// While the queue is non-empty, each step moves exactly the cluster at
    /// its front, whatever the [`StepPolicy`]. `step` need not be a unit
    /// step; a zero vector keeps the cluster in place.
    pub fn push_script(&mut self, label: Label, step: G::Point) {
        self.script.push_back((label, step));
    }

    /// Number of scripted moves not yet played.
    pub fn script_len(&self) -> usize {
        self.script.len()
    }

    /// Labels of the foreign clusters adjacent to cluster `label`, each
    /// reported once, in discovery order.
    pub fn contacts(&mut self, label: Label, state: &mut ClusterState) -> Vec<Label> {
        self.members.clear();
        self.members.extend(state.members(label));

        let mut partners = Vec::new();
        for &pid in &self.members {
            let here = self.geometry.point(state.site_of(pid));
            for &step in self.geometry.steps() {
                let Some(site) = self.geometry.site(here + step, self.boundary) else {
                    continue;
                };
                if let Some(other) = state.label_at(site)
                    && other != label
                    && !partners.contains(&other)
                {
                    partners.push(other);
                }
            }
        }
        partners
    }

    /// Translates cluster `label` by `step` if every target cell is free.
    /// Returns whether the cluster moved.
    fn translate(&mut self, label: Label, step: G::Point, state: &mut ClusterState) -> bool {
        self.members.clear();
        self.members.extend(state.members(label));
        self.moves.clear();

        for &pid in &self.members {
            let target = self.geometry.point(state.site_of(pid)) + step;
            match self.geometry.site(target, self.boundary) {
                Some(site) if state.label_at(site).is_none_or(|l| l == label) => {
                    self.moves.push((pid, site));
                }
                _ => return false,
            }
        }
        state.relocate(&self.moves);
        true
    }
}

impl<G: Geometry> SquareLattice<G, StdRng> {
    /// Builds a lattice from `cfg`, seeding the generator from `cfg.seed`
    /// or from the OS.
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if cfg.dim != G::DIM {
            return Err(ConfigError::UnsupportedDimension(cfg.dim));
        }
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self::new(
            G::with_extent(cfg.extent),
            cfg.boundary,
            cfg.policy,
            rng,
        ))
    }
}

impl<G: Geometry, R: Rng> Lattice for SquareLattice<G, R> {
    fn num_cells(&self) -> usize {
        self.geometry.num_cells()
    }

    fn initial_sites(&mut self, n: usize) -> Vec<Site> {
        index::sample(&mut self.rng, self.geometry.num_cells(), n).into_vec()
    }

    fn schedule(&mut self, labels: &[Label], out: &mut Vec<Label>) {
        if let Some(&(label, _)) = self.script.front() {
            out.push(label);
            return;
        }
        match self.policy {
            StepPolicy::RandomCluster => {
                if !labels.is_empty() {
                    out.push(labels[self.rng.random_range(0..labels.len())]);
                }
            }
            StepPolicy::AllClusters => {
                let start = out.len();
                out.extend_from_slice(labels);
                out[start..].sort_unstable();
            }
        }
    }

    fn diffuse(&mut self, label: Label, state: &mut ClusterState) -> Vec<Label> {
        let step = match self.script.front() {
            Some(&(scripted, step)) if scripted == label => {
                self.script.pop_front();
                step
            }
            _ => {
                let steps = self.geometry.steps();
                steps[self.rng.random_range(0..steps.len())]
            }
        };
        let touching = self.contacts(label, state);
        if !touching.is_empty() {
            return touching;
        }
        self.translate(label, step, state);
        self.contacts(label, state)
    }

    fn print_particle(&self, f: &mut fmt::Formatter<'_>, site: Site) -> fmt::Result {
        self.geometry.write_point(f, self.geometry.point(site))
    }
}
