//! Headless DLCA runner.
//!
//! Runs a simulation on a 2-D or 3-D square lattice until the requested
//! number of clusters remains (or a step limit is hit), then dumps every
//! particle's coordinates, one per line. The dump loads directly with
//! `numpy.loadtxt` for scatter plots.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dlca_core::{
    Boundary, Config, Dlca, Geometry, Square2, Square3, SquareLattice, StepPolicy,
};
use log::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BoundaryArg {
    Periodic,
    Closed,
}

impl From<BoundaryArg> for Boundary {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Periodic => Boundary::Periodic,
            BoundaryArg::Closed => Boundary::Closed,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// One random cluster moves per step
    Random,
    /// Every cluster moves once per step
    All,
}

impl From<PolicyArg> for StepPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Random => StepPolicy::RandomCluster,
            PolicyArg::All => StepPolicy::AllClusters,
        }
    }
}

/// CLI arguments for a DLCA run
#[derive(Parser, Debug)]
#[command(author, version, about = "Diffusion-limited cluster aggregation on a square lattice", long_about = None)]
struct Args {
    /// Number of particles (N)
    #[arg(short = 'n', long, default_value_t = 400)]
    particles: usize,

    /// Sites per axis (L)
    #[arg(short = 'l', long, default_value_t = 64)]
    extent: u32,

    /// Lattice dimension, 2 or 3
    #[arg(short = 'd', long, default_value_t = 2)]
    dim: u32,

    #[arg(short = 'b', long, value_enum, default_value_t = BoundaryArg::Periodic)]
    boundary: BoundaryArg,

    #[arg(short = 'p', long, value_enum, default_value_t = PolicyArg::Random)]
    policy: PolicyArg,

    /// Seed for a reproducible run
    #[arg(short = 's', long)]
    seed: Option<u64>,

    /// Stop once this many clusters are left
    #[arg(short = 't', long, default_value_t = 1)]
    target_clusters: usize,

    /// Give up after this many steps
    #[arg(short = 'm', long, default_value_t = 100_000_000)]
    max_steps: u64,

    /// Log progress every this many steps
    #[arg(long, default_value_t = 1_000_000)]
    report_every: u64,

    /// Output file for the particle dump (stdout if absent)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            particles: self.particles,
            extent: self.extent,
            dim: self.dim,
            boundary: self.boundary.into(),
            policy: self.policy.into(),
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = args.config();
    cfg.validate().context("invalid configuration")?;

    match cfg.dim {
        2 => run::<Square2>(&cfg, &args),
        _ => run::<Square3>(&cfg, &args),
    }
}

fn run<G: Geometry>(cfg: &Config, args: &Args) -> Result<()> {
    let lattice = SquareLattice::<G>::from_config(cfg).context("invalid configuration")?;
    let mut dlca = Dlca::new(lattice, cfg.particles).context("cannot place particles")?;
    info!(
        "N = {}, L = {}, dim = {}, {:?} boundary, {:?}",
        cfg.particles, cfg.extent, cfg.dim, cfg.boundary, cfg.policy
    );

    let chunk = args.report_every.max(1);
    while dlca.num_clusters() > args.target_clusters && dlca.counter() < args.max_steps {
        let budget = chunk.min(args.max_steps - dlca.counter());
        dlca.run_until(args.target_clusters, budget);
        info!(
            "step {}: {} clusters, largest {}",
            dlca.counter(),
            dlca.num_clusters(),
            dlca.largest_cluster()
        );
    }

    if dlca.num_clusters() > args.target_clusters {
        warn!(
            "step limit {} reached with {} clusters left",
            args.max_steps,
            dlca.num_clusters()
        );
    } else {
        info!(
            "reached {} clusters after {} steps",
            dlca.num_clusters(),
            dlca.counter()
        );
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            dlca.visualize(&mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            dlca.visualize(&mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}
