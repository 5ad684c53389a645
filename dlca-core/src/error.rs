use thiserror::Error;

use crate::types::Site;

/// Errors raised while building a simulation from caller-supplied input.
///
/// Invariant violations during a run are bugs and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DlcaError {
    #[error("a simulation needs at least one particle")]
    NoParticles,

    #[error("{particles} particles do not fit on {cells} cells")]
    TooManyParticles { particles: usize, cells: usize },

    #[error("site {site} is outside the lattice ({cells} cells)")]
    SiteOutOfRange { site: Site, cells: usize },

    #[error("site {site} was given to more than one particle")]
    DuplicateSite { site: Site },

    #[error("lattice returned {got} initial sites, expected {expected}")]
    SiteCountMismatch { expected: usize, got: usize },
}

/// Errors raised by [`crate::config::Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("particle count must be positive")]
    NoParticles,

    #[error("grid extent must be positive")]
    EmptyExtent,

    #[error("unsupported dimension {0}, expected 2 or 3")]
    UnsupportedDimension(u32),

    #[error("extent {extent} in {dim} dimensions overflows the cell count")]
    ExtentOverflow { extent: u32, dim: u32 },

    #[error("{particles} particles do not fit on {cells} cells")]
    TooManyParticles { particles: usize, cells: usize },
}
