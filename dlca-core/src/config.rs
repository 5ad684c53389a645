use crate::error::ConfigError;

/// What happens when a cluster tries to step across the edge of the box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Boundary {
    /// Opposite faces are glued together (torus).
    #[default]
    Periodic,
    /// Walls; a move that would cross one is rejected.
    Closed,
}

/// Which clusters move during one call to [`crate::engine::Dlca::evolve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepPolicy {
    /// One surviving cluster, drawn uniformly.
    #[default]
    RandomCluster,
    /// Every cluster alive at the start of the step, in label order.
    ///
    /// A cluster that merged with an earlier mover of the step does not
    /// move again until the next step.
    AllClusters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub particles: usize,
    /// Number of sites along each axis.
    pub extent: u32,
    /// 2 or 3.
    pub dim: u32,
    pub boundary: Boundary,
    pub policy: StepPolicy,
    /// Fixed seed for reproducible runs; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particles: 400,
            extent: 64,
            dim: 2,
            boundary: Boundary::Periodic,
            policy: StepPolicy::RandomCluster,
            seed: None,
        }
    }
}

impl Config {
    /// Total number of lattice cells, `extent^dim`, or `None` on overflow.
    pub fn cells(&self) -> Option<usize> {
        (self.extent as usize).checked_pow(self.dim)
    }

    /// Checks that the configuration describes a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particles == 0 {
            return Err(ConfigError::NoParticles);
        }
        if self.extent == 0 {
            return Err(ConfigError::EmptyExtent);
        }
        if !(2..=3).contains(&self.dim) {
            return Err(ConfigError::UnsupportedDimension(self.dim));
        }
        // Coordinates are stored as i32.
        let cells = self
            .cells()
            .filter(|_| self.extent <= i32::MAX as u32)
            .ok_or(ConfigError::ExtentOverflow {
                extent: self.extent,
                dim: self.dim,
            })?;
        if self.particles > cells {
            return Err(ConfigError::TooManyParticles {
                particles: self.particles,
                cells,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.cells(), Some(64 * 64));
    }

    #[test]
    fn rejects_bad_dimensions() {
        let cfg = Config {
            dim: 4,
            ..Config::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::UnsupportedDimension(4)));
    }

    #[test]
    fn rejects_overfull_lattice() {
        let cfg = Config {
            particles: 28,
            extent: 3,
            dim: 3,
            ..Config::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::TooManyParticles {
                particles: 28,
                cells: 27
            })
        );
    }

    #[test]
    fn rejects_empty_input() {
        let no_particles = Config {
            particles: 0,
            ..Config::default()
        };
        assert_eq!(no_particles.validate(), Err(ConfigError::NoParticles));

        let no_extent = Config {
            extent: 0,
            ..Config::default()
        };
        assert_eq!(no_extent.validate(), Err(ConfigError::EmptyExtent));
    }

    #[test]
    fn rejects_overflowing_extent() {
        let cfg = Config {
            extent: u32::MAX,
            dim: 3,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ExtentOverflow { .. })
        ));
    }
}
