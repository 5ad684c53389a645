use crate::types::{Pid, Site};

/// Occupancy table of the lattice.
///
/// Each cell holds the [`Pid`] sitting on it, or `None` when the cell is
/// empty. At most one particle occupies a cell at any time.
///
/// All operations are O(1). Out-of-range sites are contract violations and
/// panic through the bounds-checked indexing of the backing `Vec`.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Option<Pid>>,
}

impl Grid {
    /// Creates an empty grid.
    ///
    /// ### Parameters
    /// - `len` - Number of cells of the lattice.
    ///
    /// ### Returns
    /// A [`Grid`] of `len` empty cells.
    pub fn with_len(len: usize) -> Self {
        Self {
            cells: vec![None; len],
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the particle at `site`, if any.
    ///
    /// ### Parameters
    /// - `site` - Flattened cell index.
    ///
    /// ### Returns
    /// `Some(pid)` for an occupied cell, `None` for an empty one.
    ///
    /// ### Panics
    /// Panics if `site` is out of range.
    #[inline]
    pub fn occupant(&self, site: Site) -> Option<Pid> {
        self.cells[site]
    }

    /// Puts `pid` on `site`.
    ///
    /// ### Parameters
    /// - `site` - Empty cell to occupy.
    /// - `pid` - Particle placed there.
    ///
    /// ### Panics
    /// Panics if `site` is out of range or already occupied.
    #[inline]
    pub fn place(&mut self, site: Site, pid: Pid) {
        let cell = &mut self.cells[site];
        assert!(
            cell.is_none(),
            "cannot place particle {pid} on site {site}: occupied by {:?}",
            cell
        );
        *cell = Some(pid);
    }

    /// Empties `site`.
    ///
    /// ### Parameters
    /// - `site` - Occupied cell to clear.
    ///
    /// ### Returns
    /// The particle that was on `site`.
    ///
    /// ### Panics
    /// Panics if `site` is out of range or already empty.
    #[inline]
    pub fn vacate(&mut self, site: Site) -> Pid {
        match self.cells[site].take() {
            Some(pid) => pid,
            None => panic!("cannot vacate site {site}: already empty"),
        }
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Iterates over `(site, pid)` for every occupied cell, in site order.
    pub fn occupied(&self) -> impl Iterator<Item = (Site, Pid)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(site, cell)| cell.map(|pid| (site, pid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_starts_empty() {
        let grid = Grid::with_len(16);

        assert_eq!(grid.len(), 16);
        assert_eq!(grid.occupied_count(), 0);
        assert!((0..16).all(|s| grid.occupant(s).is_none()));
    }

    #[test]
    fn place_then_vacate() {
        let mut grid = Grid::with_len(4);
        grid.place(2, 7);

        assert_eq!(grid.occupant(2), Some(7));
        assert_eq!(grid.occupied_count(), 1);
        assert_eq!(grid.occupied().collect::<Vec<_>>(), vec![(2, 7)]);

        assert_eq!(grid.vacate(2), 7);
        assert_eq!(grid.occupant(2), None);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    #[should_panic(expected = "occupied")]
    fn place_on_occupied_cell_panics() {
        let mut grid = Grid::with_len(4);
        grid.place(1, 0);
        grid.place(1, 1);
    }

    #[test]
    #[should_panic(expected = "already empty")]
    fn vacate_empty_cell_panics() {
        let mut grid = Grid::with_len(4);
        grid.vacate(3);
    }

    #[test]
    #[should_panic]
    fn occupant_out_of_range_panics() {
        let grid = Grid::with_len(4);
        grid.occupant(4);
    }
}
