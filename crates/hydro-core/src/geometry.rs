//! Block geometry, face sides, and field layout.

use std::ops::Range;

use crate::Real;

/// Index of the density variable in conserved and primitive arrays.
pub const IDN: usize = 0;
/// Index of the x1 momentum (conserved) or velocity (primitive).
pub const IM1: usize = 1;
/// Index of the total energy (conserved) or pressure (primitive).
pub const IEN: usize = 2;
/// Maximum number of hydrodynamic variables per cell.
pub const NHYDRO: usize = 3;

/// One of the two x1 faces of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// The low-x1 face.
    Inner,
    /// The high-x1 face.
    Outer,
}

impl Side {
    /// Both sides, inner first.
    pub const ALL: [Side; 2] = [Side::Inner, Side::Outer];

    /// The face this one touches on the neighbouring block.
    pub fn opposite(self) -> Self {
        match self {
            Self::Inner => Self::Outer,
            Self::Outer => Self::Inner,
        }
    }

    /// Array index (`Inner = 0`, `Outer = 1`).
    pub fn index(self) -> usize {
        match self {
            Self::Inner => 0,
            Self::Outer => 1,
        }
    }
}

/// Number of conserved and derived variables stored per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    /// Conserved (evolved) variables.
    pub nvar: usize,
    /// Derived (auxiliary) variables recomputed after each stage.
    pub nderived: usize,
}

/// Cell geometry of a single block along x1.
///
/// Cells are stored `[ghost | interior | ghost]`: interior cell `i`
/// (0-based) lives at storage index `nghost + i`. Face `k` lies between
/// storage cells `nghost + k - 1` and `nghost + k`, for `k` in `0..=nx`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockGeometry {
    /// Interior cells.
    pub nx: usize,
    /// Ghost cells on each side.
    pub nghost: usize,
    /// x1 coordinate of the inner face of the first interior cell.
    pub x_min: Real,
    /// Uniform cell width.
    pub dx: Real,
}

impl BlockGeometry {
    /// Total cells including both ghost layers.
    pub fn ncells_total(&self) -> usize {
        self.nx + 2 * self.nghost
    }

    /// Number of x1 faces bounding interior cells.
    pub fn nfaces(&self) -> usize {
        self.nx + 1
    }

    /// Storage indices of interior cells.
    pub fn interior(&self) -> Range<usize> {
        self.nghost..self.nghost + self.nx
    }

    /// Storage indices of the ghost layer on `side`.
    pub fn ghosts(&self, side: Side) -> Range<usize> {
        match side {
            Side::Inner => 0..self.nghost,
            Side::Outer => self.nghost + self.nx..self.ncells_total(),
        }
    }

    /// Storage indices of the interior cells sent to the neighbour on `side`.
    pub fn send_cells(&self, side: Side) -> Range<usize> {
        match side {
            Side::Inner => self.nghost..2 * self.nghost,
            Side::Outer => self.nx..self.nx + self.nghost,
        }
    }

    /// Cell-centre coordinate of storage cell `i` (ghosts included).
    pub fn x_center(&self, i: usize) -> Real {
        self.x_min + (i as Real - self.nghost as Real + 0.5) * self.dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> BlockGeometry {
        BlockGeometry {
            nx: 8,
            nghost: 2,
            x_min: 0.0,
            dx: 0.125,
        }
    }

    #[test]
    fn storage_ranges() {
        let g = geom();
        assert_eq!(g.ncells_total(), 12);
        assert_eq!(g.nfaces(), 9);
        assert_eq!(g.interior(), 2..10);
        assert_eq!(g.ghosts(Side::Inner), 0..2);
        assert_eq!(g.ghosts(Side::Outer), 10..12);
        assert_eq!(g.send_cells(Side::Inner), 2..4);
        assert_eq!(g.send_cells(Side::Outer), 8..10);
    }

    #[test]
    fn cell_centres() {
        let g = geom();
        assert_eq!(g.x_center(2), 0.0625);
        assert_eq!(g.x_center(9), 0.9375);
        assert!(g.x_center(0) < 0.0);
    }

    #[test]
    fn opposite_sides() {
        assert_eq!(Side::Inner.opposite(), Side::Outer);
        assert_eq!(Side::Outer.opposite(), Side::Inner);
        assert_eq!(Side::ALL.map(Side::index), [0, 1]);
    }
}
