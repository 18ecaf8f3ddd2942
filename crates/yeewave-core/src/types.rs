//! Core types shared across the engine: the grid discretisation and
//! rectangular sub-regions of it.

use serde::{Deserialize, Serialize};

use crate::constants::C0;
use crate::solver::SolverError;

/// Spatial and temporal discretisation of the simulation domain.
///
/// Immutable once constructed. Cells are addressed `(i, j)` with
/// `i ∈ [0, nx)` along x and `j ∈ [0, ny)` along y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Grid {
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    dt: f64,
}

impl Grid {
    /// Build a grid whose timestep is `min(dx, dy) / (courant_factor · c0)`.
    ///
    /// `courant_factor` must exceed 1, and the resulting timestep must also
    /// respect the two-dimensional Courant limit (see [`courant_limit`]).
    /// The bundled scenarios use a factor of 2.2.
    pub fn new(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        courant_factor: f64,
    ) -> Result<Self, SolverError> {
        if !(courant_factor.is_finite() && courant_factor > 1.0) {
            return Err(SolverError::Configuration(format!(
                "Courant safety factor must be finite and greater than 1, got {}",
                courant_factor
            )));
        }
        let dt = dx.min(dy) / (courant_factor * C0);
        Self::with_timestep(nx, ny, dx, dy, dt)
    }

    /// Build a grid with an explicit timestep.
    pub fn with_timestep(nx: usize, ny: usize, dx: f64, dy: f64, dt: f64) -> Result<Self, SolverError> {
        if nx == 0 || ny == 0 {
            return Err(SolverError::InvalidDimension { nx, ny });
        }
        for (name, value) in [("dx", dx), ("dy", dy), ("dt", dt)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SolverError::Configuration(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        let limit = courant_limit(dx, dy);
        if dt > limit {
            return Err(SolverError::CourantViolation { dt, limit });
        }
        Ok(Self { nx, ny, dx, dy, dt })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Cell pitch along x (m).
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Cell pitch along y (m).
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Timestep (s).
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Largest stable timestep for this cell pitch.
    pub fn courant_limit(&self) -> f64 {
        courant_limit(self.dx, self.dy)
    }

    /// Whether `(i, j)` addresses a cell of the grid.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        i < self.nx && j < self.ny
    }

    /// Whether `(i, j)` is strictly inside the outermost ring of cells.
    pub fn is_interior(&self, i: usize, j: usize) -> bool {
        i >= 1 && j >= 1 && i < self.nx.saturating_sub(1) && j < self.ny.saturating_sub(1)
    }

    /// Total number of cells.
    pub fn cells(&self) -> usize {
        self.nx * self.ny
    }
}

/// Two-dimensional Courant limit `1 / (c0 · sqrt(1/dx² + 1/dy²))`.
pub fn courant_limit(dx: f64, dy: f64) -> f64 {
    1.0 / (C0 * (1.0 / (dx * dx) + 1.0 / (dy * dy)).sqrt())
}

/// A rectangle of cells: `columns = [i0, i1)`, `rows = [j0, j1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub columns: [usize; 2],
    pub rows: [usize; 2],
}

impl Region {
    pub fn new(columns: [usize; 2], rows: [usize; 2]) -> Self {
        Self { columns, rows }
    }

    /// The whole grid.
    pub fn whole(grid: &Grid) -> Self {
        Self {
            columns: [0, grid.nx()],
            rows: [0, grid.ny()],
        }
    }

    pub fn width(&self) -> usize {
        self.columns[1].saturating_sub(self.columns[0])
    }

    pub fn height(&self) -> usize {
        self.rows[1].saturating_sub(self.rows[0])
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.columns[0] && i < self.columns[1] && j >= self.rows[0] && j < self.rows[1]
    }

    /// Check that the region is non-empty and inside `grid`.
    pub fn validate(&self, grid: &Grid) -> Result<(), SolverError> {
        if self.width() == 0 || self.height() == 0 {
            return Err(SolverError::Configuration(format!(
                "region {:?} x {:?} is empty",
                self.columns, self.rows
            )));
        }
        if self.columns[1] > grid.nx() || self.rows[1] > grid.ny() {
            return Err(SolverError::Configuration(format!(
                "region {:?} x {:?} exceeds the {}x{} grid",
                self.columns,
                self.rows,
                grid.nx(),
                grid.ny()
            )));
        }
        Ok(())
    }
}
