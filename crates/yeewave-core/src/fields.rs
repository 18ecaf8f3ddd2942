//! Yee-staggered field storage for the TMz polarisation.
//!
//! `Ez` lives on cell centres `(i, j)`, shape `(nx, ny)`. `Hx` sits half a
//! cell up in y at `(i, j + ½)`, shape `(nx, ny − 1)`, and `Hy` sits half a
//! cell along x at `(i + ½, j)`, shape `(nx − 1, ny)`. All arrays are
//! indexed `[[i, j]]`.
//!
//! When the split-field PML is active, `Ez` is additionally stored as the
//! two partial fields `Ezx` and `Ezy`, and the committed `Ez` is kept equal
//! to their sum after every electric update.

use ndarray::{Array2, ArrayView2};

use crate::constants::{EPS0, MU0};
use crate::solver::SolverError;
use crate::types::Grid;

/// Split components of `Ez` for the split-field PML.
#[derive(Debug, Clone)]
pub(crate) struct SplitField {
    pub(crate) ezx: Array2<f64>,
    pub(crate) ezy: Array2<f64>,
}

/// Electric and magnetic field arrays on the Yee grid.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    nx: usize,
    ny: usize,
    pub(crate) ez: Array2<f64>,
    pub(crate) hx: Array2<f64>,
    pub(crate) hy: Array2<f64>,
    pub(crate) split: Option<SplitField>,
}

impl FieldGrid {
    /// Zero-initialised fields for an `nx × ny` grid. Fails with
    /// [`SolverError::InvalidDimension`] when either dimension is zero.
    pub fn new(nx: usize, ny: usize) -> Result<Self, SolverError> {
        if nx == 0 || ny == 0 {
            return Err(SolverError::InvalidDimension { nx, ny });
        }
        Ok(Self {
            nx,
            ny,
            ez: Array2::zeros((nx, ny)),
            hx: Array2::zeros((nx, ny - 1)),
            hy: Array2::zeros((nx - 1, ny)),
            split: None,
        })
    }

    /// Zero-initialised fields carrying the `Ezx`/`Ezy` split.
    pub fn with_split(nx: usize, ny: usize) -> Result<Self, SolverError> {
        let mut fields = Self::new(nx, ny)?;
        fields.split = Some(SplitField {
            ezx: Array2::zeros((nx, ny)),
            ezy: Array2::zeros((nx, ny)),
        });
        Ok(fields)
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }

    fn check(&self, component: &'static str, i: usize, j: usize, shape: (usize, usize)) -> Result<(), SolverError> {
        if i < shape.0 && j < shape.1 {
            Ok(())
        } else {
            Err(SolverError::IndexOutOfBounds {
                component,
                i,
                j,
                nx: shape.0,
                ny: shape.1,
            })
        }
    }

    pub fn ez(&self, i: usize, j: usize) -> Result<f64, SolverError> {
        self.check("Ez", i, j, self.ez.dim())?;
        Ok(self.ez[[i, j]])
    }

    /// Overwrite `Ez` at one cell. In split mode the value is carried by
    /// `Ezx` and `Ezy` is cleared so the split invariant still holds.
    pub fn set_ez(&mut self, i: usize, j: usize, value: f64) -> Result<(), SolverError> {
        self.check("Ez", i, j, self.ez.dim())?;
        self.ez[[i, j]] = value;
        if let Some(split) = self.split.as_mut() {
            split.ezx[[i, j]] = value;
            split.ezy[[i, j]] = 0.0;
        }
        Ok(())
    }

    pub fn hx(&self, i: usize, j: usize) -> Result<f64, SolverError> {
        self.check("Hx", i, j, self.hx.dim())?;
        Ok(self.hx[[i, j]])
    }

    pub fn set_hx(&mut self, i: usize, j: usize, value: f64) -> Result<(), SolverError> {
        self.check("Hx", i, j, self.hx.dim())?;
        self.hx[[i, j]] = value;
        Ok(())
    }

    pub fn hy(&self, i: usize, j: usize) -> Result<f64, SolverError> {
        self.check("Hy", i, j, self.hy.dim())?;
        Ok(self.hy[[i, j]])
    }

    pub fn set_hy(&mut self, i: usize, j: usize, value: f64) -> Result<(), SolverError> {
        self.check("Hy", i, j, self.hy.dim())?;
        self.hy[[i, j]] = value;
        Ok(())
    }

    /// Replace the whole `Ez` array.
    pub fn load_ez(&mut self, values: &Array2<f64>) -> Result<(), SolverError> {
        if values.dim() != self.ez.dim() {
            return Err(SolverError::Configuration(format!(
                "initial Ez has shape {:?}, expected {:?}",
                values.dim(),
                self.ez.dim()
            )));
        }
        self.ez.assign(values);
        if let Some(split) = self.split.as_mut() {
            split.ezx.assign(values);
            split.ezy.fill(0.0);
        }
        Ok(())
    }

    /// Add a source increment to `Ez`. In split mode the increment goes to
    /// `Ezx` and `Ez` is recomputed from the split so the sum stays exact.
    /// Callers guarantee `(i, j)` is in range.
    pub(crate) fn add_ez(&mut self, i: usize, j: usize, delta: f64) {
        match self.split.as_mut() {
            Some(split) => {
                split.ezx[[i, j]] += delta;
                self.ez[[i, j]] = split.ezx[[i, j]] + split.ezy[[i, j]];
            }
            None => self.ez[[i, j]] += delta,
        }
    }

    pub fn ez_view(&self) -> ArrayView2<'_, f64> {
        self.ez.view()
    }

    pub fn hx_view(&self) -> ArrayView2<'_, f64> {
        self.hx.view()
    }

    pub fn hy_view(&self) -> ArrayView2<'_, f64> {
        self.hy.view()
    }

    /// `(Ezx, Ezy)` when the split is active.
    pub fn split_views(&self) -> Option<(ArrayView2<'_, f64>, ArrayView2<'_, f64>)> {
        self.split.as_ref().map(|s| (s.ezx.view(), s.ezy.view()))
    }

    /// Largest `|Ez|` over the grid. A NaN or infinite sample is returned
    /// as-is so callers can detect divergence.
    pub fn peak_ez(&self) -> f64 {
        let mut peak = 0.0_f64;
        for &v in self.ez.iter() {
            if !v.is_finite() {
                return v.abs();
            }
            peak = peak.max(v.abs());
        }
        peak
    }

    /// Electromagnetic energy per unit length in z (J/m):
    /// `Σ (ε0 Ez² + μ0 Hx² + μ0 Hy²) · dx · dy`.
    ///
    /// The electric and magnetic samples are half a step apart in time, so
    /// this is a diagnostic rather than an exactly conserved quantity.
    pub fn energy(&self, grid: &Grid) -> f64 {
        let electric: f64 = self.ez.iter().map(|e| e * e).sum();
        let magnetic: f64 =
            self.hx.iter().map(|h| h * h).sum::<f64>() + self.hy.iter().map(|h| h * h).sum::<f64>();
        (EPS0 * electric + MU0 * magnetic) * grid.dx() * grid.dy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_staggered_shapes() {
        let f = FieldGrid::new(7, 5).unwrap();
        assert_eq!(f.ez_view().dim(), (7, 5));
        assert_eq!(f.hx_view().dim(), (7, 4));
        assert_eq!(f.hy_view().dim(), (6, 5));
        assert!(!f.is_split());
        assert!(f.split_views().is_none());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(FieldGrid::new(0, 5), Err(SolverError::InvalidDimension { nx: 0, ny: 5 })));
        assert!(matches!(FieldGrid::with_split(5, 0), Err(SolverError::InvalidDimension { nx: 5, ny: 0 })));
        assert_eq!(FieldGrid::new(1, 1).unwrap().hx_view().dim(), (1, 0));
    }

    #[test]
    fn test_out_of_range_access() {
        let mut f = FieldGrid::new(4, 4).unwrap();
        assert!(matches!(f.ez(4, 0), Err(SolverError::IndexOutOfBounds { component: "Ez", .. })));
        assert!(matches!(f.hx(0, 3), Err(SolverError::IndexOutOfBounds { component: "Hx", .. })));
        assert!(matches!(f.set_hy(3, 0, 1.0), Err(SolverError::IndexOutOfBounds { component: "Hy", .. })));
        assert!(f.set_hy(2, 3, 1.0).is_ok());
        assert_eq!(f.hy(2, 3).unwrap(), 1.0);
    }

    #[test]
    fn test_set_ez_keeps_split_sum() {
        let mut f = FieldGrid::with_split(5, 5).unwrap();
        f.set_ez(2, 2, 3.0).unwrap();
        f.add_ez(2, 2, 0.5);
        let (ezx, ezy) = f.split_views().unwrap();
        assert_eq!(ezx[[2, 2]] + ezy[[2, 2]], f.ez(2, 2).unwrap());
        assert_eq!(f.ez(2, 2).unwrap(), 3.5);
    }

    #[test]
    fn test_load_ez_shape_checked() {
        let mut f = FieldGrid::new(4, 3).unwrap();
        assert!(f.load_ez(&Array2::zeros((3, 4))).is_err());
        assert!(f.load_ez(&Array2::from_elem((4, 3), 2.0)).is_ok());
        assert_eq!(f.peak_ez(), 2.0);
    }

    #[test]
    fn test_peak_reports_non_finite() {
        let mut f = FieldGrid::new(3, 3).unwrap();
        f.set_ez(1, 1, -4.0).unwrap();
        assert_eq!(f.peak_ez(), 4.0);
        f.set_ez(2, 2, f64::NAN).unwrap();
        assert!(f.peak_ez().is_nan());
    }

    #[test]
    fn test_energy_of_single_cell() {
        let grid = Grid::new(3, 3, 1e-3, 1e-3, 2.0).unwrap();
        let mut f = FieldGrid::new(3, 3).unwrap();
        f.set_ez(1, 1, 2.0).unwrap();
        let expected = EPS0 * 4.0 * 1e-6;
        assert!((f.energy(&grid) - expected).abs() < 1e-12 * expected);
    }
}
