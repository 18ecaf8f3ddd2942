//! Perfect-electric-conductor (PEC) obstacle mask.
//!
//! A flagged cell has its `Ez` forced to zero on every electric update. The
//! magnetic field is never masked.

use ndarray::{Array2, ArrayView2};

/// Boolean grid of PEC cells, indexed `[[i, j]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMask {
    cells: Array2<bool>,
}

impl ObstacleMask {
    /// A mask with no obstacles.
    pub fn empty(nx: usize, ny: usize) -> Self {
        Self {
            cells: Array2::from_elem((nx, ny), false),
        }
    }

    /// Flag every cell for which `is_pec(i, j)` holds.
    pub fn from_predicate(nx: usize, ny: usize, is_pec: impl Fn(usize, usize) -> bool) -> Self {
        Self {
            cells: Array2::from_shape_fn((nx, ny), |(i, j)| is_pec(i, j)),
        }
    }

    /// Wrap an existing boolean array (for example a rasterised geometry).
    pub fn from_array(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    pub fn dims(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// Whether `(i, j)` is PEC. Out-of-range cells are not.
    pub fn is_pec(&self, i: usize, j: usize) -> bool {
        self.cells.get((i, j)).copied().unwrap_or(false)
    }

    pub fn set(&mut self, i: usize, j: usize, pec: bool) {
        if let Some(cell) = self.cells.get_mut((i, j)) {
            *cell = pec;
        }
    }

    /// Number of PEC cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.cells.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_mask() {
        let mask = ObstacleMask::from_predicate(10, 6, |i, j| i == 4 && j != 3);
        assert_eq!(mask.count(), 5);
        assert!(mask.is_pec(4, 0));
        assert!(!mask.is_pec(4, 3));
        assert!(!mask.is_pec(40, 0));
    }

    #[test]
    fn test_set_and_dims() {
        let mut mask = ObstacleMask::empty(3, 2);
        assert_eq!(mask.dims(), (3, 2));
        mask.set(2, 1, true);
        mask.set(9, 9, true);
        assert_eq!(mask.count(), 1);
        assert!(mask.view()[[2, 1]]);
    }
}
