//! Leapfrog field update kernels.
//!
//! Each kernel walks one field array row by row (rows are fixed `i`)
//! through the compute backend. A kernel only writes its own target array
//! and reads the others, so the row schedule never changes the result.

use yeewave_compute::ComputeBackend;

use crate::constants::EPS0;
use crate::fields::FieldGrid;
use crate::mask::ObstacleMask;
use crate::types::Grid;

use super::boundary::BoundaryDamping;

/// Advance `Hx` and `Hy` by one step from the current `Ez`.
pub(crate) fn update_magnetic(
    fields: &mut FieldGrid,
    grid: &Grid,
    boundary: &BoundaryDamping,
    backend: &dyn ComputeBackend,
) {
    let (dx, dy) = (grid.dx(), grid.dy());
    let ez = &fields.ez;
    let cy = boundary.magnetic_y();
    let cx = boundary.magnetic_x();

    backend.for_each_row(fields.hx.view_mut(), &|i, mut row| {
        for (j, hx) in row.iter_mut().enumerate() {
            let curl = (ez[[i, j + 1]] - ez[[i, j]]) / dy;
            *hx = cy.decay[j] * *hx - cy.gain[j] * curl;
        }
    });

    backend.for_each_row(fields.hy.view_mut(), &|i, mut row| {
        let (decay, gain) = (cx.decay[i], cx.gain[i]);
        for (j, hy) in row.iter_mut().enumerate() {
            let curl = (ez[[i + 1, j]] - ez[[i, j]]) / dx;
            *hy = decay * *hy + gain * curl;
        }
    });
}

/// Advance `Ez` by one step from the current `Hx`/`Hy`, zeroing PEC cells.
/// The outer ring of cells is never written and stays at zero.
pub(crate) fn update_electric(
    fields: &mut FieldGrid,
    grid: &Grid,
    mask: &ObstacleMask,
    boundary: &BoundaryDamping,
    backend: &dyn ComputeBackend,
) {
    let (nx, ny) = (grid.nx(), grid.ny());
    let (dx, dy) = (grid.dx(), grid.dy());
    let pec = mask.view();
    let hx = &fields.hx;
    let hy = &fields.hy;
    let interior_rows = 1..ny.saturating_sub(1);
    let is_interior_column = |i: usize| i >= 1 && i + 1 < nx;

    match (fields.split.as_mut(), boundary.split_electric()) {
        (Some(split), Some((ax, ay))) => {
            backend.for_each_row(split.ezx.view_mut(), &|i, mut row| {
                if !is_interior_column(i) {
                    return;
                }
                let (decay, gain) = (ax.decay[i], ax.gain[i]);
                for j in interior_rows.clone() {
                    row[j] = if pec[[i, j]] {
                        0.0
                    } else {
                        decay * row[j] + gain * (hy[[i, j]] - hy[[i - 1, j]]) / dx
                    };
                }
            });
            backend.for_each_row(split.ezy.view_mut(), &|i, mut row| {
                if !is_interior_column(i) {
                    return;
                }
                for j in interior_rows.clone() {
                    row[j] = if pec[[i, j]] {
                        0.0
                    } else {
                        ay.decay[j] * row[j] - ay.gain[j] * (hx[[i, j]] - hx[[i, j - 1]]) / dy
                    };
                }
            });
            let (ezx, ezy) = (&split.ezx, &split.ezy);
            backend.for_each_row(fields.ez.view_mut(), &|i, mut row| {
                for (j, ez) in row.iter_mut().enumerate() {
                    *ez = ezx[[i, j]] + ezy[[i, j]];
                }
            });
        }
        _ => {
            let ce = grid.dt() / EPS0;
            backend.for_each_row(fields.ez.view_mut(), &|i, mut row| {
                if !is_interior_column(i) {
                    return;
                }
                for j in interior_rows.clone() {
                    if pec[[i, j]] {
                        row[j] = 0.0;
                        continue;
                    }
                    let curl = (hy[[i, j]] - hy[[i - 1, j]]) / dx - (hx[[i, j]] - hx[[i, j - 1]]) / dy;
                    row[j] += ce * curl;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::fdtd::BoundaryConfig;
    use approx::assert_relative_eq;
    use yeewave_compute::SerialBackend;

    fn setup(n: usize) -> (Grid, BoundaryDamping, ObstacleMask) {
        let grid = Grid::new(n, n, 1e-3, 1e-3, 2.2).unwrap();
        let boundary = BoundaryDamping::new(&BoundaryConfig::None, &grid).unwrap();
        (grid, boundary, ObstacleMask::empty(n, n))
    }

    #[test]
    fn test_magnetic_update_matches_curl() {
        let (grid, boundary, _) = setup(5);
        let mut fields = FieldGrid::new(5, 5).unwrap();
        fields.ez[[2, 2]] = 1.0;
        update_magnetic(&mut fields, &grid, &boundary, &SerialBackend);
        let ch = grid.dt() / crate::constants::MU0 / grid.dy();
        // Hx[2,1] sees Ez[2,2] - Ez[2,1] = +1, Hx[2,2] sees -1.
        assert_relative_eq!(fields.hx[[2, 1]], -ch, max_relative = 1e-12);
        assert_relative_eq!(fields.hx[[2, 2]], ch, max_relative = 1e-12);
        assert_relative_eq!(fields.hy[[1, 2]], ch, max_relative = 1e-12);
        assert_relative_eq!(fields.hy[[2, 2]], -ch, max_relative = 1e-12);
        assert_eq!(fields.hx[[0, 0]], 0.0);
    }

    #[test]
    fn test_electric_update_respects_edges_and_pec() {
        let (grid, boundary, mut mask) = setup(6);
        let mut fields = FieldGrid::new(6, 6).unwrap();
        fields.hy.fill(0.0);
        fields.hy[[2, 3]] = 1.0;
        fields.ez[[3, 3]] = 5.0;
        mask.set(3, 3, true);
        update_electric(&mut fields, &grid, &mask, &boundary, &SerialBackend);
        assert_eq!(fields.ez[[3, 3]], 0.0);
        let ce = grid.dt() / EPS0 / grid.dx();
        assert_relative_eq!(fields.ez[[2, 3]], ce, max_relative = 1e-12);
        fields.hy.fill(1.0e3);
        fields.hx.fill(-2.0e3);
        fields.hy[[0, 2]] = 7.0;
        update_electric(&mut fields, &grid, &mask, &boundary, &SerialBackend);
        for k in 0..6 {
            assert_eq!(fields.ez[[0, k]], 0.0);
            assert_eq!(fields.ez[[5, k]], 0.0);
            assert_eq!(fields.ez[[k, 0]], 0.0);
            assert_eq!(fields.ez[[k, 5]], 0.0);
        }
    }

    #[test]
    fn test_split_update_keeps_sum() {
        let grid = Grid::new(30, 30, 1e-3, 1e-3, 2.2).unwrap();
        let config = BoundaryConfig::SplitFieldPml {
            thickness: 5,
            grading: 3,
            reflection: 1e-6,
        };
        let boundary = BoundaryDamping::new(&config, &grid).unwrap();
        let mask = ObstacleMask::empty(30, 30);
        let mut fields = FieldGrid::with_split(30, 30).unwrap();
        fields.add_ez(15, 15, 1.0);
        for _ in 0..20 {
            update_magnetic(&mut fields, &grid, &boundary, &SerialBackend);
            update_electric(&mut fields, &grid, &mask, &boundary, &SerialBackend);
        }
        let (ezx, ezy) = fields.split_views().unwrap();
        for ((e, x), y) in fields.ez.iter().zip(ezx.iter()).zip(ezy.iter()) {
            assert_eq!(*e, x + y);
        }
        assert!(fields.peak_ez() > 0.0);
    }
}
