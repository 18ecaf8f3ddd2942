//! Time-averaged intensity accumulation.
//!
//! Sums `Ez²` over a rectangular region for every tick inside an
//! accumulation window, then reports the log-compressed mean
//! `ln(1 + Σ Ez² / max(1, count))`, suitable for displaying interference
//! fringes whose contrast spans several decades.

use ndarray::{s, Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::solver::SolverError;
use crate::types::{Grid, Region};

/// When and where to accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccumulationWindow {
    /// First tick (inclusive) that contributes.
    pub start: usize,
    /// Tick (exclusive) after which accumulation ends; open-ended if absent.
    #[serde(default)]
    pub stop: Option<usize>,
    /// Sub-region to accumulate; the whole grid if absent.
    #[serde(default)]
    pub region: Option<Region>,
}

impl AccumulationWindow {
    pub fn starting_at(start: usize) -> Self {
        Self {
            start,
            stop: None,
            region: None,
        }
    }

    pub fn until(mut self, stop: usize) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn over(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Whether tick `tick` falls inside the window.
    pub fn is_active(&self, tick: usize) -> bool {
        tick >= self.start && self.stop.map_or(true, |stop| tick < stop)
    }
}

/// Running `Σ Ez²` over a region.
#[derive(Debug, Clone)]
pub struct IntensityAccumulator {
    window: AccumulationWindow,
    region: Region,
    sum: Array2<f64>,
    count: usize,
}

impl IntensityAccumulator {
    pub fn new(window: AccumulationWindow, grid: &Grid) -> Result<Self, SolverError> {
        let region = window.region.unwrap_or_else(|| Region::whole(grid));
        region.validate(grid)?;
        if let Some(stop) = window.stop {
            if stop <= window.start {
                return Err(SolverError::Configuration(format!(
                    "accumulation window stops at {} before it starts at {}",
                    stop, window.start
                )));
            }
        }
        Ok(Self {
            window,
            region,
            sum: Array2::zeros((region.width(), region.height())),
            count: 0,
        })
    }

    pub fn window(&self) -> &AccumulationWindow {
        &self.window
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Number of snapshots accumulated so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Add `Ez²` of a full-grid snapshot over the region.
    pub fn accumulate(&mut self, ez: ArrayView2<'_, f64>) {
        let [i0, i1] = self.region.columns;
        let [j0, j1] = self.region.rows;
        let window = ez.slice(s![i0..i1, j0..j1]);
        Zip::from(&mut self.sum).and(&window).for_each(|acc, &e| *acc += e * e);
        self.count += 1;
    }

    /// Log-compressed mean intensity over the region.
    pub fn finalize(&self) -> IntensityMap {
        let denom = self.count.max(1) as f64;
        IntensityMap {
            region: self.region,
            samples: self.count,
            values: self.sum.mapv(|s| (s / denom).ln_1p()),
        }
    }
}

/// Result of [`IntensityAccumulator::finalize`], indexed `[[i − i0, j − j0]]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityMap {
    pub region: Region,
    pub samples: usize,
    pub values: Array2<f64>,
}

impl IntensityMap {
    /// Value at absolute cell `(i, j)`, if inside the region.
    pub fn at(&self, i: usize, j: usize) -> Option<f64> {
        if !self.region.contains(i, j) {
            return None;
        }
        Some(self.values[[i - self.region.columns[0], j - self.region.rows[0]]])
    }

    pub fn peak(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Place the map into a full `nx × ny` array, zero outside the region.
    pub fn embed(&self, nx: usize, ny: usize) -> Array2<f64> {
        let mut full = Array2::zeros((nx, ny));
        let (i0, j0) = (self.region.columns[0], self.region.rows[0]);
        for ((di, dj), &v) in self.values.indexed_iter() {
            if let Some(cell) = full.get_mut((i0 + di, j0 + dj)) {
                *cell = v;
            }
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(8, 6, 1e-3, 1e-3, 2.0).unwrap()
    }

    #[test]
    fn test_window_activity() {
        let w = AccumulationWindow::starting_at(10).until(20);
        assert!(!w.is_active(9));
        assert!(w.is_active(10));
        assert!(w.is_active(19));
        assert!(!w.is_active(20));
        assert!(AccumulationWindow::starting_at(0).is_active(1_000_000));
    }

    #[test]
    fn test_log_mean_intensity() {
        let g = grid();
        let mut acc = IntensityAccumulator::new(AccumulationWindow::starting_at(0), &g).unwrap();
        let mut ez = Array2::zeros((8, 6));
        ez[[3, 2]] = 2.0;
        acc.accumulate(ez.view());
        ez[[3, 2]] = 0.0;
        acc.accumulate(ez.view());
        let map = acc.finalize();
        assert_eq!(map.samples, 2);
        assert_relative_eq!(map.at(3, 2).unwrap(), (1.0_f64 + 2.0).ln(), max_relative = 1e-14);
        assert_eq!(map.at(0, 0), Some(0.0));
    }

    #[test]
    fn test_finalize_without_samples_is_zero() {
        let g = grid();
        let acc = IntensityAccumulator::new(AccumulationWindow::starting_at(5), &g).unwrap();
        assert_eq!(acc.finalize().peak(), 0.0);
    }

    #[test]
    fn test_region_subset_and_embed() {
        let g = grid();
        let window = AccumulationWindow::starting_at(0).over(Region::new([2, 5], [1, 4]));
        let mut acc = IntensityAccumulator::new(window, &g).unwrap();
        let ez = Array2::from_elem((8, 6), 1.0);
        acc.accumulate(ez.view());
        let map = acc.finalize();
        assert_eq!(map.values.dim(), (3, 3));
        assert!(map.at(1, 1).is_none());
        let full = map.embed(8, 6);
        assert_eq!(full[[0, 0]], 0.0);
        assert_relative_eq!(full[[4, 3]], 2.0_f64.ln());
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let g = grid();
        let outside = AccumulationWindow::starting_at(0).over(Region::new([2, 9], [1, 4]));
        assert!(IntensityAccumulator::new(outside, &g).is_err());
        let backwards = AccumulationWindow::starting_at(10).until(10);
        assert!(IntensityAccumulator::new(backwards, &g).is_err());
    }
}
