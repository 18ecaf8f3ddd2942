//! CPU compute backend using Rayon for shared-memory parallelism.

use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMut2, Axis};

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, RowKernel};

/// CPU backend that parallelises rows across threads via Rayon.
pub struct CpuBackend {
    num_threads: usize,
    /// Dedicated pool when a thread count was requested; the global pool otherwise.
    pool: Option<rayon::ThreadPool>,
}

impl CpuBackend {
    /// Create a new CPU backend on the global Rayon pool.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
            pool: None,
        }
    }

    /// Create a CPU backend with a dedicated pool of `num_threads` threads.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        if num_threads == 0 {
            return Err(ComputeError::InvalidThreadCount(num_threads));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| ComputeError::ThreadPool(e.to_string()))?;
        Ok(Self {
            num_threads,
            pool: Some(pool),
        })
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn for_each_row(&self, mut target: ArrayViewMut2<'_, f64>, kernel: &RowKernel<'_>) {
        let rows = target.axis_iter_mut(Axis(0));
        match &self.pool {
            Some(pool) => pool.install(|| {
                rows.into_par_iter()
                    .enumerate()
                    .for_each(|(i, row)| kernel(i, row))
            }),
            None => rows
                .into_par_iter()
                .enumerate()
                .for_each(|(i, row)| kernel(i, row)),
        }
    }
}
