//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution strategies so that
//! the update equations in `yeewave-core` stay independent of threading.

use ndarray::{ArrayViewMut1, ArrayViewMut2};
use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid thread count: {0}")]
    InvalidThreadCount(usize),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// A per-row update kernel: receives the row index along axis 0 and a
/// mutable view of that row.
pub type RowKernel<'k> = dyn for<'r> Fn(usize, ArrayViewMut1<'r, f64>) + Send + Sync + 'k;

/// Abstraction over compute backends.
///
/// Physics code in `yeewave-core` expresses each field-update pass as a row
/// kernel over a 2D array. A kernel may read any array it captures by shared
/// reference, but must only write the row it is handed.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Apply `kernel` to every row (axis 0) of `target`.
    ///
    /// Rows may run in any order or concurrently.
    fn for_each_row(&self, target: ArrayViewMut2<'_, f64>, kernel: &RowKernel<'_>);
}
