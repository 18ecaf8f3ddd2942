//! Single-threaded backend.

use ndarray::{ArrayViewMut2, Axis};

use crate::backend::{BackendType, ComputeBackend, DeviceInfo, RowKernel};

/// Backend that visits rows in order on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialBackend;

impl SerialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial (1 thread)".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn for_each_row(&self, mut target: ArrayViewMut2<'_, f64>, kernel: &RowKernel<'_>) {
        for (i, row) in target.axis_iter_mut(Axis(0)).enumerate() {
            kernel(i, row);
        }
    }
}
