//! # yeewave Compute
//!
//! Compute backend abstraction for the yeewave FDTD engine. This crate
//! provides a [`ComputeBackend`](backend::ComputeBackend) trait that isolates
//! the field-update kernels from how rows of the grid are scheduled.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Execution |
//! |---------|-------------|-----------|
//! | Serial | always | Single thread, row by row |
//! | CPU (Rayon) | `cpu` (default) | Rows spread across a Rayon pool |
//!
//! Every row of a field update depends only on fields that the pass does not
//! write, so all backends produce bit-identical results.

pub mod backend;
pub mod serial;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, RowKernel};
pub use serial::SerialBackend;

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
