//! Frame snapshots and step observers for visual output.
//!
//! A [`Frame`] is a read-only view of one field array plus the scaling
//! used to map it to 8-bit grayscale. Image rows run along `j` and image
//! columns along `i`, so the picture shows the grid with x horizontal.
//! Sinks implement [`FrameSink`]; the engine never depends on a concrete
//! image format.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::solver::{StepObserver, TimeDomainSolver};

/// How field values map to grayscale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameScaling {
    /// Signed fields: `v/max|v|` in `[−1, 1]` mapped to `[0, 255]`, zero at mid-gray.
    #[default]
    Symmetric,
    /// Non-negative data (intensities): `v/max(v)` in `[0, 1]` mapped to `[0, 255]`.
    Normalized,
}

/// A named 2-D snapshot ready for a sink.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub name: String,
    pub data: ArrayView2<'a, f64>,
    pub scaling: FrameScaling,
}

impl<'a> Frame<'a> {
    pub fn new(name: impl Into<String>, data: ArrayView2<'a, f64>, scaling: FrameScaling) -> Self {
        Self {
            name: name.into(),
            data,
            scaling,
        }
    }

    /// Image width in pixels (`nx`).
    pub fn width(&self) -> usize {
        self.data.nrows()
    }

    /// Image height in pixels (`ny`).
    pub fn height(&self) -> usize {
        self.data.ncols()
    }

    /// Row-major 8-bit pixels, `height` rows of `width` pixels.
    ///
    /// Non-finite samples are treated as zero. An all-zero frame maps to
    /// mid-gray under symmetric scaling and to black when normalised.
    pub fn to_grayscale(&self) -> Vec<u8> {
        let clean = |v: f64| if v.is_finite() { v } else { 0.0 };
        let (w, h) = (self.width(), self.height());
        let mut pixels = Vec::with_capacity(w * h);
        match self.scaling {
            FrameScaling::Symmetric => {
                let peak = self.data.iter().fold(0.0_f64, |m, &v| m.max(clean(v).abs()));
                let scale = if peak > 0.0 { peak } else { 1.0 };
                for j in 0..h {
                    for i in 0..w {
                        let v = (clean(self.data[[i, j]]) / scale).clamp(-1.0, 1.0);
                        pixels.push((127.5 * (v + 1.0)).round() as u8);
                    }
                }
            }
            FrameScaling::Normalized => {
                let peak = self.data.iter().fold(0.0_f64, |m, &v| m.max(clean(v)));
                let scale = if peak > 0.0 { peak } else { 1.0 };
                for j in 0..h {
                    for i in 0..w {
                        let v = (clean(self.data[[i, j]]) / scale).clamp(0.0, 1.0);
                        pixels.push((255.0 * v) as u8);
                    }
                }
            }
        }
        pixels
    }
}

/// Errors reported by frame sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame rejected: {0}")]
    Rejected(String),
}

/// Destination for rendered frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame<'_>) -> Result<(), SinkError>;
}

/// Observer that emits `Ez` frames every `stride` steps.
///
/// Frames are named `Ez_<step>` with `step` the zero-based index of the
/// step just completed. Sink failures are logged and counted but never
/// interrupt the run.
pub struct FrameRecorder<S: FrameSink> {
    sink: S,
    stride: usize,
    scaling: FrameScaling,
    written: usize,
    failed: usize,
}

impl<S: FrameSink> FrameRecorder<S> {
    pub fn new(sink: S, stride: usize) -> Self {
        Self {
            sink,
            stride: stride.max(1),
            scaling: FrameScaling::Symmetric,
            written: 0,
            failed: 0,
        }
    }

    pub fn with_scaling(mut self, scaling: FrameScaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: FrameSink> StepObserver for FrameRecorder<S> {
    fn on_step(&mut self, solver: &dyn TimeDomainSolver) {
        let Some(step) = solver.tick().checked_sub(1) else {
            return;
        };
        if step % self.stride != 0 {
            return;
        }
        let frame = Frame::new(format!("Ez_{}", step), solver.electric_field(), self.scaling);
        match self.sink.write_frame(&frame) {
            Ok(()) => self.written += 1,
            Err(e) => {
                self.failed += 1;
                log::warn!("Failed to write frame {}: {}", frame.name, e);
            }
        }
    }
}

/// Observer that logs progress every `stride` steps.
pub struct ProgressLogger {
    stride: usize,
    total: Option<usize>,
}

impl ProgressLogger {
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            total: None,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

impl StepObserver for ProgressLogger {
    fn on_step(&mut self, solver: &dyn TimeDomainSolver) {
        let tick = solver.tick();
        if tick % self.stride != 0 {
            return;
        }
        let peak = solver.electric_field().iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
        match self.total {
            Some(total) => log::info!(
                "[{}] tick {}/{} ({:.0}%), peak |Ez| = {:.3e}",
                solver.method_name(),
                tick,
                total,
                100.0 * tick as f64 / total.max(1) as f64,
                peak
            ),
            None => log::info!("[{}] tick {}, peak |Ez| = {:.3e}", solver.method_name(), tick, peak),
        }
    }
}
