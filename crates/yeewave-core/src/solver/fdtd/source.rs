//! Excitation sources.
//!
//! Every source contributes an additive `Ez` increment at tick `n` over its
//! footprint. The TF/SF plane wave also corrects the `Hy` column just
//! outside the total-field region before the electric update, which
//! confines the injected wave to one side of the source column.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::{C0, MU0};
use crate::fields::FieldGrid;
use crate::solver::SolverError;
use crate::types::Grid;

fn unit_amplitude() -> f64 {
    1.0
}

/// Temporal profile `g(t)` of a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Waveform {
    /// `exp(−½((t/dt − t0)/spread)²)`, with `t0` and `spread` in ticks.
    Gaussian { t0: f64, spread: f64 },
    /// `sin(2π f t)`.
    Sine { frequency: f64 },
    /// Sine multiplied by a raised-cosine turn-on over `ramp_time` seconds.
    RampedSine { frequency: f64, ramp_time: f64 },
}

impl Waveform {
    /// Value at time `t` (s) on a grid with timestep `dt`.
    pub fn evaluate(&self, t: f64, dt: f64) -> f64 {
        match *self {
            Waveform::Gaussian { t0, spread } => {
                let x = (t / dt - t0) / spread;
                (-0.5 * x * x).exp()
            }
            Waveform::Sine { frequency } => (2.0 * PI * frequency * t).sin(),
            Waveform::RampedSine { frequency, ramp_time } => {
                turn_on_ramp(t, ramp_time) * (2.0 * PI * frequency * t).sin()
            }
        }
    }

    fn validate(&self) -> Result<(), SolverError> {
        let ok = match *self {
            Waveform::Gaussian { t0, spread } => t0.is_finite() && spread.is_finite() && spread > 0.0,
            Waveform::Sine { frequency } => frequency.is_finite() && frequency > 0.0,
            Waveform::RampedSine { frequency, ramp_time } => {
                frequency.is_finite() && frequency > 0.0 && ramp_time.is_finite() && ramp_time > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(SolverError::InvalidSource(format!("invalid waveform {:?}", self)))
        }
    }
}

/// Raised-cosine turn-on `½(1 − cos(π t / t_ramp))`, 1 once `t ≥ t_ramp`.
pub fn turn_on_ramp(t: f64, ramp_time: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t < ramp_time {
        0.5 * (1.0 - (PI * t / ramp_time).cos())
    } else {
        1.0
    }
}

/// Propagation direction of a TF/SF plane wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    PositiveX,
    NegativeX,
}

/// A source attached to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Soft source at a single cell.
    Point {
        position: [usize; 2],
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
        waveform: Waveform,
    },
    /// Total-field/scattered-field plane wave entering at `column`.
    Tfsf {
        column: usize,
        direction: Direction,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
        waveform: Waveform,
    },
    /// In-phase sinusoid along every interior row of `column`.
    Broadside {
        column: usize,
        frequency: f64,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
    },
    /// Phased line source steering a beam by `angle_deg`. Positive angles
    /// tilt propagation toward increasing `j`.
    Oblique {
        column: usize,
        /// Half-open row range `[start, end)`.
        rows: [usize; 2],
        /// Row of zero phase; defaults to `rows[0]`.
        #[serde(default)]
        reference_row: Option<usize>,
        frequency: f64,
        angle_deg: f64,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
    },
    /// Uniform-phase rectangular patch `A sin(ωt + φ)`.
    Patch {
        origin: [usize; 2],
        size: [usize; 2],
        frequency: f64,
        #[serde(default = "unit_amplitude")]
        amplitude: f64,
        #[serde(default)]
        phase: f64,
    },
}

/// Cells a source writes to: half-open column and row ranges.
struct Footprint {
    columns: [usize; 2],
    rows: [usize; 2],
}

impl Source {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Point { .. } => "point",
            Source::Tfsf { .. } => "tfsf",
            Source::Broadside { .. } => "broadside",
            Source::Oblique { .. } => "oblique",
            Source::Patch { .. } => "patch",
        }
    }

    /// Check that the footprint lies inside the grid interior and that the
    /// parameters are usable.
    pub fn validate(&self, grid: &Grid) -> Result<(), SolverError> {
        let (nx, ny) = (grid.nx(), grid.ny());
        let invalid = |detail: String| SolverError::InvalidSource(format!("{} source: {}", self.kind(), detail));
        let interior_column = |column: usize| {
            if column >= 1 && column < nx.saturating_sub(1) {
                Ok(())
            } else {
                Err(invalid(format!("column {} must lie in 1..{}", column, nx.saturating_sub(1))))
            }
        };
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(format!("{} must be positive, got {}", name, value)))
            }
        };

        let amplitude = match *self {
            Source::Point {
                position, amplitude, waveform,
            } => {
                if !grid.is_interior(position[0], position[1]) {
                    return Err(invalid(format!(
                        "position {:?} is not inside the {}x{} grid interior",
                        position, nx, ny
                    )));
                }
                waveform.validate()?;
                amplitude
            }
            Source::Tfsf {
                column, amplitude, waveform, ..
            } => {
                interior_column(column)?;
                waveform.validate()?;
                amplitude
            }
            Source::Broadside {
                column, frequency, amplitude,
            } => {
                interior_column(column)?;
                positive("frequency", frequency)?;
                amplitude
            }
            Source::Oblique {
                column,
                rows,
                reference_row,
                frequency,
                angle_deg,
                amplitude,
            } => {
                interior_column(column)?;
                positive("frequency", frequency)?;
                if rows[0] < 1 || rows[0] >= rows[1] || rows[1] >= ny {
                    return Err(invalid(format!("rows {:?} must be a non-empty range in 1..{}", rows, ny - 1)));
                }
                if reference_row.is_some_and(|r| r >= ny) {
                    return Err(invalid(format!("reference row {:?} is outside the grid", reference_row)));
                }
                if !(angle_deg.is_finite() && angle_deg.abs() < 90.0) {
                    return Err(invalid(format!("angle {} must lie strictly within ±90°", angle_deg)));
                }
                amplitude
            }
            Source::Patch {
                origin,
                size,
                frequency,
                amplitude,
                phase,
            } => {
                positive("frequency", frequency)?;
                if size[0] == 0 || size[1] == 0 {
                    return Err(invalid("patch size must be non-zero".into()));
                }
                let end = match (origin[0].checked_add(size[0]), origin[1].checked_add(size[1])) {
                    (Some(x), Some(y)) => [x, y],
                    _ => return Err(invalid(format!("patch {:?}+{:?} overflows", origin, size))),
                };
                if origin[0] < 1 || origin[1] < 1 || end[0] >= nx || end[1] >= ny {
                    return Err(invalid(format!(
                        "patch {:?}+{:?} is not inside the {}x{} grid interior",
                        origin, size, nx, ny
                    )));
                }
                if !phase.is_finite() {
                    return Err(invalid(format!("phase must be finite, got {}", phase)));
                }
                amplitude
            }
        };
        if !amplitude.is_finite() {
            return Err(invalid(format!("amplitude must be finite, got {}", amplitude)));
        }
        Ok(())
    }

    fn footprint(&self, grid: &Grid) -> Footprint {
        let interior_rows = [1, grid.ny().saturating_sub(1)];
        match *self {
            Source::Point { position, .. } => Footprint {
                columns: [position[0], position[0] + 1],
                rows: [position[1], position[1] + 1],
            },
            Source::Tfsf { column, .. } | Source::Broadside { column, .. } => Footprint {
                columns: [column, column + 1],
                rows: interior_rows,
            },
            Source::Oblique { column, rows, .. } => Footprint {
                columns: [column, column + 1],
                rows,
            },
            Source::Patch { origin, size, .. } => Footprint {
                columns: [origin[0], origin[0] + size[0]],
                rows: [origin[1], origin[1] + size[1]],
            },
        }
    }

    /// `Ez` increment this source adds at cell `(i, j)` during tick `tick`
    /// (zero outside its footprint).
    pub fn electric_increment(&self, grid: &Grid, tick: usize, i: usize, j: usize) -> f64 {
        let fp = self.footprint(grid);
        if i < fp.columns[0] || i >= fp.columns[1] || j < fp.rows[0] || j >= fp.rows[1] {
            return 0.0;
        }
        let dt = grid.dt();
        let t = tick as f64 * dt;
        match *self {
            Source::Point { amplitude, waveform, .. } => amplitude * waveform.evaluate(t, dt),
            Source::Tfsf { amplitude, waveform, .. } => {
                // Incident Ez sits half a step and half a cell ahead of the
                // Hy sample that drives it.
                let retarded = t + 0.5 * dt + 0.5 * grid.dx() / C0;
                amplitude * (dt * C0 / grid.dx()) * waveform.evaluate(retarded, dt)
            }
            Source::Broadside { frequency, amplitude, .. } => amplitude * (2.0 * PI * frequency * t).sin(),
            Source::Oblique {
                rows,
                reference_row,
                frequency,
                angle_deg,
                amplitude,
                ..
            } => {
                let omega = 2.0 * PI * frequency;
                let ky = omega / C0 * angle_deg.to_radians().sin();
                let offset = j as f64 - reference_row.unwrap_or(rows[0]) as f64;
                amplitude * (omega * t - ky * offset * grid.dy()).sin()
            }
            Source::Patch {
                frequency,
                amplitude,
                phase,
                ..
            } => amplitude * (2.0 * PI * frequency * t + phase).sin(),
        }
    }

    /// TF/SF `Hy` correction for tick `tick`: the column to correct and the
    /// uniform increment applied along its interior rows.
    pub fn magnetic_correction(&self, grid: &Grid, tick: usize) -> Option<(usize, f64)> {
        let Source::Tfsf {
            column,
            direction,
            amplitude,
            waveform,
        } = *self
        else {
            return None;
        };
        let dt = grid.dt();
        let scale = amplitude * dt / (MU0 * grid.dx()) * waveform.evaluate(tick as f64 * dt, dt);
        match direction {
            Direction::PositiveX => Some((column - 1, -scale)),
            Direction::NegativeX => Some((column, scale)),
        }
    }

    pub(crate) fn correct_magnetic(&self, fields: &mut FieldGrid, grid: &Grid, tick: usize) {
        if let Some((column, delta)) = self.magnetic_correction(grid, tick) {
            for j in 1..grid.ny().saturating_sub(1) {
                fields.hy[[column, j]] += delta;
            }
        }
    }

    pub(crate) fn inject_electric(&self, fields: &mut FieldGrid, grid: &Grid, tick: usize) {
        let fp = self.footprint(grid);
        for i in fp.columns[0]..fp.columns[1] {
            for j in fp.rows[0]..fp.rows[1] {
                let delta = self.electric_increment(grid, tick, i, j);
                fields.add_ez(i, j, delta);
            }
        }
    }
}
