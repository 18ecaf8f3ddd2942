//! Absorbing boundary treatments.
//!
//! Two absorbers are available:
//!
//! - **Exponential damping**: after each step every `Ez` sample is scaled by
//!   `damp_x[i] · damp_y[j]`, where the profile is
//!   `exp(−decay · (thickness − k))` inside a layer of `thickness` cells on
//!   each face and exactly 1 in the interior. Cheap, but only moderately
//!   absorbing.
//! - **Split-field PML** (Bérenger): `Ez` is split into `Ezx + Ezy`, each
//!   attenuated by a conductivity graded as `σ_max · (depth/thickness)^m`
//!   along its own axis. The magnetic update carries the matched magnetic
//!   loss `σ* = σ μ0/ε0`, evaluated at the half-cell positions of `Hx` and
//!   `Hy`, which makes the layer reflectionless at normal incidence in the
//!   continuum limit.
//!
//! Both treatments are expressed through [`AxisCoefficients`]: a
//! per-position `(decay, gain)` pair so the update kernels stay uniform.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use yeewave_compute::ComputeBackend;

use crate::constants::{EPS0, ETA0, MU0};
use crate::fields::FieldGrid;
use crate::solver::SolverError;
use crate::types::Grid;

fn default_decay() -> f64 {
    0.02
}

fn default_grading() -> i32 {
    3
}

fn default_reflection() -> f64 {
    1e-6
}

/// User-facing boundary selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryConfig {
    /// Plain Dirichlet `Ez = 0` on the outer ring, fully reflecting.
    None,
    /// Exponential `Ez` damping layer.
    Exponential {
        thickness: usize,
        #[serde(default = "default_decay")]
        decay: f64,
    },
    /// Split-field perfectly matched layer.
    SplitFieldPml {
        thickness: usize,
        /// Polynomial grading order `m`.
        #[serde(default = "default_grading")]
        grading: i32,
        /// Target normal-incidence reflection coefficient `R`.
        #[serde(default = "default_reflection")]
        reflection: f64,
    },
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::Exponential {
            thickness: 10,
            decay: default_decay(),
        }
    }
}

impl BoundaryConfig {
    /// Layer thickness in cells (0 for [`BoundaryConfig::None`]).
    pub fn thickness(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Exponential { thickness, .. } | Self::SplitFieldPml { thickness, .. } => *thickness,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Self::SplitFieldPml { .. })
    }
}

/// Per-position update coefficients along one axis:
/// `field ← decay[k] · field + gain[k] · curl`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCoefficients {
    pub decay: Array1<f64>,
    pub gain: Array1<f64>,
}

impl AxisCoefficients {
    /// Lossless coefficients: `decay = 1`, constant `gain`.
    pub fn uniform(len: usize, gain: f64) -> Self {
        Self {
            decay: Array1::ones(len),
            gain: Array1::from_elem(len, gain),
        }
    }

    /// Semi-implicit lossy coefficients for conductivity `sigma[k]`:
    /// `decay = (1 − q)/(1 + q)`, `gain = (dt/material)/(1 + q)` with
    /// `q = σ·dt/(2ε0)`.
    pub fn lossy(sigma: &Array1<f64>, dt: f64, material: f64) -> Self {
        let q = sigma.mapv(|s| s * dt / (2.0 * EPS0));
        Self {
            decay: q.mapv(|q| (1.0 - q) / (1.0 + q)),
            gain: q.mapv(|q| (dt / material) / (1.0 + q)),
        }
    }

    pub fn len(&self) -> usize {
        self.decay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decay.is_empty()
    }
}

/// Multiplicative `Ez` damping profile of length `n`.
pub fn exponential_profile(n: usize, thickness: usize, decay: f64) -> Array1<f64> {
    let mut profile = Array1::ones(n);
    for k in 0..thickness.min(n) {
        let d = (-decay * (thickness - k) as f64).exp();
        profile[k] = d;
        profile[n - 1 - k] = d;
    }
    profile
}

/// Depth into the absorbing layer of a (possibly half-integer) position
/// along an axis of `n` cells. Zero in the interior.
fn layer_depth(position: f64, n: usize, thickness: usize) -> f64 {
    let t = thickness as f64;
    let high = (n as f64 - 1.0) - t;
    if position < t {
        t - position
    } else if position > high {
        position - high
    } else {
        0.0
    }
}

/// Graded PML conductivity sampled at `offset, offset + 1, …` for `len`
/// positions.
pub fn conductivity_profile(
    len: usize,
    offset: f64,
    n: usize,
    thickness: usize,
    sigma_max: f64,
    grading: i32,
) -> Array1<f64> {
    if thickness == 0 {
        return Array1::zeros(len);
    }
    Array1::from_shape_fn(len, |k| {
        let depth = layer_depth(k as f64 + offset, n, thickness);
        sigma_max * (depth / thickness as f64).powi(grading)
    })
}

/// Peak PML conductivity `−(m + 1) ln R / (2 η0 · thickness · Δ)`.
pub fn pml_sigma_max(grading: i32, reflection: f64, thickness: usize, pitch: f64) -> f64 {
    if thickness == 0 {
        return 0.0;
    }
    -f64::from(grading + 1) * reflection.ln() / (2.0 * ETA0 * thickness as f64 * pitch)
}

/// Exponential damping state.
#[derive(Debug, Clone)]
pub struct ExponentialLayer {
    pub thickness: usize,
    pub damp_x: Array1<f64>,
    pub damp_y: Array1<f64>,
}

/// Split-field PML state.
#[derive(Debug, Clone)]
pub struct PmlLayer {
    pub thickness: usize,
    pub sigma_max_x: f64,
    pub sigma_max_y: f64,
    /// `Ezx` coefficients, indexed by `i`.
    pub electric_x: AxisCoefficients,
    /// `Ezy` coefficients, indexed by `j`.
    pub electric_y: AxisCoefficients,
}

#[derive(Debug, Clone)]
pub enum Absorber {
    None,
    Exponential(ExponentialLayer),
    SplitFieldPml(PmlLayer),
}

/// Precomputed boundary coefficients for a specific grid.
#[derive(Debug, Clone)]
pub struct BoundaryDamping {
    absorber: Absorber,
    /// `Hy` coefficients at `i + ½`, length `nx − 1`.
    magnetic_x: AxisCoefficients,
    /// `Hx` coefficients at `j + ½`, length `ny − 1`.
    magnetic_y: AxisCoefficients,
}

impl BoundaryDamping {
    /// Validate `config` against `grid` and precompute its coefficients.
    pub fn new(config: &BoundaryConfig, grid: &Grid) -> Result<Self, SolverError> {
        let (nx, ny, dt) = (grid.nx(), grid.ny(), grid.dt());
        let thickness = config.thickness();
        if 2 * thickness > nx || 2 * thickness > ny {
            return Err(SolverError::Configuration(format!(
                "boundary layer of {} cells does not fit a {}x{} grid",
                thickness, nx, ny
            )));
        }
        let uniform_x = AxisCoefficients::uniform(nx.saturating_sub(1), dt / MU0);
        let uniform_y = AxisCoefficients::uniform(ny.saturating_sub(1), dt / MU0);

        let damping = match *config {
            BoundaryConfig::None => Self {
                absorber: Absorber::None,
                magnetic_x: uniform_x,
                magnetic_y: uniform_y,
            },
            BoundaryConfig::Exponential { thickness, decay } => {
                if !(decay.is_finite() && decay >= 0.0) {
                    return Err(SolverError::Configuration(format!(
                        "damping decay must be non-negative, got {}",
                        decay
                    )));
                }
                Self {
                    absorber: Absorber::Exponential(ExponentialLayer {
                        thickness,
                        damp_x: exponential_profile(nx, thickness, decay),
                        damp_y: exponential_profile(ny, thickness, decay),
                    }),
                    magnetic_x: uniform_x,
                    magnetic_y: uniform_y,
                }
            }
            BoundaryConfig::SplitFieldPml {
                thickness,
                grading,
                reflection,
            } => {
                if grading < 1 {
                    return Err(SolverError::Configuration(format!(
                        "PML grading order must be at least 1, got {}",
                        grading
                    )));
                }
                if !(reflection > 0.0 && reflection < 1.0) {
                    return Err(SolverError::Configuration(format!(
                        "PML reflection target must lie in (0, 1), got {}",
                        reflection
                    )));
                }
                let sigma_max_x = pml_sigma_max(grading, reflection, thickness, grid.dx());
                let sigma_max_y = pml_sigma_max(grading, reflection, thickness, grid.dy());

                let sx = conductivity_profile(nx, 0.0, nx, thickness, sigma_max_x, grading);
                let sy = conductivity_profile(ny, 0.0, ny, thickness, sigma_max_y, grading);
                let sx_half =
                    conductivity_profile(nx.saturating_sub(1), 0.5, nx, thickness, sigma_max_x, grading);
                let sy_half =
                    conductivity_profile(ny.saturating_sub(1), 0.5, ny, thickness, sigma_max_y, grading);

                Self {
                    absorber: Absorber::SplitFieldPml(PmlLayer {
                        thickness,
                        sigma_max_x,
                        sigma_max_y,
                        electric_x: AxisCoefficients::lossy(&sx, dt, EPS0),
                        electric_y: AxisCoefficients::lossy(&sy, dt, EPS0),
                    }),
                    magnetic_x: AxisCoefficients::lossy(&sx_half, dt, MU0),
                    magnetic_y: AxisCoefficients::lossy(&sy_half, dt, MU0),
                }
            }
        };
        Ok(damping)
    }

    pub fn absorber(&self) -> &Absorber {
        &self.absorber
    }

    pub fn is_split(&self) -> bool {
        matches!(self.absorber, Absorber::SplitFieldPml(_))
    }

    pub fn magnetic_x(&self) -> &AxisCoefficients {
        &self.magnetic_x
    }

    pub fn magnetic_y(&self) -> &AxisCoefficients {
        &self.magnetic_y
    }

    /// `(Ezx, Ezy)` coefficients when the split-field PML is active.
    pub fn split_electric(&self) -> Option<(&AxisCoefficients, &AxisCoefficients)> {
        match &self.absorber {
            Absorber::SplitFieldPml(pml) => Some((&pml.electric_x, &pml.electric_y)),
            _ => None,
        }
    }

    /// Post-step `Ez` damping. A no-op unless the exponential layer is
    /// active; the PML does its absorbing inside the updates.
    pub fn apply(&self, fields: &mut FieldGrid, backend: &dyn ComputeBackend) {
        let Absorber::Exponential(layer) = &self.absorber else {
            return;
        };
        if layer.thickness == 0 {
            return;
        }
        let (damp_x, damp_y) = (&layer.damp_x, &layer.damp_y);
        backend.for_each_row(fields.ez.view_mut(), &|i, mut row| {
            let fx = damp_x[i];
            for (j, ez) in row.iter_mut().enumerate() {
                *ez *= fx * damp_y[j];
            }
        });
    }
}
