//! Time-domain solver abstraction.
//!
//! The [`TimeDomainSolver`] trait is the surface that observers, frame
//! recorders and the CLI program against. [`fdtd::FdtdEngine`] is the one
//! implementation: a leapfrog Yee scheme for the TMz polarisation.

pub mod fdtd;

use ndarray::ArrayView2;
use thiserror::Error;

use crate::types::Grid;

/// Errors raised while configuring or advancing a solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Invalid grid dimensions {nx}x{ny}: both must be at least 1")]
    InvalidDimension { nx: usize, ny: usize },

    #[error("Timestep {dt:.3e} s exceeds the Courant limit {limit:.3e} s")]
    CourantViolation { dt: f64, limit: f64 },

    #[error("{component}[{i}, {j}] is outside the {nx}x{ny} array")]
    IndexOutOfBounds {
        component: &'static str,
        i: usize,
        j: usize,
        nx: usize,
        ny: usize,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Numerical instability at tick {tick}: peak |Ez| = {magnitude:.3e}")]
    NumericInstability { tick: usize, magnitude: f64 },

    #[error("Solver halted at tick {tick} and cannot advance")]
    Halted { tick: usize },
}

/// A solver that advances fields in discrete time ticks.
pub trait TimeDomainSolver {
    /// Advance the fields by one full timestep.
    fn step(&mut self);

    /// Number of completed steps.
    fn tick(&self) -> usize;

    /// Discretisation the solver runs on.
    fn grid(&self) -> &Grid;

    /// Committed out-of-plane electric field, shape `(nx, ny)`.
    fn electric_field(&self) -> ArrayView2<'_, f64>;

    /// Human-readable name of the solver method.
    fn method_name(&self) -> &str;
}

/// Hook invoked after every completed step of a run.
///
/// Observers see the solver between steps only, never a partially updated
/// field.
pub trait StepObserver {
    fn on_step(&mut self, solver: &dyn TimeDomainSolver);
}
