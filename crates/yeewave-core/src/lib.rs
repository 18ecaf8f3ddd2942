//! # yeewave Core
//!
//! The numerical backbone of yeewave: a two-dimensional finite-difference
//! time-domain (FDTD) engine for the TMz polarisation (out-of-plane `Ez`,
//! in-plane `Hx`, `Hy`) on a staggered Yee grid.
//!
//! ## Architecture
//!
//! Time-domain solvers implement the [`solver::TimeDomainSolver`] trait,
//! which exposes stepping and read access to the committed field state. The
//! implementation is [`solver::fdtd::FdtdEngine`], configured through a
//! builder with a boundary treatment, PEC obstacles, a list of sources and an
//! optional intensity accumulator. Row updates are scheduled by a
//! [`yeewave_compute::ComputeBackend`].
//!
//! ## Modules
//!
//! - [`constants`]: Vacuum constants of the model.
//! - [`types`]: Grid discretisation and rectangular regions.
//! - [`fields`]: Yee field arrays, optionally split for PML.
//! - [`mask`]: PEC obstacle mask.
//! - [`accumulator`]: Time-averaged log-intensity accumulation.
//! - [`frame`]: Frame snapshots, grayscale mapping, sinks and observers.
//! - [`solver`]: Solver trait, errors, and the FDTD engine.

pub mod accumulator;
pub mod constants;
pub mod fields;
pub mod frame;
pub mod mask;
pub mod solver;
pub mod types;
