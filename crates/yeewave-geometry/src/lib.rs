//! # yeewave Geometry
//!
//! Obstacle handling for the yeewave FDTD engine. This crate provides:
//!
//! - **Obstacle primitives** ([`obstacles`]): slit screens, mirror planes,
//!   and rectangular blocks, all treated as perfect electric conductors.
//! - **Rasterisation** ([`rasterise`]): converts a set of obstacles into a
//!   boolean cell mask for a grid of a given size.

pub mod obstacles;
pub mod rasterise;

use thiserror::Error;

/// Errors raised while validating or rasterising obstacles.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{shape} lies outside the {nx}x{ny} grid: {detail}")]
    OutOfBounds {
        shape: &'static str,
        nx: usize,
        ny: usize,
        detail: String,
    },

    #[error("Invalid {shape}: {detail}")]
    InvalidShape { shape: &'static str, detail: String },
}
