//! Rasterisation of obstacles into a boolean cell mask.

use ndarray::Array2;

use crate::obstacles::Obstacle;
use crate::GeometryError;

/// Materialise the union of `obstacles` as an `nx` x `ny` mask indexed
/// `[[i, j]]`. Every obstacle is validated against the grid first.
pub fn rasterise(obstacles: &[Obstacle], nx: usize, ny: usize) -> Result<Array2<bool>, GeometryError> {
    for obstacle in obstacles {
        obstacle.validate(nx, ny)?;
    }
    Ok(Array2::from_shape_fn((nx, ny), |(i, j)| {
        obstacles.iter().any(|o| o.contains(i, j))
    }))
}
