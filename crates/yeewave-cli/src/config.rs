//! TOML configuration deserialisation for simulation jobs.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use yeewave_core::accumulator::AccumulationWindow;
use yeewave_core::frame::FrameScaling;
use yeewave_core::solver::fdtd::{BoundaryConfig, Source, StabilityCheck};
use yeewave_core::solver::SolverError;
use yeewave_core::types::Grid;
use yeewave_geometry::obstacles::Obstacle;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub grid: GridConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<Source>,
    #[serde(default, rename = "obstacle")]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub accumulation: Option<AccumulationWindow>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Grid discretisation from TOML.
#[derive(Debug, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    /// Cell pitch along x (m).
    pub dx: f64,
    /// Cell pitch along y (m); defaults to `dx`.
    #[serde(default)]
    pub dy: Option<f64>,
    #[serde(default = "default_courant_factor")]
    pub courant_factor: f64,
    /// Explicit timestep (s); overrides `courant_factor` when present.
    #[serde(default)]
    pub dt: Option<f64>,
}

fn default_courant_factor() -> f64 {
    2.2
}

impl GridConfig {
    pub fn build(&self) -> Result<Grid, SolverError> {
        let dy = self.dy.unwrap_or(self.dx);
        match self.dt {
            Some(dt) => Grid::with_timestep(self.nx, self.ny, self.dx, dy, dt),
            None => Grid::new(self.nx, self.ny, self.dx, dy, self.courant_factor),
        }
    }
}

/// Run parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    pub steps: usize,
    /// Compute backend: "serial", "cpu", or "auto". Default: "auto".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Worker threads for the CPU backend (global pool when absent).
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub stability: StabilityCheck,
    /// Pace the run to this many ticks per second of wall time.
    #[serde(default)]
    pub realtime_tps: Option<f64>,
}

fn default_backend() -> String {
    "auto".into()
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Write an `Ez` frame every this many steps; 0 disables frames.
    #[serde(default)]
    pub frame_stride: usize,
    #[serde(default)]
    pub frame_scaling: FrameScaling,
    /// Log progress every this many steps (default: 500).
    #[serde(default = "default_progress_stride")]
    pub progress_stride: usize,
    /// File stem of the intensity image (default: "intensity").
    #[serde(default = "default_intensity_stem")]
    pub intensity_stem: String,
    /// Whether to write `summary.json` (default: true).
    #[serde(default = "default_true")]
    pub summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            frame_stride: 0,
            frame_scaling: FrameScaling::default(),
            progress_stride: default_progress_stride(),
            intensity_stem: default_intensity_stem(),
            summary: true,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

fn default_progress_stride() -> usize {
    500
}

fn default_intensity_stem() -> String {
    "intensity".into()
}

fn default_true() -> bool {
    true
}

/// Parse a job from TOML text.
pub fn parse_config(content: &str) -> anyhow::Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use yeewave_core::solver::fdtd::{Direction, Waveform};

    const MINIMAL: &str = r#"
        [grid]
        nx = 64
        ny = 48
        dx = 1.0e-3

        [simulation]
        steps = 10
    "#;

    #[test]
    fn test_defaults() {
        let job = parse_config(MINIMAL).unwrap();
        assert_eq!(job.simulation.backend, "auto");
        assert_eq!(job.simulation.stability, StabilityCheck::default());
        assert_eq!(job.boundary, BoundaryConfig::default());
        assert!(job.sources.is_empty() && job.obstacles.is_empty());
        assert!(job.accumulation.is_none());
        assert_eq!(job.output.frame_stride, 0);
        assert!(job.output.summary);

        let grid = job.grid.build().unwrap();
        assert_eq!(grid.dy(), grid.dx());
        assert_relative_eq!(grid.dt(), 1e-3 / (2.2 * yeewave_core::constants::C0), max_relative = 1e-14);
    }

    #[test]
    fn test_full_job() {
        let job = parse_config(
            r#"
            [grid]
            nx = 100
            ny = 80
            dx = 1.0e-3
            dy = 2.0e-3
            dt = 1.0e-12

            [simulation]
            steps = 20
            backend = "serial"
            stability = { interval = 5 }

            [boundary]
            type = "split_field_pml"
            thickness = 8

            [[source]]
            type = "tfsf"
            column = 80
            direction = "negative_x"
            waveform = { kind = "gaussian", t0 = 30.0, spread = 10.0 }

            [[source]]
            type = "patch"
            origin = [10, 10]
            size = [2, 3]
            frequency = 1.0e10
            phase = 0.5

            [[obstacle]]
            type = "mirror_row"
            row = 5

            [accumulation]
            start = 10
            region = { columns = [20, 60], rows = [10, 70] }

            [output]
            frame_stride = 5
            frame_scaling = "normalized"
            "#,
        )
        .unwrap();
        assert_eq!(job.sources.len(), 2);
        assert_eq!(
            job.sources[0],
            Source::Tfsf {
                column: 80,
                direction: Direction::NegativeX,
                amplitude: 1.0,
                waveform: Waveform::Gaussian { t0: 30.0, spread: 10.0 },
            }
        );
        assert_eq!(job.simulation.stability.interval, 5);
        assert_eq!(job.simulation.stability.bound, 1e10);
        assert_eq!(job.output.frame_scaling, FrameScaling::Normalized);
        let grid = job.grid.build().unwrap();
        assert_eq!(grid.dt(), 1e-12);
        assert_eq!(grid.dy(), 2e-3);
    }

    #[test]
    fn test_courant_violation_reported() {
        let job = parse_config(
            r#"
            [grid]
            nx = 10
            ny = 10
            dx = 1.0e-3
            dt = 1.0e-9

            [simulation]
            steps = 1
            "#,
        )
        .unwrap();
        assert!(matches!(job.grid.build(), Err(SolverError::CourantViolation { .. })));
    }

    #[test]
    fn test_unknown_source_type_rejected() {
        let text = format!("{}\n[[source]]\ntype = \"laser\"\ncolumn = 3\n", MINIMAL);
        assert!(parse_config(&text).is_err());
    }
}
