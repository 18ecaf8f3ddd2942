//! Finite-difference time-domain engine for the TMz polarisation.
//!
//! # Scheme
//!
//! Standard Yee leapfrog with `Ez` at integer times and `Hx`, `Hy` at
//! half-integer times. One call to [`FdtdEngine::step`] performs, in order:
//!
//! 1. Magnetic update from the curl of `Ez` (with PML loss when active).
//! 2. TF/SF correction of the `Hy` column adjacent to each plane-wave source.
//! 3. Electric update from the curl of `H`; PEC cells are forced to zero and
//!    the outer ring of `Ez` stays zero.
//! 4. Source injection into `Ez`.
//! 5. Exponential boundary damping (no-op for the PML).
//! 6. Intensity accumulation when the tick lies inside the window.
//! 7. Tick increment.
//!
//! # Stability
//!
//! [`FdtdEngine::run`] checks the peak `|Ez|` at a fixed interval. A
//! non-finite or out-of-bound peak moves the engine to
//! [`EngineState::Stopped`] and reports
//! [`SolverError::NumericInstability`]. A stopped engine refuses to run.

pub mod boundary;
pub mod pacing;
pub mod source;
mod update;

pub use boundary::{BoundaryConfig, BoundaryDamping};
pub use pacing::RealtimePacer;
pub use source::{Direction, Source, Waveform};

use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use yeewave_compute::{ComputeBackend, DeviceInfo, SerialBackend};

use crate::accumulator::{AccumulationWindow, IntensityAccumulator, IntensityMap};
use crate::fields::FieldGrid;
use crate::mask::ObstacleMask;
use crate::solver::{SolverError, StepObserver, TimeDomainSolver};
use crate::types::Grid;

fn default_interval() -> usize {
    100
}

fn default_bound() -> f64 {
    1e10
}

/// Divergence guard used by [`FdtdEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityCheck {
    /// Ticks between checks; 0 disables the periodic check.
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Largest tolerated `|Ez|`.
    #[serde(default = "default_bound")]
    pub bound: f64,
}

impl Default for StabilityCheck {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            bound: default_bound(),
        }
    }
}

/// Lifecycle of an engine. Construction through [`FdtdBuilder`] yields
/// `Ready`; the first step moves it to `Stepping`; a failed stability check
/// (or [`FdtdEngine::halt`]) moves it to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Ready,
    Stepping,
    Stopped,
}

/// Outcome of [`FdtdEngine::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub final_tick: usize,
    pub peak_ez: f64,
    pub energy: f64,
    pub elapsed_seconds: f64,
}

/// Configures and validates an [`FdtdEngine`].
pub struct FdtdBuilder {
    grid: Grid,
    boundary: BoundaryConfig,
    mask: Option<ObstacleMask>,
    sources: Vec<Source>,
    accumulation: Option<AccumulationWindow>,
    backend: Option<Arc<dyn ComputeBackend>>,
    stability: StabilityCheck,
    initial_ez: Option<Array2<f64>>,
}

impl FdtdBuilder {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            boundary: BoundaryConfig::None,
            mask: None,
            sources: Vec::new(),
            accumulation: None,
            backend: None,
            stability: StabilityCheck::default(),
            initial_ez: None,
        }
    }

    pub fn boundary(mut self, boundary: BoundaryConfig) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn obstacles(mut self, mask: ObstacleMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = Source>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn accumulation(mut self, window: AccumulationWindow) -> Self {
        self.accumulation = Some(window);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ComputeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn stability(mut self, stability: StabilityCheck) -> Self {
        self.stability = stability;
        self
    }

    /// Start from a non-zero `Ez` instead of quiescence.
    pub fn initial_field(mut self, ez: Array2<f64>) -> Self {
        self.initial_ez = Some(ez);
        self
    }

    pub fn build(self) -> Result<FdtdEngine, SolverError> {
        let grid = self.grid;
        let (nx, ny) = (grid.nx(), grid.ny());

        let boundary = BoundaryDamping::new(&self.boundary, &grid)?;

        let mask = match self.mask {
            Some(mask) if mask.dims() != (nx, ny) => {
                return Err(SolverError::Configuration(format!(
                    "obstacle mask is {:?}, grid is {:?}",
                    mask.dims(),
                    (nx, ny)
                )))
            }
            Some(mask) => mask,
            None => ObstacleMask::empty(nx, ny),
        };

        for source in &self.sources {
            source.validate(&grid)?;
        }

        let accumulator = self
            .accumulation
            .map(|window| IntensityAccumulator::new(window, &grid))
            .transpose()?;

        if !(self.stability.bound.is_finite() && self.stability.bound > 0.0) {
            return Err(SolverError::Configuration(format!(
                "stability bound must be positive, got {}",
                self.stability.bound
            )));
        }

        let mut fields = if boundary.is_split() {
            FieldGrid::with_split(nx, ny)?
        } else {
            FieldGrid::new(nx, ny)?
        };
        if let Some(ez) = &self.initial_ez {
            fields.load_ez(ez)?;
        }

        let backend = self.backend.unwrap_or_else(|| Arc::new(SerialBackend));

        log::debug!(
            "FDTD engine {}x{}, dt = {:.3e} s, boundary {:?}, {} source(s), {} PEC cell(s), backend {}",
            nx,
            ny,
            grid.dt(),
            self.boundary,
            self.sources.len(),
            mask.count(),
            backend.device_info().name
        );

        Ok(FdtdEngine {
            grid,
            boundary_config: self.boundary,
            boundary,
            fields,
            mask,
            sources: self.sources,
            accumulator,
            backend,
            stability: self.stability,
            tick: 0,
            state: EngineState::Ready,
            started: None,
        })
    }
}

/// Two-dimensional TMz FDTD engine.
pub struct FdtdEngine {
    grid: Grid,
    boundary_config: BoundaryConfig,
    boundary: BoundaryDamping,
    fields: FieldGrid,
    mask: ObstacleMask,
    sources: Vec<Source>,
    accumulator: Option<IntensityAccumulator>,
    backend: Arc<dyn ComputeBackend>,
    stability: StabilityCheck,
    tick: usize,
    state: EngineState,
    started: Option<Instant>,
}

impl FdtdEngine {
    pub fn builder(grid: Grid) -> FdtdBuilder {
        FdtdBuilder::new(grid)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn fields(&self) -> &FieldGrid {
        &self.fields
    }

    pub fn mask(&self) -> &ObstacleMask {
        &self.mask
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn boundary(&self) -> &BoundaryConfig {
        &self.boundary_config
    }

    pub fn damping(&self) -> &BoundaryDamping {
        &self.boundary
    }

    pub fn backend_info(&self) -> DeviceInfo {
        self.backend.device_info()
    }

    pub fn accumulator(&self) -> Option<&IntensityAccumulator> {
        self.accumulator.as_ref()
    }

    /// Log-intensity map of the accumulated window, if accumulation is configured.
    pub fn finalize_intensity(&self) -> Option<IntensityMap> {
        self.accumulator.as_ref().map(IntensityAccumulator::finalize)
    }

    /// Diagnostic field energy (see [`FieldGrid::energy`]).
    pub fn field_energy(&self) -> f64 {
        self.fields.energy(&self.grid)
    }

    pub fn peak_ez(&self) -> f64 {
        self.fields.peak_ez()
    }

    /// Wall-clock time since the first step.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Stop the engine; further runs fail with [`SolverError::Halted`].
    pub fn halt(&mut self) {
        self.state = EngineState::Stopped;
    }

    /// Advance one full timestep. A stopped engine is left untouched.
    pub fn step(&mut self) {
        if self.state == EngineState::Stopped {
            return;
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        if self.state == EngineState::Ready {
            self.state = EngineState::Stepping;
        }
        let backend = self.backend.as_ref();

        update::update_magnetic(&mut self.fields, &self.grid, &self.boundary, backend);
        for source in &self.sources {
            source.correct_magnetic(&mut self.fields, &self.grid, self.tick);
        }

        update::update_electric(&mut self.fields, &self.grid, &self.mask, &self.boundary, backend);
        for source in &self.sources {
            source.inject_electric(&mut self.fields, &self.grid, self.tick);
        }

        self.boundary.apply(&mut self.fields, backend);

        if let Some(acc) = self.accumulator.as_mut() {
            if acc.window().is_active(self.tick) {
                acc.accumulate(self.fields.ez_view());
            }
        }

        self.tick += 1;
    }

    /// Step only if `pacer` allows it at the current tick. Returns whether
    /// a step was taken.
    pub fn iterate_realtime(&mut self, pacer: &mut RealtimePacer) -> bool {
        if self.state == EngineState::Stopped || !pacer.should_step(self.tick) {
            return false;
        }
        self.step();
        true
    }

    /// Check the committed `Ez` against the stability bound, stopping the
    /// engine on failure.
    pub fn check_stability(&mut self) -> Result<(), SolverError> {
        let peak = self.fields.peak_ez();
        if peak.is_finite() && peak <= self.stability.bound {
            return Ok(());
        }
        self.state = EngineState::Stopped;
        log::error!(
            "Numerical instability at tick {}: peak |Ez| = {:.3e} (bound {:.1e})",
            self.tick,
            peak,
            self.stability.bound
        );
        Err(SolverError::NumericInstability {
            tick: self.tick,
            magnitude: peak,
        })
    }

    /// Advance `steps` ticks, notifying `observers` after each one.
    pub fn run(
        &mut self,
        steps: usize,
        observers: &mut [&mut dyn StepObserver],
    ) -> Result<RunSummary, SolverError> {
        if self.state == EngineState::Stopped {
            return Err(SolverError::Halted { tick: self.tick });
        }
        let wall = Instant::now();
        let interval = self.stability.interval;
        for _ in 0..steps {
            self.step();
            for observer in observers.iter_mut() {
                observer.on_step(&*self);
            }
            if interval > 0 && self.tick % interval == 0 {
                self.check_stability()?;
            }
        }
        self.check_stability()?;

        let summary = RunSummary {
            steps,
            final_tick: self.tick,
            peak_ez: self.peak_ez(),
            energy: self.field_energy(),
            elapsed_seconds: wall.elapsed().as_secs_f64(),
        };
        log::info!(
            "Ran {} step(s) to tick {} in {:.2} s (peak |Ez| = {:.3e})",
            summary.steps,
            summary.final_tick,
            summary.elapsed_seconds,
            summary.peak_ez
        );
        Ok(summary)
    }
}

impl TimeDomainSolver for FdtdEngine {
    fn step(&mut self) {
        FdtdEngine::step(self);
    }

    fn tick(&self) -> usize {
        self.tick
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn electric_field(&self) -> ArrayView2<'_, f64> {
        self.fields.ez_view()
    }

    fn method_name(&self) -> &str {
        "FDTD (Yee, TMz)"
    }
}
