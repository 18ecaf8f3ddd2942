//! Simulation runner: builds the engine from a job, drives it, and writes
//! frames, the intensity image and a JSON summary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use yeewave_compute::{ComputeBackend, SerialBackend};
use yeewave_core::accumulator::IntensityMap;
use yeewave_core::frame::{Frame, FrameRecorder, FrameScaling, FrameSink, ProgressLogger, SinkError};
use yeewave_core::mask::ObstacleMask;
use yeewave_core::solver::fdtd::{BoundaryConfig, EngineState, FdtdEngine, RealtimePacer, RunSummary};
use yeewave_core::solver::{SolverError, StepObserver};
use yeewave_core::types::{Grid, Region};
use yeewave_geometry::rasterise::rasterise;

use crate::config::JobConfig;
use crate::sink::PngSink;

/// Everything written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub grid: Grid,
    pub boundary: BoundaryConfig,
    pub backend: String,
    pub sources: usize,
    pub pec_cells: usize,
    pub run: RunSummary,
    pub frames_written: usize,
    pub frames_failed: usize,
    pub intensity: Option<IntensityReport>,
}

#[derive(Debug, Serialize)]
pub struct IntensityReport {
    pub region: Region,
    pub samples: usize,
    pub peak: f64,
    /// Absent when the image could not be written.
    pub image: Option<PathBuf>,
}

/// Select a compute backend by name.
pub fn create_backend(preference: &str, threads: Option<usize>) -> Result<Arc<dyn ComputeBackend>> {
    let backend: Arc<dyn ComputeBackend> = match preference {
        "serial" => Arc::new(SerialBackend),
        "cpu" | "auto" => {
            #[cfg(feature = "cpu")]
            {
                match threads {
                    Some(n) => Arc::new(yeewave_compute::CpuBackend::with_threads(n)?),
                    None => Arc::new(yeewave_compute::CpuBackend::new()),
                }
            }
            #[cfg(not(feature = "cpu"))]
            {
                if preference == "cpu" {
                    bail!("CPU backend requested but binary was built without --features cpu");
                }
                let _ = threads;
                Arc::new(SerialBackend)
            }
        }
        other => bail!("unknown backend '{}' (expected serial, cpu or auto)", other),
    };
    Ok(backend)
}

/// Build a ready-to-run engine from a job description.
pub fn build_engine(job: &JobConfig) -> Result<FdtdEngine> {
    let grid = job.grid.build().context("invalid [grid]")?;
    let cells = rasterise(&job.obstacles, grid.nx(), grid.ny()).context("invalid [[obstacle]]")?;
    let backend = create_backend(&job.simulation.backend, job.simulation.threads)?;

    let mut builder = FdtdEngine::builder(grid)
        .boundary(job.boundary.clone())
        .obstacles(ObstacleMask::from_array(cells))
        .sources(job.sources.iter().cloned())
        .stability(job.simulation.stability)
        .backend(backend);
    if let Some(window) = job.accumulation {
        builder = builder.accumulation(window);
    }
    Ok(builder.build()?)
}

/// Step `engine` for `steps` ticks at `ticks_per_second`, checking stability
/// at the configured interval.
fn run_paced(
    engine: &mut FdtdEngine,
    steps: usize,
    ticks_per_second: f64,
    stability_interval: usize,
    observers: &mut [&mut dyn StepObserver],
) -> Result<RunSummary, SolverError> {
    if engine.state() == EngineState::Stopped {
        return Err(SolverError::Halted { tick: engine.tick() });
    }
    let wall = Instant::now();
    let target = engine.tick() + steps;
    let mut pacer = RealtimePacer::new(ticks_per_second);
    while engine.tick() < target {
        if !engine.iterate_realtime(&mut pacer) {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }
        for observer in observers.iter_mut() {
            observer.on_step(&*engine);
        }
        if stability_interval > 0 && engine.tick() % stability_interval == 0 {
            engine.check_stability()?;
        }
    }
    engine.check_stability()?;
    Ok(RunSummary {
        steps,
        final_tick: engine.tick(),
        peak_ez: engine.peak_ez(),
        energy: engine.field_energy(),
        elapsed_seconds: wall.elapsed().as_secs_f64(),
    })
}

fn write_intensity(
    map: &IntensityMap,
    grid: &Grid,
    sink: &mut PngSink,
    stem: &str,
) -> Result<PathBuf, SinkError> {
    let full = map.embed(grid.nx(), grid.ny());
    let frame = Frame::new(stem, full.view(), FrameScaling::Normalized);
    sink.write_frame(&frame)?;
    Ok(sink.path_for(stem))
}

/// Write `report` as pretty JSON.
pub fn write_summary_json(report: &RunReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;
    println!("Summary written to: {}", path.display());
    Ok(())
}

/// Run `job` to completion, writing all outputs below `out_dir`.
pub fn run_job(job: &JobConfig, out_dir: &Path) -> Result<RunReport> {
    let mut engine = build_engine(job)?;
    let grid = *engine.grid();
    println!(
        "Grid {}x{}, dx = {:.3e} m, dt = {:.3e} s, {} steps",
        grid.nx(),
        grid.ny(),
        grid.dx(),
        grid.dt(),
        job.simulation.steps
    );
    println!("Backend: {}", engine.backend_info().name);

    let output = &job.output;
    let mut progress = ProgressLogger::new(output.progress_stride).with_total(job.simulation.steps);
    let mut recorder = FrameRecorder::new(PngSink::new(out_dir.join("frames")), output.frame_stride)
        .with_scaling(output.frame_scaling);

    let summary = {
        let mut observers: Vec<&mut dyn StepObserver> = vec![&mut progress as &mut dyn StepObserver];
        if output.frame_stride > 0 {
            observers.push(&mut recorder);
        }
        match job.simulation.realtime_tps {
            Some(tps) => run_paced(
                &mut engine,
                job.simulation.steps,
                tps,
                job.simulation.stability.interval,
                &mut observers,
            )?,
            None => engine.run(job.simulation.steps, &mut observers)?,
        }
    };
    if recorder.failed() > 0 {
        log::warn!("{} frame(s) could not be written", recorder.failed());
    }

    let mut sink = PngSink::new(out_dir);
    log::debug!("Writing outputs to {}", sink.directory().display());
    let intensity = match engine.finalize_intensity() {
        Some(map) => {
            let image = match write_intensity(&map, &grid, &mut sink, &output.intensity_stem) {
                Ok(path) => {
                    println!("Intensity map ({} samples) written to: {}", map.samples, path.display());
                    Some(path)
                }
                Err(e) => {
                    log::warn!(
                        "Failed to write intensity image {}: {}",
                        sink.path_for(&output.intensity_stem).display(),
                        e
                    );
                    None
                }
            };
            Some(IntensityReport {
                region: map.region,
                samples: map.samples,
                peak: map.peak(),
                image,
            })
        }
        None => None,
    };

    let report = RunReport {
        grid,
        boundary: job.boundary.clone(),
        backend: engine.backend_info().name,
        sources: engine.sources().len(),
        pec_cells: engine.mask().count(),
        run: summary,
        frames_written: recorder.written(),
        frames_failed: recorder.failed(),
        intensity,
    };
    if output.summary {
        write_summary_json(&report, &out_dir.join("summary.json"))?;
    }
    Ok(report)
}
