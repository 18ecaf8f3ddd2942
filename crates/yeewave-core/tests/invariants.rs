//! Integration tests: structural invariants of the FDTD engine.
//!
//! These hold for every configuration regardless of the physics being
//! simulated: quiescence, zeroed edges and PEC cells, exact split-field
//! bookkeeping, causality of the stencil, discrete energy conservation and
//! determinism across compute backends.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2};
use yeewave_compute::CpuBackend;
use yeewave_core::constants::{EPS0, MU0};
use yeewave_core::mask::ObstacleMask;
use yeewave_core::solver::fdtd::{BoundaryConfig, FdtdEngine, Source, Waveform};
use yeewave_core::solver::TimeDomainSolver;
use yeewave_core::types::Grid;

fn grid(nx: usize, ny: usize) -> Grid {
    Grid::new(nx, ny, 1e-3, 1e-3, 2.2).unwrap()
}

fn pulse(position: [usize; 2]) -> Source {
    Source::Point {
        position,
        amplitude: 1.0,
        waveform: Waveform::Gaussian { t0: 25.0, spread: 8.0 },
    }
}

fn boundaries() -> Vec<BoundaryConfig> {
    vec![
        BoundaryConfig::None,
        BoundaryConfig::Exponential { thickness: 8, decay: 0.02 },
        BoundaryConfig::SplitFieldPml { thickness: 8, grading: 3, reflection: 1e-6 },
    ]
}

fn edges_are_zero(ez: ArrayView2<'_, f64>) -> bool {
    let (nx, ny) = ez.dim();
    (0..nx).all(|i| ez[[i, 0]] == 0.0 && ez[[i, ny - 1]] == 0.0)
        && (0..ny).all(|j| ez[[0, j]] == 0.0 && ez[[nx - 1, j]] == 0.0)
}

#[test]
fn test_quiescent_grid_stays_zero() {
    for boundary in boundaries() {
        let mut engine = FdtdEngine::builder(grid(40, 32)).boundary(boundary.clone()).build().unwrap();
        for _ in 0..300 {
            engine.step();
            let f = engine.fields();
            assert!(f.ez_view().iter().all(|&v| v == 0.0), "{:?}", boundary);
            assert!(f.hx_view().iter().all(|&v| v == 0.0));
            assert!(f.hy_view().iter().all(|&v| v == 0.0));
        }
    }
}

#[test]
fn test_outer_ring_stays_zero() {
    for boundary in boundaries() {
        let mut engine = FdtdEngine::builder(grid(50, 40))
            .boundary(boundary.clone())
            .source(pulse([20, 18]))
            .build()
            .unwrap();
        for _ in 0..250 {
            engine.step();
            assert!(edges_are_zero(engine.electric_field()), "{:?}", boundary);
        }
        assert!(engine.peak_ez() > 0.0);
    }
}

#[test]
fn test_pec_cells_are_exactly_zero() {
    let mask = ObstacleMask::from_predicate(60, 50, |i, j| (30..34).contains(&i) && (10..40).contains(&j));
    for boundary in boundaries() {
        let mut engine = FdtdEngine::builder(grid(60, 50))
            .boundary(boundary.clone())
            .obstacles(mask.clone())
            .source(pulse([20, 25]))
            .build()
            .unwrap();
        for _ in 0..300 {
            engine.step();
            let ez = engine.electric_field();
            for i in 30..34 {
                for j in 10..40 {
                    assert_eq!(ez[[i, j]], 0.0, "{:?} at ({}, {})", boundary, i, j);
                }
            }
        }
        // Something actually reached the far side of the block.
        assert!(engine.electric_field()[[40, 25]].abs() > 0.0);
    }
}

#[test]
fn test_split_field_sum_is_exact() {
    let mut engine = FdtdEngine::builder(grid(60, 60))
        .boundary(BoundaryConfig::SplitFieldPml { thickness: 10, grading: 3, reflection: 1e-6 })
        .source(pulse([30, 30]))
        .source(Source::Broadside { column: 45, frequency: 2e10, amplitude: 0.5 })
        .build()
        .unwrap();
    for _ in 0..200 {
        engine.step();
        let f = engine.fields();
        let (ezx, ezy) = f.split_views().unwrap();
        for ((&e, &x), &y) in f.ez_view().iter().zip(ezx.iter()).zip(ezy.iter()) {
            assert_eq!(e, x + y);
        }
    }
}

#[test]
fn test_stencil_is_causal() {
    // The Yee stencil moves information one cell (Manhattan) per step.
    let (ci, cj) = (40usize, 40usize);
    let mut engine = FdtdEngine::builder(grid(81, 81)).source(pulse([ci, cj])).build().unwrap();
    for steps in 1..=30usize {
        engine.step();
        let ez = engine.electric_field();
        for ((i, j), &v) in ez.indexed_iter() {
            if i.abs_diff(ci) + j.abs_diff(cj) >= steps {
                assert_eq!(v, 0.0, "step {} cell ({}, {})", steps, i, j);
            }
        }
    }
}

#[test]
fn test_leapfrog_energy_is_conserved() {
    // With PEC edges, no sources and no absorber the Yee scheme conserves
    // W = μ0 ‖H^{n+½}‖² + ε0 ⟨E^n, E^{n+1}⟩ to round-off.
    let (nx, ny) = (64, 56);
    let mut ez0 = Array2::zeros((nx, ny));
    for i in 1..nx - 1 {
        for j in 1..ny - 1 {
            let (x, y) = (i as f64 - 30.0, j as f64 - 25.0);
            ez0[[i, j]] = (-(x * x + y * y) / 18.0).exp();
        }
    }
    let mut engine = FdtdEngine::builder(grid(nx, ny)).initial_field(ez0).build().unwrap();

    let staggered_energy = |engine: &FdtdEngine, previous: &Array2<f64>| {
        let f = engine.fields();
        let magnetic: f64 =
            f.hx_view().iter().map(|h| h * h).sum::<f64>() + f.hy_view().iter().map(|h| h * h).sum::<f64>();
        let electric: f64 = previous.iter().zip(f.ez_view().iter()).map(|(a, b)| a * b).sum();
        MU0 * magnetic + EPS0 * electric
    };

    let mut previous = engine.fields().ez_view().to_owned();
    engine.step();
    let reference = staggered_energy(&engine, &previous);
    assert!(reference > 0.0);

    for _ in 0..600 {
        previous = engine.fields().ez_view().to_owned();
        engine.step();
        let w = staggered_energy(&engine, &previous);
        assert!(
            ((w - reference) / reference).abs() < 1e-9,
            "energy drifted from {:e} to {:e} at tick {}",
            reference,
            w,
            engine.tick()
        );
    }
}

#[test]
fn test_runs_are_deterministic() {
    let build = || {
        FdtdEngine::builder(grid(70, 50))
            .boundary(BoundaryConfig::Exponential { thickness: 10, decay: 0.02 })
            .source(pulse([35, 25]))
            .source(Source::Oblique {
                column: 15,
                rows: [12, 38],
                reference_row: None,
                frequency: 3e10,
                angle_deg: 12.0,
                amplitude: 1.0,
            })
            .build()
            .unwrap()
    };
    let mut a = build();
    let mut b = build();
    for _ in 0..200 {
        a.step();
        b.step();
        assert_eq!(a.electric_field(), b.electric_field());
    }
}

#[test]
fn test_parallel_backend_matches_serial_bitwise() {
    for boundary in boundaries() {
        let build = |parallel: bool| {
            let mut builder = FdtdEngine::builder(grid(64, 48))
                .boundary(boundary.clone())
                .source(pulse([32, 24]))
                .source(Source::Tfsf {
                    column: 50,
                    direction: yeewave_core::solver::fdtd::Direction::NegativeX,
                    amplitude: 1.0,
                    waveform: Waveform::Gaussian { t0: 40.0, spread: 10.0 },
                });
            if parallel {
                builder = builder.backend(Arc::new(CpuBackend::with_threads(3).unwrap()));
            }
            builder.build().unwrap()
        };
        let mut serial = build(false);
        let mut parallel = build(true);
        assert_ne!(serial.backend_info().name, parallel.backend_info().name);
        for _ in 0..150 {
            serial.step();
            parallel.step();
        }
        assert_eq!(serial.fields().ez_view(), parallel.fields().ez_view(), "{:?}", boundary);
        assert_eq!(serial.fields().hx_view(), parallel.fields().hx_view());
        assert_eq!(serial.fields().hy_view(), parallel.fields().hy_view());
    }
}
