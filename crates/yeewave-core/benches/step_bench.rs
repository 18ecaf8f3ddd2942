//! Criterion benchmarks for one FDTD step across boundaries and backends.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use yeewave_compute::{ComputeBackend, CpuBackend, SerialBackend};
use yeewave_core::solver::fdtd::{BoundaryConfig, FdtdEngine, Source};
use yeewave_core::types::Grid;

fn engine(n: usize, boundary: BoundaryConfig, backend: Arc<dyn ComputeBackend>) -> FdtdEngine {
    let grid = Grid::new(n, n, 1e-3, 1e-3, 2.2).unwrap();
    FdtdEngine::builder(grid)
        .boundary(boundary)
        .backend(backend)
        .source(Source::Broadside {
            column: n / 4,
            frequency: 3e10,
            amplitude: 1.0,
        })
        .build()
        .unwrap()
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("fdtd_step");
    for &n in &[128usize, 512] {
        let cases: [(&str, BoundaryConfig, Arc<dyn ComputeBackend>); 3] = [
            (
                "exponential/serial",
                BoundaryConfig::Exponential { thickness: 10, decay: 0.02 },
                Arc::new(SerialBackend),
            ),
            (
                "pml/serial",
                BoundaryConfig::SplitFieldPml { thickness: 10, grading: 3, reflection: 1e-6 },
                Arc::new(SerialBackend),
            ),
            (
                "exponential/cpu",
                BoundaryConfig::Exponential { thickness: 10, decay: 0.02 },
                Arc::new(CpuBackend::new()),
            ),
        ];
        for (label, boundary, backend) in cases {
            let mut e = engine(n, boundary, backend);
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| {
                    e.step();
                    black_box(e.tick())
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
