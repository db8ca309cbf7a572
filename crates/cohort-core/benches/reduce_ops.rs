//! Benchmarks for team reductions
//!
//! Compares ordered and tree reductions over scalar and packed sources as
//! the range and team size grow.

use cohort_backends::{CpuLauncher, DeviceProfile, SerialTeam, TeamPolicy};
use cohort_core::{pack_scalars, Pack, ReductionMode, TeamReducer, View};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn benchmark_serial_team_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_team_reduce");
    let team = SerialTeam::new();

    for size in [64, 1024, 16384].iter() {
        let values: Vec<f64> = (0..*size).map(|k| 1.0 / (k as f64 + 1.0)).collect();
        group.throughput(Throughput::Elements(*size as u64));

        for mode in [ReductionMode::Ordered, ReductionMode::Tree] {
            let reducer = TeamReducer::new(mode);
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), size, |b, &size| {
                b.iter(|| reducer.reduce(&team, 0..size, 0.0, |k| black_box(values[k])));
            });
        }
    }

    group.finish();
}

fn benchmark_packed_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("packed_reduce");
    let team = SerialTeam::new();

    for size in [63, 1023, 16383].iter() {
        let values: Vec<f64> = (0..*size).map(|k| k as f64).collect();
        let packs: Vec<Pack<f64, 8>> = pack_scalars(&values);
        let view = View::new(&packs);
        group.throughput(Throughput::Elements(*size as u64));

        for mode in [ReductionMode::Ordered, ReductionMode::Tree] {
            let reducer = TeamReducer::new(mode);
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), size, |b, &size| {
                b.iter(|| reducer.reduce_view(&team, 1..size, 0.0, &view));
            });
        }
    }

    group.finish();
}

fn benchmark_threaded_team_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("threaded_team_reduce");
    let launcher = CpuLauncher::new(DeviceProfile::threads(8));
    let values: Vec<f64> = (0..4096).map(|k| 1.0 / (k as f64 + 1.0)).collect();

    for team_size in [1, 2, 4, 8].iter() {
        let policy = TeamPolicy::new(64, *team_size).unwrap();
        group.throughput(Throughput::Elements(64 * values.len() as u64));

        for mode in [ReductionMode::Ordered, ReductionMode::Tree] {
            let reducer = TeamReducer::new(mode);
            group.bench_with_input(BenchmarkId::new(mode.as_str(), team_size), team_size, |b, _| {
                b.iter(|| {
                    launcher
                        .parallel_for(&policy, |team| {
                            black_box(reducer.reduce(team, 0..values.len(), 0.0, |k| values[k]));
                        })
                        .unwrap();
                });
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_serial_team_reduce,
    benchmark_packed_reduce,
    benchmark_threaded_team_reduce
);
criterion_main!(benches);
