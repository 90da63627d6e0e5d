use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scope_core::acquisition::{
    plan_reads, ChannelRetentionBuffer, RetentionStore, SampleExporter, WrapPolicy,
};
use scope_core::hal::simulator::{SimulatedScope, SimulatorConfig};
use scope_core::hal::{AcquisitionMode, ChannelConfig, ScopeDevice};

const CAPACITIES: &[usize] = &[1024, 8192, 32_768];
const BATCH_SIZES: &[usize] = &[64, 512, 4096];

fn benchmark_read_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_planning");

    for &capacity in CAPACITIES {
        group.bench_with_input(BenchmarkId::new("wrapped", capacity), &capacity, |b, &cap| {
            b.iter(|| {
                for read in (0..cap).step_by(97) {
                    let write = (read + cap / 2) % cap;
                    black_box(plan_reads(black_box(read), black_box(write), cap, WrapPolicy::InclusiveBoundary));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_retention(c: &mut Criterion) {
    let mut group = c.benchmark_group("retention");

    for &batch_size in BATCH_SIZES {
        let batch: Vec<f64> = (0..batch_size).map(|i| i as f64).collect();
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(BenchmarkId::new("append_evict", batch_size), &batch, |b, batch| {
            let mut buffer = ChannelRetentionBuffer::new(100_000);
            b.iter(|| buffer.append(black_box(batch)));
        });

        group.bench_with_input(BenchmarkId::new("store_two_channels", batch_size), &batch, |b, batch| {
            let store = RetentionStore::new(&[0, 1], 100_000);
            let entry = vec![(0, batch.clone()), (1, batch.clone())];
            b.iter(|| store.append_batch(black_box(&entry)));
        });
    }

    group.bench_function("drain_and_export_100k", |b| {
        let exporter = SampleExporter::new(100_000.0);
        let batch: Vec<f64> = (0..100_000).map(|i| i as f64).collect();
        let mut buffer = ChannelRetentionBuffer::new(100_000);
        b.iter(|| {
            buffer.append(&batch);
            black_box(exporter.export(0, buffer.drain()))
        });
    });

    group.finish();
}

fn benchmark_simulator_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator");

    for &batch_size in BATCH_SIZES {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::new("advance_and_read", batch_size), &batch_size, |b, &size| {
            let mut scope = SimulatedScope::new(SimulatorConfig::manual()).unwrap();
            scope
                .configure_channel(&ChannelConfig {
                    id: 0,
                    voltage_range_v: 5.0,
                    attenuation: 10.0,
                    sample_rate_hz: 100_000,
                    buffer_capacity: 8192,
                    mode: AcquisitionMode::ScanScreen,
                })
                .unwrap();
            scope.start().unwrap();
            let handle = scope.handle();

            b.iter(|| {
                handle.advance(size as u64);
                let write = scope.get_write_cursor().unwrap();
                let start = (write + 8192 - size) % 8192;
                let len = size.min(8192 - start);
                black_box(scope.read_samples(0, start, len).unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_planning,
    benchmark_retention,
    benchmark_simulator_reads
);
criterion_main!(benches);
