use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memscan::config::Config;
use memscan::core::types::TypeKind;
use memscan::memory::{MemoryRegion, Permissions, ScanEngine, SimulatedProcess};

const REGION_SIZE: u64 = 1 << 20;
const REGIONS: u64 = 8;

/// Eight 1MB regions with a 42 every 4KB
fn process() -> SimulatedProcess {
    let mut process = SimulatedProcess::new();
    for i in 0..REGIONS {
        let mut image = vec![0u8; REGION_SIZE as usize];
        for page in image.chunks_mut(4096) {
            page[..4].copy_from_slice(&42i32.to_ne_bytes());
        }
        let start = 0x1000_0000 + i * (REGION_SIZE + 0x1000);
        process.map(MemoryRegion::new(start, REGION_SIZE, Permissions::READ_WRITE), image);
    }
    process
}

fn engine(parallel: bool) -> ScanEngine<SimulatedProcess> {
    let mut config = Config::default();
    config.scanner.parallel = parallel;
    ScanEngine::with_source(process(), &config).unwrap()
}

fn bench_initial_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_scan");
    group.throughput(Throughput::Bytes(REGION_SIZE * REGIONS));

    for parallel in [false, true] {
        for aligned in [true, false] {
            let label = format!(
                "{}/{}",
                if parallel { "parallel" } else { "sequential" },
                if aligned { "aligned" } else { "unaligned" }
            );
            let mut engine = engine(parallel);
            group.bench_function(BenchmarkId::from_parameter(label), |b| {
                b.iter(|| {
                    engine.reset();
                    let found = engine.scan(black_box(42), TypeKind::I32, aligned).unwrap();
                    black_box(found.len());
                });
            });
        }
    }
    group.finish();
}

fn bench_cull(c: &mut Criterion) {
    let mut engine = engine(true);
    let candidates = engine.scan(0, TypeKind::I32, true).unwrap().len();

    // Culling unchanged memory keeps the same set, so every iteration does equal work
    let mut group = c.benchmark_group("cull");
    group.throughput(Throughput::Elements(candidates as u64));
    group.bench_function("unchanged_zeroes", |b| {
        b.iter(|| black_box(engine.scan(0, TypeKind::I32, true).unwrap().len()));
    });
    group.finish();
}

criterion_group!(benches, bench_initial_scan, bench_cull);
criterion_main!(benches);
