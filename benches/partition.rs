use criterion::{Criterion, criterion_group, criterion_main};
use decatur_drill::PartitionBuilder;
use decatur_drill::station::StationRegistry;

mod bench_base;
use bench_base::*;

fn criterion_benchmark(c: &mut Criterion) {
    let stations = StationRegistry::decatur();
    c.bench_function("decatur stations", |b| {
        b.iter(|| {
            PartitionBuilder::default()
                .set_bounding_box(decatur_box())
                .from_stations(&stations)
                .build()
        })
    });

    let mut group = c.benchmark_group("random stations");
    group.bench_function("10 random sites", |b| create_benchmark_fn(b, 10));
    group.bench_function("100 random sites", |b| create_benchmark_fn(b, 100));
    group.bench_function("1,000 random sites", |b| create_benchmark_fn(b, 1_000));
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
