use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galdiff::key::build_key;
use galdiff::snapshot::{Entity, Snapshot};
use galdiff::store::diff::diff;
use galdiff::store::{MemoryBackend, SnapshotStore};

/// A system with `count` targets spread over 15 planets.
/// Every third target shifts attribute by `shift`; `extra` new targets are appended.
fn system(count: usize, shift: i64, extra: usize, taken_at: i64) -> Snapshot {
    let mut snapshot = Snapshot::new("3:145", taken_at);

    for i in 0..count + extra {
        let location = format!("3:145:{}", i % 15 + 1);
        let name = format!("Fleet {i}");
        let attribute = if i % 3 == 0 { 25 + shift } else { 25 };
        let key = build_key(&location, &name).unwrap();
        snapshot
            .entities
            .insert(Entity::new(key, &name, &location, attribute));
    }

    snapshot
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for count in [10, 100, 500] {
        let previous = system(count, 0, 0, 0);
        let current = system(count, 50, count / 10, 7 * 3_600_000);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| diff(black_box(&current), black_box(&previous)));
        });
    }

    group.finish();
}

fn bench_save_load(c: &mut Criterion) {
    let snapshot = system(200, 0, 0, 0);

    c.bench_function("save_then_load_200", |b| {
        let mut store = SnapshotStore::new(MemoryBackend::default());
        b.iter(|| {
            store.save("3:145", black_box(snapshot.clone())).unwrap();
            black_box(store.load("3:145"))
        });
    });
}

criterion_group!(benches, bench_diff, bench_save_load);
criterion_main!(benches);
