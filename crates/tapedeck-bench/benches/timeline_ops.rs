//! Criterion micro-benchmarks for timeline search and file lookup.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tapedeck_bench::{file_list, reference_timeline, stop_profile};
use tapedeck_core::SensorKind;

/// Benchmark: binary search for a seek target in one hour of recording
/// (~800K entries).
fn bench_position_at_or_before(c: &mut Criterion) {
    let timeline = reference_timeline(3600);
    let targets: Vec<i64> = (1..100)
        .map(|p| timeline.initial_stamp() + timeline.seek_offset(p * 100).unwrap())
        .collect();

    c.bench_function("position_at_or_before_1h", |b| {
        b.iter(|| {
            for &t in &targets {
                black_box(timeline.position_at_or_before(t));
            }
        });
    });
}

/// Benchmark: stop-cursor placement after a seek.
fn bench_stop_first_at_or_after(c: &mut Criterion) {
    let timeline = reference_timeline(3600);
    let stops = stop_profile(&timeline, 200, 30_000_000_000);
    let targets: Vec<i64> = (1..100)
        .map(|p| timeline.initial_stamp() + timeline.seek_offset(p * 100).unwrap())
        .collect();

    c.bench_function("stop_first_at_or_after_200", |b| {
        b.iter(|| {
            for &t in &targets {
                black_box(stops.first_at_or_after(t));
            }
        });
    });
}

/// Benchmark: sequential file lookup with the windowed hint, as a heavy
/// sensor worker does during normal playback.
fn bench_locate_sequential(c: &mut Criterion) {
    let timeline = reference_timeline(600);
    let files = file_list(&timeline, SensorKind::Lidar, "bin");
    let names: Vec<String> = files.iter().map(str::to_owned).collect();

    c.bench_function("file_locate_sequential_6k", |b| {
        b.iter(|| {
            let mut hint = None;
            for name in &names {
                hint = files.locate(name, hint, 10);
            }
            black_box(hint);
        });
    });
}

/// Benchmark: file lookup right after a backwards seek, where the hint
/// is stale and the search wraps to the front.
fn bench_locate_after_seek(c: &mut Criterion) {
    let timeline = reference_timeline(600);
    let files = file_list(&timeline, SensorKind::Lidar, "bin");
    let early = files.get(files.len() / 10).unwrap().to_owned();
    let stale_hint = Some(files.len() - 1);

    c.bench_function("file_locate_after_seek_6k", |b| {
        b.iter(|| black_box(files.locate(&early, stale_hint, 10)));
    });
}

criterion_group!(
    benches,
    bench_position_at_or_before,
    bench_stop_first_at_or_after,
    bench_locate_sequential,
    bench_locate_after_seek
);
criterion_main!(benches);
