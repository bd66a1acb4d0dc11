//! Criterion micro-benchmarks for the dispatcher cursor, the virtual
//! clock, and heavy-payload decoding.

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tapedeck_bench::{raw_scan, reference_timeline, stop_profile};
use tapedeck_core::payload_digest;
use tapedeck_dataset::decode_point_cloud;
use tapedeck_engine::{Cursor, PlaybackState, PlayerConfig, Step, VirtualClock};
use tapedeck_export::codec::{decode_cloud, encode_cloud};
use tapedeck_timeline::StopRegions;

const FAR_AHEAD: i64 = i64::MAX / 4;

/// Walk the whole timeline with the clock far ahead, counting dispatches.
fn drain(cursor: &mut Cursor, state: &PlaybackState) -> u64 {
    let mut dispatched = 0;
    state.set_processed_offset(FAR_AHEAD);
    loop {
        match cursor.step(state) {
            Step::Dispatched(_) => dispatched += 1,
            // A skip pulls the offset back to the end of the region.
            Step::SkippedStop(_) => state.set_processed_offset(FAR_AHEAD),
            Step::Ended | Step::Wait | Step::EndPaused => return dispatched,
            _ => {}
        }
    }
}

fn playing_state() -> PlaybackState {
    let state = PlaybackState::new(&PlayerConfig::default());
    state.set_playing(true);
    state
}

/// Benchmark: dispatch every entry of ten minutes of recording (~130K
/// entries) with no stop regions.
fn bench_cursor_drain(c: &mut Criterion) {
    let timeline = Arc::new(reference_timeline(600));
    let stops = Arc::new(StopRegions::none());

    c.bench_function("cursor_drain_10min", |b| {
        b.iter(|| {
            let state = playing_state();
            let mut cursor = Cursor::new(Arc::clone(&timeline), Arc::clone(&stops));
            black_box(drain(&mut cursor, &state));
        });
    });
}

/// Benchmark: the same walk with 50 stop regions skipped.
fn bench_cursor_drain_with_stops(c: &mut Criterion) {
    let timeline = Arc::new(reference_timeline(600));
    let stops = Arc::new(stop_profile(&timeline, 50, 2_000_000_000));

    c.bench_function("cursor_drain_10min_50_stops", |b| {
        b.iter(|| {
            let state = playing_state();
            let mut cursor = Cursor::new(Arc::clone(&timeline), Arc::clone(&stops));
            black_box(drain(&mut cursor, &state));
        });
    });
}

/// Benchmark: one virtual clock tick.
fn bench_clock_tick(c: &mut Criterion) {
    let state = playing_state();
    let start = Instant::now();
    let mut clock = VirtualClock::new(start);
    let mut now = start;

    c.bench_function("clock_tick", |b| {
        b.iter(|| {
            now += Duration::from_micros(500);
            black_box(clock.tick(now, &state));
        });
    });
}

/// Benchmark: decode one full 128-beam Ouster scan (131072 points).
fn bench_decode_scan(c: &mut Criterion) {
    let raw = raw_scan(131_072);

    c.bench_function("decode_point_cloud_131k", |b| {
        b.iter(|| black_box(decode_point_cloud(&raw)));
    });
}

/// Benchmark: digest of a decoded scan, as used to compare prefetched and
/// direct loads.
fn bench_digest_scan(c: &mut Criterion) {
    let payload = tapedeck_core::Payload::Lidar(decode_point_cloud(&raw_scan(131_072)));

    c.bench_function("payload_digest_131k", |b| {
        b.iter(|| black_box(payload_digest(&payload)));
    });
}

/// Benchmark: export encode and decode of one scan.
fn bench_export_cloud(c: &mut Criterion) {
    let cloud = decode_point_cloud(&raw_scan(131_072));
    let encoded = encode_cloud(&cloud).unwrap();

    c.bench_function("export_encode_cloud_131k", |b| {
        b.iter(|| black_box(encode_cloud(&cloud).unwrap()));
    });
    c.bench_function("export_decode_cloud_131k", |b| {
        b.iter(|| black_box(decode_cloud(&encoded).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_cursor_drain,
    bench_cursor_drain_with_stops,
    bench_clock_tick,
    bench_decode_scan,
    bench_digest_scan,
    bench_export_cloud
);
criterion_main!(benches);
