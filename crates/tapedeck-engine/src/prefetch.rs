//! One-slot lookahead for file-backed sensors.
//!
//! After emitting file `i` of its list, a heavy-sensor worker decodes
//! file `i + 1` into its [`PrefetchSlot`]. During sequential playback the
//! next stamp names exactly that file, so the decode has already happened
//! by the time it is needed. Anything else (a seek, a loop, a skipped
//! stop region) misses the slot and falls back to a synchronous load.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tapedeck_core::{EmitSink, Payload, PayloadResolver, SensorKind, Stamp};
use tapedeck_timeline::FileList;

use crate::worker::StampHandler;

// ── PrefetchSlot ───────────────────────────────────────────────────

/// At most one decoded payload, keyed by the file it came from.
#[derive(Debug, Default)]
pub struct PrefetchSlot {
    entry: Option<(String, Payload)>,
}

impl PrefetchSlot {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: impl Into<String>, payload: Payload) {
        self.entry = Some((key.into(), payload));
    }

    /// Take the payload if the slot holds `key`. The slot is left empty
    /// either way.
    pub fn take_if(&mut self, key: &str) -> Option<Payload> {
        match self.entry.take() {
            Some((k, payload)) if k == key => Some(payload),
            _ => None,
        }
    }

    /// The key currently held.
    pub fn key(&self) -> Option<&str> {
        self.entry.as_ref().map(|(k, _)| k.as_str())
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Drop the held payload.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

// ── PrefetchStats ──────────────────────────────────────────────────

/// Counters describing how well the slot is working.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Stamps served from the slot.
    pub hits: u64,
    /// Stamps that needed a synchronous load.
    pub misses: u64,
    /// Stamps that produced nothing (absent from the list or failed to load).
    pub skipped: u64,
}

/// Lock-free counters shared between a worker and its player.
#[derive(Debug, Default)]
pub(crate) struct SharedPrefetchStats {
    hits: AtomicU64,
    misses: AtomicU64,
    skipped: AtomicU64,
}

impl SharedPrefetchStats {
    pub(crate) fn snapshot(&self) -> PrefetchStats {
        PrefetchStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

// ── PrefetchingResolver ────────────────────────────────────────────

/// [`StampHandler`] for a heavy sensor: file lookup, synchronous load on
/// a slot miss, and prefetch of the following file after each emission.
pub struct PrefetchingResolver {
    sensor: SensorKind,
    files: FileList,
    resolver: Box<dyn PayloadResolver>,
    slot: PrefetchSlot,
    last_index: Option<usize>,
    window: usize,
    stats: Arc<SharedPrefetchStats>,
}

impl PrefetchingResolver {
    /// Wrap `resolver` for the files of `sensor`. `window` bounds how far
    /// behind the last emitted file the list search begins.
    pub fn new(
        sensor: SensorKind,
        files: FileList,
        resolver: Box<dyn PayloadResolver>,
        window: usize,
    ) -> Self {
        Self {
            sensor,
            files,
            resolver,
            slot: PrefetchSlot::new(),
            last_index: None,
            window,
            stats: Arc::default(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> PrefetchStats {
        self.stats.snapshot()
    }

    /// The prefetch slot, for inspection.
    pub fn slot(&self) -> &PrefetchSlot {
        &self.slot
    }

    pub(crate) fn shared_stats(&self) -> Arc<SharedPrefetchStats> {
        Arc::clone(&self.stats)
    }

    fn skip(&self, stamp: Stamp, identifier: &str, reason: &dyn std::fmt::Display) {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(sensor = %self.sensor, stamp, identifier, %reason, "skipping record");
    }

    fn prefetch_after(&mut self, index: usize) {
        self.slot.clear();
        let Some(next) = self.files.get(index + 1) else {
            return;
        };
        match self.resolver.load(next) {
            Ok(payload) => self.slot.put(next, payload),
            Err(e) => {
                tracing::debug!(sensor = %self.sensor, identifier = next, error = %e, "prefetch failed");
            }
        }
    }
}

impl StampHandler for PrefetchingResolver {
    fn sensor(&self) -> SensorKind {
        self.sensor
    }

    fn handle(&mut self, stamp: Stamp, sink: &dyn EmitSink) {
        let identifier = self.resolver.identifier(stamp);
        let index = self.files.locate(&identifier, self.last_index, self.window);

        let payload = match self.slot.take_if(&identifier) {
            Some(payload) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                payload
            }
            None => {
                let Some(i) = index else {
                    self.skip(stamp, &identifier, &"not in file list");
                    return;
                };
                self.last_index = Some(i);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                match self.resolver.load(&identifier) {
                    Ok(payload) => payload,
                    Err(e) => {
                        self.skip(stamp, &identifier, &e);
                        return;
                    }
                }
            }
        };

        sink.emit(self.sensor, stamp, payload);
        if let Some(i) = index {
            self.last_index = Some(i);
            self.prefetch_after(i);
        }
    }
}

impl std::fmt::Debug for PrefetchingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchingResolver")
            .field("sensor", &self.sensor)
            .field("files", &self.files.len())
            .field("slot", &self.slot.key())
            .field("last_index", &self.last_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tapedeck_core::{PolarImage, ResolveError};

    /// Resolver whose payload encodes the file stamp in its width.
    struct StampResolver {
        loads: Arc<AtomicUsize>,
        broken: HashSet<String>,
    }

    impl PayloadResolver for StampResolver {
        fn identifier(&self, stamp: Stamp) -> String {
            format!("{stamp}.png")
        }

        fn load(&self, identifier: &str) -> Result<Payload, ResolveError> {
            self.loads.fetch_add(1, Ordering::Relaxed);
            if self.broken.contains(identifier) {
                return Err(ResolveError::Decode {
                    identifier: identifier.to_string(),
                    reason: "broken".into(),
                });
            }
            let stem = identifier.trim_end_matches(".png");
            let width = stem.parse().map_err(|_| ResolveError::NotFound {
                identifier: identifier.to_string(),
            })?;
            Ok(Payload::Radar(PolarImage {
                width,
                height: 1,
                pixels: vec![0],
            }))
        }
    }

    #[derive(Default)]
    struct VecSink(Mutex<Vec<(Stamp, Payload)>>);

    impl EmitSink for VecSink {
        fn emit(&self, _: SensorKind, stamp: Stamp, payload: Payload) {
            self.0.lock().unwrap().push((stamp, payload));
        }
    }

    fn handler(stamps: &[u32], broken: &[&str]) -> (PrefetchingResolver, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let resolver = StampResolver {
            loads: Arc::clone(&loads),
            broken: broken.iter().map(|s| s.to_string()).collect(),
        };
        let files = stamps.iter().map(|s| format!("{s}.png")).collect();
        (
            PrefetchingResolver::new(SensorKind::Radar, files, Box::new(resolver), 10),
            loads,
        )
    }

    fn width(p: &Payload) -> u32 {
        match p {
            Payload::Radar(img) => img.width,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn slot_take_if_matches_key_only() {
        let mut slot = PrefetchSlot::new();
        slot.put("a", Payload::Radar(PolarImage::default()));
        assert_eq!(slot.key(), Some("a"));
        assert!(slot.take_if("b").is_none());
        assert!(slot.is_empty());
        slot.put("a", Payload::Radar(PolarImage::default()));
        assert!(slot.take_if("a").is_some());
        assert!(slot.is_empty());
    }

    #[test]
    fn sequential_playback_hits_after_the_first_load() {
        let (mut h, loads) = handler(&[10, 20, 30, 40], &[]);
        let sink = VecSink::default();
        for s in [10, 20, 30, 40] {
            h.handle(s, &sink);
        }
        let got = sink.0.into_inner().unwrap();
        assert_eq!(got.iter().map(|(_, p)| width(p)).collect::<Vec<_>>(), [10, 20, 30, 40]);
        assert_eq!(
            h.stats(),
            PrefetchStats {
                hits: 3,
                misses: 1,
                skipped: 0
            }
        );
        // One synchronous load plus three prefetches; nothing after the last file.
        assert_eq!(loads.load(Ordering::Relaxed), 4);
        assert!(h.slot().is_empty());
    }

    #[test]
    fn jump_misses_and_reloads_synchronously() {
        let (mut h, _) = handler(&[10, 20, 30, 40, 50], &[]);
        let sink = VecSink::default();
        h.handle(10, &sink);
        assert_eq!(h.slot().key(), Some("20.png"));
        h.handle(40, &sink);
        assert_eq!(h.slot().key(), Some("50.png"));
        assert_eq!(h.stats().misses, 2);
        h.handle(50, &sink);
        assert_eq!(h.stats().hits, 1);
    }

    #[test]
    fn absent_stamp_is_skipped() {
        let (mut h, loads) = handler(&[10, 20], &[]);
        let sink = VecSink::default();
        h.handle(15, &sink);
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(h.stats().skipped, 1);
        assert_eq!(loads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn failed_load_is_skipped_and_failed_prefetch_empties_slot() {
        let (mut h, _) = handler(&[10, 20, 30], &["20.png"]);
        let sink = VecSink::default();
        h.handle(10, &sink);
        assert!(h.slot().is_empty());
        h.handle(20, &sink);
        h.handle(30, &sink);
        let got = sink.0.into_inner().unwrap();
        assert_eq!(got.iter().map(|(s, _)| *s).collect::<Vec<_>>(), [10, 30]);
        assert_eq!(h.stats().skipped, 1);
    }

    #[test]
    fn cache_hits_match_direct_loads() {
        let stamps: Vec<u32> = (1..=20).map(|i| i * 7).collect();
        let (mut cached, _) = handler(&stamps, &[]);
        let direct = StampResolver {
            loads: Arc::default(),
            broken: HashSet::new(),
        };
        let sink = VecSink::default();
        for &s in &stamps {
            cached.handle(s as Stamp, &sink);
        }
        for (stamp, payload) in sink.0.into_inner().unwrap() {
            let expected = direct.load(&direct.identifier(stamp)).unwrap();
            assert_eq!(payload, expected);
        }
    }
}
