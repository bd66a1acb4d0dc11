//! User-facing [`Player`] API and thread lifecycle.
//!
//! A player owns one ticker thread, one dispatcher thread, and one
//! worker thread per enabled sensor that has a feed. All of them are
//! joined by [`Player::shutdown`], which also runs on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use indexmap::IndexMap;
use tapedeck_core::{EmitSink, PayloadResolver, SensorKind};
use tapedeck_timeline::{FileList, StopRegions, Timeline};

use crate::clock::ticker_loop;
use crate::config::{ConfigError, PlayerConfig};
use crate::control::Controls;
use crate::dispatch::{dispatcher_loop, Cadence, Cursor, Router};
use crate::prefetch::{PrefetchStats, PrefetchingResolver, SharedPrefetchStats};
use crate::queue::SensorQueue;
use crate::state::PlaybackState;
use crate::worker::{worker_loop, RecordTable, StampHandler};

// ── Feeds ──────────────────────────────────────────────────────────

/// Where one sensor's payloads come from.
pub enum Feed {
    /// Records parsed up front, looked up by stamp.
    Records(RecordTable),
    /// One file per record, decoded on demand with one-slot prefetch.
    Files {
        /// The sensor's record files.
        files: FileList,
        /// Decoder for those files.
        resolver: Box<dyn PayloadResolver>,
    },
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Records(table) => f.debug_tuple("Records").field(&table.len()).finish(),
            Self::Files { files, .. } => f.debug_struct("Files").field("files", &files.len()).finish(),
        }
    }
}

/// Payload sources for every sensor that will be played, in insertion
/// order.
#[derive(Debug, Default)]
pub struct Feeds {
    feeds: IndexMap<SensorKind, Feed>,
}

impl Feeds {
    /// No sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an in-memory table under the table's sensor.
    pub fn with_records(mut self, table: RecordTable) -> Self {
        self.feeds
            .insert(StampHandler::sensor(&table), Feed::Records(table));
        self
    }

    /// Add a file-backed source for `sensor`.
    pub fn with_files(
        mut self,
        sensor: SensorKind,
        files: FileList,
        resolver: Box<dyn PayloadResolver>,
    ) -> Self {
        self.feeds.insert(sensor, Feed::Files { files, resolver });
        self
    }

    /// Insert or replace the source for `sensor`.
    pub fn insert(&mut self, sensor: SensorKind, feed: Feed) -> Option<Feed> {
        self.feeds.insert(sensor, feed)
    }

    /// Sensors with a source, in insertion order.
    pub fn sensors(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.feeds.keys().copied()
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Whether there are no sources.
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

// ── ShutdownReport ─────────────────────────────────────────────────

/// Report from [`Player::shutdown`].
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Total time spent shutting down.
    pub total_ms: u64,
    /// Threads joined cleanly.
    pub threads_joined: usize,
    /// Threads that had panicked.
    pub threads_panicked: usize,
    /// Entries the dispatcher walked over its lifetime.
    pub entries_dispatched: u64,
    /// Stamps handled by each sensor worker.
    pub stamps_handled: IndexMap<SensorKind, u64>,
}

// ── Player ─────────────────────────────────────────────────────────

/// A running playback session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tapedeck_core::{EmitSink, Payload, SensorKind, Stamp};
/// use tapedeck_engine::{Feeds, Player, PlayerConfig, RecordTable};
/// use tapedeck_timeline::{StopRegions, Timeline, TimelineEntry};
///
/// struct Print;
/// impl EmitSink for Print {
///     fn emit(&self, sensor: SensorKind, stamp: Stamp, _: Payload) {
///         println!("{sensor} {stamp}");
///     }
/// }
///
/// let timeline = Timeline::new(vec![TimelineEntry::new(100, SensorKind::Gps)]).unwrap();
/// let feeds = Feeds::new().with_records(RecordTable::new(SensorKind::Gps));
/// let mut player = Player::new(
///     Arc::new(timeline),
///     Arc::new(StopRegions::none()),
///     feeds,
///     Arc::new(Print),
///     PlayerConfig::default(),
/// )
/// .unwrap();
/// player.controls().set_rate(2.0).unwrap();
/// let report = player.shutdown();
/// assert_eq!(report.threads_panicked, 0);
/// ```
pub struct Player {
    state: Arc<PlaybackState>,
    controls: Controls,
    alive: Arc<AtomicBool>,
    router: Router,
    ticker: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<u64>>,
    workers: Vec<(SensorKind, JoinHandle<u64>)>,
    prefetch: IndexMap<SensorKind, Arc<SharedPrefetchStats>>,
    running: bool,
}

impl Player {
    /// Validate `config`, spawn every thread, and (with `auto_start`)
    /// begin playing.
    ///
    /// Sensors outside `config.enabled`, and enabled sensors without a
    /// feed, get no worker; their entries are dropped by the dispatcher.
    /// If a thread cannot be spawned the threads already running are torn
    /// down before the error is returned.
    pub fn new(
        timeline: Arc<Timeline>,
        stops: Arc<StopRegions>,
        feeds: Feeds,
        sink: Arc<dyn EmitSink>,
        config: PlayerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = Arc::new(PlaybackState::new(&config));
        let controls = Controls::new(Arc::clone(&state), Arc::clone(&timeline));
        let mut player = Self {
            state: Arc::clone(&state),
            controls,
            alive: Arc::new(AtomicBool::new(true)),
            router: Router::default(),
            ticker: None,
            dispatcher: None,
            workers: Vec::new(),
            prefetch: IndexMap::new(),
            running: true,
        };

        for (sensor, feed) in feeds.feeds {
            if !config.enabled.contains(sensor) {
                tracing::debug!(%sensor, "sensor disabled, no worker started");
                continue;
            }
            let handler: Box<dyn StampHandler> = match feed {
                Feed::Records(table) => Box::new(table),
                Feed::Files { files, resolver } => {
                    let handler =
                        PrefetchingResolver::new(sensor, files, resolver, config.search_window);
                    player.prefetch.insert(sensor, handler.shared_stats());
                    Box::new(handler)
                }
            };
            let queue = Arc::new(SensorQueue::new());
            player.router.insert(sensor, Arc::clone(&queue));

            let sink = Arc::clone(&sink);
            let alive = Arc::clone(&player.alive);
            let handle = thread::Builder::new()
                .name(format!("tapedeck-{sensor}"))
                .spawn(move || worker_loop(queue, handler, sink, alive))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("{sensor} worker: {e}"),
                })?;
            player.workers.push((sensor, handle));
        }

        let cursor = Cursor::new(timeline, stops);
        let cadence = Cadence {
            heartbeat_every: config.heartbeat_every,
            clock_interval_ns: config.clock_interval_ns,
        };
        let dispatch_state = Arc::clone(&state);
        let router = player.router.clone();
        let dispatch_alive = Arc::clone(&player.alive);
        let dispatch_sink = Arc::clone(&sink);
        player.dispatcher = Some(
            thread::Builder::new()
                .name("tapedeck-dispatch".into())
                .spawn(move || {
                    dispatcher_loop(
                        cursor,
                        dispatch_state,
                        router,
                        dispatch_sink,
                        dispatch_alive,
                        cadence,
                    )
                })
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("dispatcher: {e}"),
                })?,
        );

        let ticker_state = Arc::clone(&state);
        let ticker_alive = Arc::clone(&player.alive);
        let period = config.tick_period;
        player.ticker = Some(
            thread::Builder::new()
                .name("tapedeck-ticker".into())
                .spawn(move || ticker_loop(ticker_state, ticker_alive, period))
                .map_err(|e| ConfigError::ThreadSpawnFailed {
                    reason: format!("ticker: {e}"),
                })?,
        );

        tracing::info!(
            workers = player.workers.len(),
            entries = player.controls.timeline().len(),
            "player started"
        );
        if config.auto_start {
            player.controls.start();
        }
        Ok(player)
    }

    /// A control handle. Clones share this player's state.
    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    /// The shared playback state.
    pub fn state(&self) -> &Arc<PlaybackState> {
        &self.state
    }

    /// Sensors that have a running worker.
    pub fn active_sensors(&self) -> impl Iterator<Item = SensorKind> + '_ {
        self.workers.iter().map(|(sensor, _)| *sensor)
    }

    /// Prefetch counters for a file-backed sensor.
    pub fn prefetch_stats(&self, sensor: SensorKind) -> Option<PrefetchStats> {
        self.prefetch.get(&sensor).map(|s| s.snapshot())
    }

    /// Whether the threads are still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop every thread and wait for it.
    ///
    /// Clears the liveness flag, closes every queue, rings the doorbell,
    /// and unparks the ticker, so each thread leaves whatever wait it is
    /// in. Joins have no timeout. Calling this twice is harmless.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if !self.running {
            return ShutdownReport::default();
        }
        let start = Instant::now();
        self.running = false;

        self.alive.store(false, Ordering::Release);
        self.state.set_playing(false);
        self.router.close();
        self.state.doorbell().ring();
        if let Some(handle) = &self.ticker {
            handle.thread().unpark();
        }

        let mut report = ShutdownReport::default();
        let mut tally = |joined: bool| {
            if joined {
                report.threads_joined += 1;
            } else {
                report.threads_panicked += 1;
            }
        };

        if let Some(handle) = self.ticker.take() {
            tally(handle.join().is_ok());
        }
        let mut dispatched = 0;
        if let Some(handle) = self.dispatcher.take() {
            let result = handle.join();
            tally(result.is_ok());
            dispatched = result.unwrap_or(0);
        }
        let mut handled = IndexMap::new();
        for (sensor, handle) in self.workers.drain(..) {
            let result = handle.join();
            tally(result.is_ok());
            if let Ok(n) = result {
                handled.insert(sensor, n);
            }
        }
        report.entries_dispatched = dispatched;
        report.stamps_handled = handled;
        report.total_ms = start.elapsed().as_millis() as u64;

        if report.threads_panicked > 0 {
            tracing::warn!(panicked = report.threads_panicked, "player threads panicked");
        }
        tracing::info!(
            joined = report.threads_joined,
            total_ms = report.total_ms,
            "player shut down"
        );
        report
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if self.running {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("workers", &self.workers.len())
            .field("running", &self.running)
            .finish()
    }
}
