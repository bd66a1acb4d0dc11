//! Wiring a loaded recording to a running player.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tapedeck_core::{EmitSink, Payload, SensorKind, SensorSet};
use tapedeck_dataset::{Dataset, DatasetError};
use tapedeck_engine::{ConfigError, Controls, Feeds, Player, PlayerConfig, RecordTable, ShutdownReport};

/// Errors from [`Session::open`].
#[derive(Debug)]
pub enum SessionError {
    /// The recording could not be loaded.
    Dataset(DatasetError),
    /// The player could not be started.
    Config(ConfigError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset(e) => write!(f, "dataset: {e}"),
            Self::Config(e) => write!(f, "player: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dataset(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<DatasetError> for SessionError {
    fn from(e: DatasetError) -> Self {
        Self::Dataset(e)
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Build the player feeds for the sensors in `enabled`.
///
/// GPS and IMU records are moved out of `dataset` into the player's
/// tables, so they are held once; afterwards [`Dataset::gps`] and
/// [`Dataset::imu`] are empty. Lidar and radar get their file lists and a
/// directory resolver.
pub fn feeds_for(dataset: &mut Dataset, enabled: SensorSet) -> Feeds {
    let mut feeds = Feeds::new();
    if enabled.contains(SensorKind::Gps) {
        let mut table = RecordTable::new(SensorKind::Gps);
        for (stamp, fix) in dataset.take_gps() {
            table.insert(stamp, Payload::Gps(fix));
        }
        feeds = feeds.with_records(table);
    }
    if enabled.contains(SensorKind::Imu) {
        let mut table = RecordTable::new(SensorKind::Imu);
        for (stamp, sample) in dataset.take_imu() {
            table.insert(stamp, Payload::Imu(sample));
        }
        feeds = feeds.with_records(table);
    }
    if enabled.contains(SensorKind::Lidar) {
        feeds = feeds.with_files(
            SensorKind::Lidar,
            dataset.lidar_files().clone(),
            Box::new(dataset.lidar_resolver()),
        );
    }
    if enabled.contains(SensorKind::Radar) {
        feeds = feeds.with_files(
            SensorKind::Radar,
            dataset.radar_files().clone(),
            Box::new(dataset.radar_resolver()),
        );
    }
    feeds
}

/// A loaded recording and the player replaying it.
#[derive(Debug)]
pub struct Session {
    dataset: Dataset,
    player: Player,
}

impl Session {
    /// Load the recording at `root` and start a player over it.
    ///
    /// Only the sensors in `config.enabled` are read from disk.
    pub fn open(
        root: impl Into<PathBuf>,
        sink: Arc<dyn EmitSink>,
        config: PlayerConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let dataset = Dataset::load_with(root, config.enabled)?;
        Self::with_dataset(dataset, sink, config)
    }

    /// Start a player over an already loaded recording.
    ///
    /// The player takes ownership of the GPS and IMU records; see
    /// [`feeds_for`].
    pub fn with_dataset(
        mut dataset: Dataset,
        sink: Arc<dyn EmitSink>,
        config: PlayerConfig,
    ) -> Result<Self, SessionError> {
        let feeds = feeds_for(&mut dataset, config.enabled);
        let player = Player::new(
            Arc::clone(dataset.timeline()),
            Arc::clone(dataset.stops()),
            feeds,
            sink,
            config,
        )?;
        tracing::info!(
            root = %dataset.layout().root().display(),
            sensors = player.active_sensors().count(),
            "session opened"
        );
        Ok(Self { dataset, player })
    }

    /// The loaded recording.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The running player.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// A control handle for the player.
    pub fn controls(&self) -> Controls {
        self.player.controls()
    }

    /// Stop every thread and report how playback went.
    pub fn shutdown(mut self) -> ShutdownReport {
        let report = self.player.shutdown();
        tracing::info!(
            root = %self.dataset.layout().root().display(),
            dispatched = report.entries_dispatched,
            "session closed"
        );
        report
    }
}
