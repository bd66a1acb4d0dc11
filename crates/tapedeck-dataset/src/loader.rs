//! Loading a recording directory into memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};
use indexmap::IndexMap;
use tapedeck_core::{GpsFix, ImuSample, SensorKind, SensorSet, Stamp};
use tapedeck_timeline::{FileList, StopRegion, StopRegions, Timeline, TimelineEntry};

use crate::error::DatasetError;
use crate::layout::Layout;
use crate::records::{parse_gps_row, parse_imu_row, parse_stamp_row, parse_stop_row};
use crate::resolver::DirectoryResolver;

// ── LoadReport ─────────────────────────────────────────────────────

/// What a load found, for logging and diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Timeline entries per sensor.
    pub entries: IndexMap<SensorKind, usize>,
    /// Stamp-index rows whose tag named no known sensor.
    pub unknown_tags: usize,
    /// Unusable lines per input file name.
    pub malformed: IndexMap<String, usize>,
    /// Optional inputs that were absent.
    pub missing: Vec<PathBuf>,
}

impl LoadReport {
    /// Total unusable lines across every input.
    pub fn malformed_total(&self) -> usize {
        self.malformed.values().sum()
    }

    fn note_malformed(&mut self, path: &Path, count: usize) {
        if count == 0 {
            return;
        }
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        tracing::warn!(file = %name, lines = count, "skipped malformed lines");
        *self.malformed.entry(name).or_insert(0) += count;
    }
}

// ── Dataset ────────────────────────────────────────────────────────

/// A recording loaded for playback.
///
/// The timeline, stop regions and lightweight records are in memory.
/// Heavy sensors are represented by their sorted file lists; decode them
/// with [`lidar_resolver`](Self::lidar_resolver) and
/// [`radar_resolver`](Self::radar_resolver).
#[derive(Debug)]
pub struct Dataset {
    layout: Layout,
    timeline: Arc<Timeline>,
    stops: Arc<StopRegions>,
    gps: IndexMap<Stamp, GpsFix>,
    imu: IndexMap<Stamp, ImuSample>,
    lidar_files: FileList,
    radar_files: FileList,
    report: LoadReport,
}

impl Dataset {
    /// Load every sensor of the recording at `root`.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        Self::load_with(root, SensorSet::all())
    }

    /// Load the recording at `root`, reading inputs only for `sensors`.
    ///
    /// The timeline always carries every known sensor's entries; sensors
    /// outside the set simply have no records or files.
    pub fn load_with(root: impl Into<PathBuf>, sensors: SensorSet) -> Result<Self, DatasetError> {
        let layout = Layout::new(root);
        let mut report = LoadReport::default();

        let timeline = load_timeline(&layout.stamp_index(), &mut report)?;
        let stops = load_stop_regions(&layout.stop_regions(), &mut report)?;

        let gps = if sensors.contains(SensorKind::Gps) {
            load_records(&layout.gps(), parse_gps_row, &mut report)?
        } else {
            IndexMap::new()
        };
        let imu = if sensors.contains(SensorKind::Imu) {
            load_records(&layout.imu(), parse_imu_row, &mut report)?
        } else {
            IndexMap::new()
        };
        let lidar_files = if sensors.contains(SensorKind::Lidar) {
            list_files(&layout.lidar_dir(), "bin", &mut report)?
        } else {
            FileList::default()
        };
        let radar_files = if sensors.contains(SensorKind::Radar) {
            list_files(&layout.radar_dir(), "png", &mut report)?
        } else {
            FileList::default()
        };

        tracing::info!(
            root = %layout.root().display(),
            entries = timeline.len(),
            stop_regions = stops.len(),
            gps = gps.len(),
            imu = imu.len(),
            lidar_files = lidar_files.len(),
            radar_files = radar_files.len(),
            "recording loaded"
        );

        Ok(Self {
            layout,
            timeline: Arc::new(timeline),
            stops: Arc::new(stops),
            gps,
            imu,
            lidar_files,
            radar_files,
            report,
        })
    }

    /// Paths of this recording.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The playback timeline.
    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Stop regions (empty when the recording has none).
    pub fn stops(&self) -> &Arc<StopRegions> {
        &self.stops
    }

    /// GPS fixes keyed by stamp, in file order.
    pub fn gps(&self) -> &IndexMap<Stamp, GpsFix> {
        &self.gps
    }

    /// IMU samples keyed by stamp, in file order.
    pub fn imu(&self) -> &IndexMap<Stamp, ImuSample> {
        &self.imu
    }

    /// Move the GPS fixes out, leaving the table empty.
    pub fn take_gps(&mut self) -> IndexMap<Stamp, GpsFix> {
        std::mem::take(&mut self.gps)
    }

    /// Move the IMU samples out, leaving the table empty.
    pub fn take_imu(&mut self) -> IndexMap<Stamp, ImuSample> {
        std::mem::take(&mut self.imu)
    }

    /// Sorted lidar file names.
    pub fn lidar_files(&self) -> &FileList {
        &self.lidar_files
    }

    /// Sorted radar file names.
    pub fn radar_files(&self) -> &FileList {
        &self.radar_files
    }

    /// Resolver for the lidar directory.
    pub fn lidar_resolver(&self) -> DirectoryResolver {
        DirectoryResolver::lidar(self.layout.lidar_dir())
    }

    /// Resolver for the radar directory.
    pub fn radar_resolver(&self) -> DirectoryResolver {
        DirectoryResolver::radar(self.layout.radar_dir())
    }

    /// What the load found.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

// ── Readers ────────────────────────────────────────────────────────

/// Read every row of `path`, handing parseable rows to `visit` and
/// returning how many were malformed. `Ok(None)` means the file is absent.
fn read_rows(
    path: &Path,
    mut visit: impl FnMut(&StringRecord) -> bool,
) -> Result<Option<usize>, DatasetError> {
    if !path.is_file() {
        return Ok(None);
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut malformed = 0;
    let mut row = StringRecord::new();
    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {
                if row.iter().all(str::is_empty) {
                    continue;
                }
                if !visit(&row) {
                    tracing::debug!(
                        file = %path.display(),
                        line = row.position().map(|p| p.line()),
                        "malformed line"
                    );
                    malformed += 1;
                }
            }
            Ok(false) => break,
            Err(source) if source.is_io_error() => {
                return Err(DatasetError::Csv {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(source) => {
                tracing::debug!(file = %path.display(), error = %source, "unreadable line");
                malformed += 1;
            }
        }
    }
    Ok(Some(malformed))
}

fn load_timeline(path: &Path, report: &mut LoadReport) -> Result<Timeline, DatasetError> {
    let mut entries = Vec::new();
    let mut unknown = 0;
    let malformed = read_rows(path, |row| match parse_stamp_row(row) {
        Some((stamp, tag)) => {
            match tag.parse::<SensorKind>() {
                Ok(sensor) => entries.push(TimelineEntry::new(stamp, sensor)),
                Err(e) => {
                    tracing::debug!(stamp, error = %e, "dropping stamp");
                    unknown += 1;
                }
            }
            true
        }
        None => false,
    })?
    .ok_or_else(|| DatasetError::MissingStampIndex {
        path: path.to_path_buf(),
    })?;
    report.note_malformed(path, malformed);

    if unknown > 0 {
        tracing::warn!(count = unknown, "stamp index rows with unknown sensor tags");
    }
    report.unknown_tags = unknown;

    let timeline = Timeline::from_unsorted(entries)?;
    for (sensor, count) in SensorKind::ALL.iter().zip(timeline.counts_by_sensor()) {
        report.entries.insert(*sensor, count);
    }
    Ok(timeline)
}

fn load_stop_regions(path: &Path, report: &mut LoadReport) -> Result<StopRegions, DatasetError> {
    let mut regions: Vec<StopRegion> = Vec::new();
    let Some(malformed) = read_rows(path, |row| match parse_stop_row(row) {
        Some(region) => {
            regions.push(region);
            true
        }
        None => false,
    })?
    else {
        tracing::debug!(path = %path.display(), "no stop regions");
        return Ok(StopRegions::none());
    };
    report.note_malformed(path, malformed);
    Ok(StopRegions::new(regions)?)
}

fn load_records<T>(
    path: &Path,
    parse: fn(&StringRecord) -> Option<(Stamp, T)>,
    report: &mut LoadReport,
) -> Result<IndexMap<Stamp, T>, DatasetError> {
    let mut records = IndexMap::new();
    let read = read_rows(path, |row| match parse(row) {
        Some((stamp, value)) => {
            records.insert(stamp, value);
            true
        }
        None => false,
    })?;
    match read {
        Some(malformed) => report.note_malformed(path, malformed),
        None => {
            tracing::warn!(path = %path.display(), "sensor input missing, treating as empty");
            report.missing.push(path.to_path_buf());
        }
    }
    Ok(records)
}

fn list_files(dir: &Path, extension: &str, report: &mut LoadReport) -> Result<FileList, DatasetError> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %dir.display(), "sensor directory missing, treating as empty");
            report.missing.push(dir.to_path_buf());
            return Ok(FileList::default());
        }
        Err(source) => {
            return Err(DatasetError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| DatasetError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    Ok(FileList::new(names))
}
