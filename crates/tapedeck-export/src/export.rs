//! Whole-recording export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tapedeck_dataset::{decode_point_cloud, Dataset};

use crate::error::ExportError;
use crate::writer::ExportWriter;

/// Counts from one export run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// IMU frames written.
    pub imu_frames: u64,
    /// Lidar frames written.
    pub lidar_frames: u64,
    /// Lidar files that could not be read or named no stamp.
    pub skipped_files: u64,
}

/// Write every IMU record of `dataset`, then every lidar file in list
/// order, to `out`.
///
/// A lidar file that cannot be read is logged and skipped; write errors
/// abort the export.
pub fn export_dataset<W: Write>(dataset: &Dataset, out: W) -> Result<ExportSummary, ExportError> {
    let source = dataset.layout().root().display().to_string();
    let mut writer = ExportWriter::new(out, &source)?;
    let mut summary = ExportSummary::default();

    for (&stamp, sample) in dataset.imu() {
        writer.write_imu(stamp, sample)?;
        summary.imu_frames += 1;
    }
    tracing::debug!(frames = summary.imu_frames, "imu exported");

    let files = dataset.lidar_files();
    let resolver = dataset.lidar_resolver();
    for (index, name) in files.iter().enumerate() {
        let Some(stamp) = files.stamp_of(index) else {
            tracing::warn!(file = name, "lidar file name carries no stamp, skipping");
            summary.skipped_files += 1;
            continue;
        };
        let bytes = match resolver.read(name) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file = name, error = %e, "unreadable lidar file, skipping");
                summary.skipped_files += 1;
                continue;
            }
        };
        writer.write_cloud(stamp, &decode_point_cloud(&bytes))?;
        summary.lidar_frames += 1;
    }

    writer.flush()?;
    tracing::info!(
        imu = summary.imu_frames,
        lidar = summary.lidar_frames,
        skipped = summary.skipped_files,
        "export finished"
    );
    Ok(summary)
}

/// [`export_dataset`] into a newly created file at `path`.
pub fn export_to_path(dataset: &Dataset, path: &Path) -> Result<ExportSummary, ExportError> {
    let file = File::create(path)?;
    tracing::info!(path = %path.display(), "exporting");
    export_dataset(dataset, BufWriter::new(file))
}
