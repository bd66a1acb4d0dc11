//! Paths inside a recording directory.

use std::path::{Path, PathBuf};

/// Resolves the well-known paths of a recording rooted at `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout of the recording at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The recording root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `sensor_data/`.
    pub fn sensor_data(&self) -> PathBuf {
        self.root.join("sensor_data")
    }

    /// The stamp index, `sensor_data/data_stamp.csv`.
    pub fn stamp_index(&self) -> PathBuf {
        self.sensor_data().join("data_stamp.csv")
    }

    /// GPS fixes, `sensor_data/gps.csv`.
    pub fn gps(&self) -> PathBuf {
        self.sensor_data().join("gps.csv")
    }

    /// IMU samples, `sensor_data/xsens_imu.csv`.
    pub fn imu(&self) -> PathBuf {
        self.sensor_data().join("xsens_imu.csv")
    }

    /// Stop regions, `sensor_data/stop_region.csv`.
    pub fn stop_regions(&self) -> PathBuf {
        self.sensor_data().join("stop_region.csv")
    }

    /// Lidar scans, `sensor_data/Ouster/`.
    pub fn lidar_dir(&self) -> PathBuf {
        self.sensor_data().join("Ouster")
    }

    /// Polar radar frames, `sensor_data/radar/polar/`.
    pub fn radar_dir(&self) -> PathBuf {
        self.sensor_data().join("radar").join("polar")
    }

    /// Default export destination, `<root>/imu_lidar_output.tdck`.
    pub fn default_export(&self) -> PathBuf {
        self.root.join("imu_lidar_output.tdck")
    }
}
