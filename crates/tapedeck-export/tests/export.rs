//! Export of on-disk recordings.

use std::fs;
use std::path::{Path, PathBuf};

use tapedeck_core::{Payload, SensorKind};
use tapedeck_dataset::Dataset;
use tapedeck_export::{export_dataset, export_to_path, Channel, ExportReader, ExportSummary};

// ── Helpers ─────────────────────────────────────────────────────

struct Scratch(PathBuf);

impl Scratch {
    fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "tapedeck-export-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(path.join("sensor_data/Ouster")).unwrap();
        Self(path)
    }

    fn write(&self, rel: &str, contents: &[u8]) {
        fs::write(self.0.join("sensor_data").join(rel), contents).unwrap();
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn scan(points: usize, seed: f32) -> Vec<u8> {
    (0..points)
        .flat_map(|k| [seed + k as f32, 0.0, 1.0, 0.5])
        .flat_map(f32::to_le_bytes)
        .collect()
}

fn recording(label: &str) -> Scratch {
    let s = Scratch::new(label);
    s.write("data_stamp.csv", b"10,imu\n20,ouster\n30,imu\n40,ouster\n");
    s.write(
        "xsens_imu.csv",
        b"10,0,0,0,1,0,0,0\n30,0,0,0,1,0,0,0,0.1,0.2,0.3,0,0,9.8,1,2,3\n",
    );
    s.write("Ouster/40.bin", &scan(3, 100.0));
    s.write("Ouster/20.bin", &scan(65, 0.0));
    s
}

// ── Tests ───────────────────────────────────────────────────────

#[test]
fn imu_frames_precede_lidar_frames_in_file_order() {
    let rec = recording("order");
    let data = Dataset::load(rec.path()).unwrap();

    let mut buf = Vec::new();
    let summary = export_dataset(&data, &mut buf).unwrap();
    assert_eq!(
        summary,
        ExportSummary {
            imu_frames: 2,
            lidar_frames: 2,
            skipped_files: 0,
        }
    );

    let reader = ExportReader::open(buf.as_slice()).unwrap();
    assert_eq!(reader.source(), rec.path().display().to_string());
    let frames: Vec<_> = reader.frames().collect::<Result<_, _>>().unwrap();
    let order: Vec<_> = frames.iter().map(|f| (f.channel, f.stamp)).collect();
    assert_eq!(
        order,
        [
            (Channel::Imu, 10),
            (Channel::Imu, 30),
            (Channel::Lidar, 20),
            (Channel::Lidar, 40),
        ]
    );

    match frames[1].decode().unwrap() {
        Payload::Imu(s) => assert_eq!(s.magnetic_field.map(|m| m.z), Some(3.0)),
        other => panic!("expected imu, got {}", other.kind_name()),
    }
    match frames[2].decode().unwrap() {
        Payload::Lidar(cloud) => {
            assert_eq!(cloud.len(), 65);
            assert_eq!(cloud.points[64].ring, 1);
        }
        other => panic!("expected lidar, got {}", other.kind_name()),
    }
    assert_eq!(frames[3].channel.sensor(), SensorKind::Lidar);
}

#[test]
fn lidar_files_without_a_stamp_are_skipped() {
    let rec = recording("skip");
    rec.write("Ouster/calibration.bin", &scan(1, 0.0));
    let data = Dataset::load(rec.path()).unwrap();

    let summary = export_dataset(&data, Vec::new()).unwrap();
    assert_eq!(summary.lidar_frames, 2);
    assert_eq!(summary.skipped_files, 1);
}

#[test]
fn export_to_default_path() {
    let rec = recording("path");
    let data = Dataset::load(rec.path()).unwrap();
    let out = data.layout().default_export();

    let summary = export_to_path(&data, &out).unwrap();
    let file = fs::File::open(&out).unwrap();
    let frames = ExportReader::open(std::io::BufReader::new(file))
        .unwrap()
        .frames()
        .count();
    assert_eq!(frames as u64, summary.imu_frames + summary.lidar_frames);
}
