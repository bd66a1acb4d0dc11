//! Export file writer.
//!
//! [`ExportWriter`] streams frames to any `Write` sink. The header is
//! written immediately on construction.

use std::io::Write;

use tapedeck_core::{ImuSample, PointCloud, Stamp};

use crate::codec::{encode_cloud, encode_frame, encode_header, encode_imu};
use crate::error::ExportError;
use crate::types::{Channel, Frame};

/// Writes export frames to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use tapedeck_core::ImuSample;
/// use tapedeck_export::{Channel, ExportReader, ExportWriter};
///
/// let mut buf = Vec::new();
/// let mut writer = ExportWriter::new(&mut buf, "memory").unwrap();
/// writer.write_imu(10, &ImuSample::default()).unwrap();
/// writer.write_imu(20, &ImuSample::default()).unwrap();
/// assert_eq!(writer.frames_written(), 2);
/// drop(writer);
///
/// let mut reader = ExportReader::open(buf.as_slice()).unwrap();
/// assert_eq!(reader.source(), "memory");
/// let first = reader.next_frame().unwrap().unwrap();
/// assert_eq!((first.channel, first.stamp), (Channel::Imu, 10));
/// assert_eq!(reader.next_frame().unwrap().unwrap().stamp, 20);
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct ExportWriter<W: Write> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> ExportWriter<W> {
    /// Create a writer, immediately writing the header. `source`
    /// describes where the records came from (usually the recording root).
    pub fn new(mut writer: W, source: &str) -> Result<Self, ExportError> {
        encode_header(&mut writer, source)?;
        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    /// Write one IMU sample.
    pub fn write_imu(&mut self, stamp: Stamp, sample: &ImuSample) -> Result<(), ExportError> {
        self.write_frame(&Frame {
            channel: Channel::Imu,
            stamp,
            payload: encode_imu(sample),
        })
    }

    /// Write one lidar scan.
    pub fn write_cloud(&mut self, stamp: Stamp, cloud: &PointCloud) -> Result<(), ExportError> {
        self.write_frame(&Frame {
            channel: Channel::Lidar,
            stamp,
            payload: encode_cloud(cloud)?,
        })
    }

    /// Write a pre-built frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), ExportError> {
        encode_frame(&mut self.writer, frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
