//! Export file reader.
//!
//! [`ExportReader`] reads frames from any `Read` source. The header is
//! validated on construction and every frame's checksum on decode.

use std::io::Read;

use tapedeck_core::Payload;

use crate::codec::{decode_cloud, decode_frame, decode_header, decode_imu};
use crate::error::ExportError;
use crate::types::{Channel, Frame};

/// Reads export frames from a byte stream.
pub struct ExportReader<R: Read> {
    reader: R,
    source: String,
    frames_read: u64,
}

impl<R: Read> ExportReader<R> {
    /// Open a stream, reading and validating the header.
    pub fn open(mut reader: R) -> Result<Self, ExportError> {
        let source = decode_header(&mut reader)?;
        Ok(Self {
            reader,
            source,
            frames_read: 0,
        })
    }

    /// The source description from the header.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Read the next frame, or `None` if the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ExportError> {
        let frame = decode_frame(&mut self.reader)?;
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Convert into a frame iterator.
    pub fn frames(self) -> FrameIter<R> {
        FrameIter {
            reader: self.reader,
            done: false,
        }
    }
}

/// Iterator adapter over export frames. Stops after the first error.
pub struct FrameIter<R: Read> {
    reader: R,
    done: bool,
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<Frame, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match decode_frame(&mut self.reader) {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Frame {
    /// Decode the payload according to the frame's channel.
    pub fn decode(&self) -> Result<Payload, ExportError> {
        match self.channel {
            Channel::Imu => decode_imu(&self.payload).map(Payload::Imu),
            Channel::Lidar => decode_cloud(&self.payload).map(Payload::Lidar),
        }
    }
}
