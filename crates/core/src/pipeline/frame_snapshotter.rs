use image::imageops::{self, FilterType};

use crate::capture::domain::capture_source::CaptureStream;
use crate::capture::domain::snapshot::{Snapshot, SnapshotError};
use crate::shared::constants::{snapshot_height, SNAPSHOT_WIDTH};
use crate::shared::data_url::DataUrlError;
use crate::shared::frame::Frame;

/// Freezes the current frame of a live stream at the fixed enrollment size.
///
/// Output is always `width x round(width / (16/9))`, independent of the
/// stream's own resolution.
pub struct FrameSnapshotter {
    width: u32,
    height: u32,
}

impl FrameSnapshotter {
    pub fn new(width: u32) -> Self {
        Self {
            width,
            height: snapshot_height(width),
        }
    }

    pub fn capture(&self, stream: Option<&CaptureStream>) -> Result<Snapshot, SnapshotError> {
        let frame = stream
            .and_then(CaptureStream::latest_frame)
            .ok_or(SnapshotError::StreamNotReady)?;
        let resized = self.resize(&frame)?;
        log::debug!(
            "Snapshot of frame {} ({}x{}) at {}x{}",
            frame.index(),
            frame.width(),
            frame.height(),
            self.width,
            self.height
        );
        Snapshot::encode(resized)
    }

    fn resize(&self, frame: &Frame) -> Result<Frame, SnapshotError> {
        let image = frame
            .to_rgb_image()
            .ok_or(SnapshotError::Encode(DataUrlError::InvalidRaster))?;
        let resized = imageops::resize(&image, self.width, self.height, FilterType::Triangle);
        Ok(Frame::from_rgb_image(resized, 0))
    }
}

impl Default for FrameSnapshotter {
    fn default() -> Self {
        Self::new(SNAPSHOT_WIDTH)
    }
}
