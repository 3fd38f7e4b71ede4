use std::path::Path;

use thiserror::Error;

use crate::shared::data_url::{self, DataUrlError};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("stream not ready")]
    StreamNotReady,
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] DataUrlError),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] DataUrlError),
    #[error("failed to write snapshot to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One frozen frame at enrollment resolution plus its PNG data URL.
///
/// Immutable; a new capture produces a new snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    frame: Frame,
    data_url: String,
}

impl Snapshot {
    pub fn encode(frame: Frame) -> Result<Self, SnapshotError> {
        let data_url = data_url::to_png_data_url(&frame).map_err(SnapshotError::Encode)?;
        Ok(Self { frame, data_url })
    }

    pub fn from_data_url(url: &str) -> Result<Self, SnapshotError> {
        let frame = data_url::from_png_data_url(url).map_err(SnapshotError::Decode)?;
        Ok(Self {
            frame,
            data_url: url.to_string(),
        })
    }

    /// The decoded raster the face models run on.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Writes the snapshot as a PNG file.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let png = data_url::encode_png(&self.frame).map_err(SnapshotError::Encode)?;
        std::fs::write(path, png).map_err(|e| SnapshotError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}
