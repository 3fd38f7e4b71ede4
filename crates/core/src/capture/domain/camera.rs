use thiserror::Error;

use crate::shared::frame::Frame;

/// Requested stream resolution. Devices may deliver something close to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
}

impl CaptureConstraints {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera device available: {0}")]
    NoDevice(String),
    #[error("camera cannot satisfy {width}x{height}: {reason}")]
    Unsatisfiable {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("camera failed: {0}")]
    Backend(String),
}

/// A physical or virtual camera device.
pub trait Camera: Send {
    /// Starts streaming. The returned stream owns the device until stopped.
    fn open(&mut self, constraints: CaptureConstraints)
        -> Result<Box<dyn FrameStream>, CaptureError>;
}

/// A live stream of frames from an opened camera.
pub trait FrameStream: Send {
    /// Most recent frame, or `None` before the first frame has arrived.
    fn latest_frame(&self) -> Option<Frame>;

    /// Resolution the device actually negotiated.
    fn resolution(&self) -> (u32, u32);

    /// Releases the device. Calling it twice is harmless.
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_messages_carry_cause() {
        let err = CaptureError::PermissionDenied("user dismissed prompt".into());
        assert!(err.to_string().contains("user dismissed prompt"));

        let err = CaptureError::Unsatisfiable {
            width: 640,
            height: 360,
            reason: "zero-sized".into(),
        };
        assert!(err.to_string().contains("640x360"));
    }
}
