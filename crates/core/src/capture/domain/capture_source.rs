use std::thread;
use std::time::{Duration, Instant};

use crate::capture::domain::camera::{Camera, CaptureConstraints, CaptureError, FrameStream};
use crate::shared::frame::Frame;

const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An active camera handle together with the constraints it was opened with.
pub struct CaptureStream {
    inner: Box<dyn FrameStream>,
    constraints: CaptureConstraints,
}

impl CaptureStream {
    pub fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.inner.resolution()
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.inner.latest_frame()
    }

    /// Polls until the device has delivered a frame or `timeout` elapses.
    pub fn wait_for_frame(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.latest_frame() {
                return Some(frame);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(FRAME_POLL_INTERVAL);
        }
    }

    fn stop(&mut self) {
        self.inner.stop();
    }
}

/// Owns at most one live [`CaptureStream`].
///
/// Starting again stops and releases the previous stream first; dropping the
/// source releases whatever stream is still running.
pub struct CaptureSource {
    camera: Box<dyn Camera>,
    stream: Option<CaptureStream>,
}

impl CaptureSource {
    pub fn new(camera: Box<dyn Camera>) -> Self {
        Self {
            camera,
            stream: None,
        }
    }

    pub fn start(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<&CaptureStream, CaptureError> {
        self.stop();

        let inner = self.camera.open(constraints)?;
        let (width, height) = inner.resolution();
        log::info!(
            "Camera opened at {width}x{height} (requested {}x{})",
            constraints.width,
            constraints.height
        );
        Ok(self.stream.insert(CaptureStream { inner, constraints }))
    }

    pub fn stream(&self) -> Option<&CaptureStream> {
        self.stream.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::debug!("Camera stream released");
        }
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.stop();
    }
}
