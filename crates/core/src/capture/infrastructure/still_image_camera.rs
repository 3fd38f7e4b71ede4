use std::path::{Path, PathBuf};

use crate::capture::domain::camera::{Camera, CaptureConstraints, CaptureError, FrameStream};
use crate::shared::frame::Frame;

/// Virtual camera that serves one decoded still image as every frame.
///
/// The image is decoded on `open`, so a missing or unreadable file surfaces
/// as `NoDevice` at the same point a real device would fail.
pub struct StillImageCamera {
    source: StillSource,
}

enum StillSource {
    File(PathBuf),
    Frame(Frame),
}

impl StillImageCamera {
    pub fn from_path(path: &Path) -> Self {
        Self {
            source: StillSource::File(path.to_path_buf()),
        }
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self {
            source: StillSource::Frame(frame),
        }
    }

    fn decode(&self) -> Result<Frame, CaptureError> {
        match self.source {
            StillSource::Frame(ref frame) => Ok(frame.clone()),
            StillSource::File(ref path) => {
                let image = image::open(path)
                    .map_err(|e| CaptureError::NoDevice(format!("{}: {e}", path.display())))?;
                Ok(Frame::from_rgb_image(image.to_rgb8(), 0))
            }
        }
    }
}

impl Camera for StillImageCamera {
    fn open(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn FrameStream>, CaptureError> {
        if constraints.width == 0 || constraints.height == 0 {
            return Err(CaptureError::Unsatisfiable {
                width: constraints.width,
                height: constraints.height,
                reason: "resolution must be non-zero".into(),
            });
        }
        let frame = self.decode()?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(CaptureError::Backend("image has no pixels".into()));
        }
        log::debug!(
            "Still image camera serving {}x{} frames",
            frame.width(),
            frame.height()
        );
        Ok(Box::new(StillImageStream { frame: Some(frame) }))
    }
}

struct StillImageStream {
    frame: Option<Frame>,
}

impl FrameStream for StillImageStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    fn resolution(&self) -> (u32, u32) {
        self.frame
            .as_ref()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0))
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn constraints() -> CaptureConstraints {
        CaptureConstraints::new(640, 360)
    }

    #[test]
    fn test_serves_frame_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("face.png");
        RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let mut camera = StillImageCamera::from_path(&path);
        let stream = camera.open(constraints()).unwrap();

        assert_eq!(stream.resolution(), (8, 6));
        let frame = stream.latest_frame().unwrap();
        assert_eq!(&frame.data()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_missing_file_is_no_device() {
        let mut camera = StillImageCamera::from_path(Path::new("/nonexistent/face.png"));
        let result = camera.open(constraints());
        assert!(matches!(result, Err(CaptureError::NoDevice(_))));
    }

    #[test]
    fn test_zero_constraints_are_unsatisfiable() {
        let mut camera = StillImageCamera::from_frame(Frame::new(vec![0; 3], 1, 1, 0));
        let result = camera.open(CaptureConstraints::new(0, 360));
        assert!(matches!(result, Err(CaptureError::Unsatisfiable { .. })));
    }

    #[test]
    fn test_stopped_stream_has_no_frames() {
        let mut camera = StillImageCamera::from_frame(Frame::new(vec![0; 3], 1, 1, 0));
        let mut stream = camera.open(constraints()).unwrap();
        stream.stop();
        assert!(stream.latest_frame().is_none());
        stream.stop();
    }
}
