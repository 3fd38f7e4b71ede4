//! Webcam capture through `nokhwa`.
//!
//! The device handle is created and owned by a dedicated capture thread
//! (not every backend's camera is `Send`). The thread keeps overwriting a
//! single latest-frame slot until the stream is stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::bounded;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};

use crate::capture::domain::camera::{Camera, CaptureConstraints, CaptureError, FrameStream};
use crate::shared::frame::Frame;

/// Back-off after a failed frame grab.
const RETRY_DELAY: Duration = Duration::from_millis(20);

pub struct NokhwaCamera {
    device_index: u32,
}

impl NokhwaCamera {
    pub fn new(device_index: u32) -> Self {
        Self { device_index }
    }
}

impl Camera for NokhwaCamera {
    fn open(
        &mut self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn FrameStream>, CaptureError> {
        let device_index = self.device_index;
        let latest: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = bounded::<Result<(u32, u32), CaptureError>>(1);

        let thread_latest = latest.clone();
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name(format!("camera-{device_index}"))
            .spawn(move || {
                let mut camera = match open_device(device_index, constraints) {
                    Ok(camera) => camera,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let res = camera.resolution();
                let _ = ready_tx.send(Ok((res.width(), res.height())));
                capture_loop(&mut camera, &thread_latest, &thread_stop);
                if let Err(e) = camera.stop_stream() {
                    log::warn!("Failed to stop webcam stream: {e}");
                }
                log::info!("Webcam device {device_index} stopped");
            })
            .map_err(|e| CaptureError::Backend(format!("failed to spawn capture thread: {e}")))?;

        let resolution = match ready_rx.recv() {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(CaptureError::Backend("capture thread exited".into()));
            }
        };

        Ok(Box::new(NokhwaStream {
            latest,
            stop,
            handle: Some(handle),
            resolution,
        }))
    }
}

fn open_device(
    device_index: u32,
    constraints: CaptureConstraints,
) -> Result<nokhwa::Camera, CaptureError> {
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let mut camera = nokhwa::Camera::new(CameraIndex::Index(device_index), requested)
        .map_err(|e| classify(format!("device {device_index}: {e}"), CaptureError::NoDevice))?;

    camera
        .open_stream()
        .map_err(|e| classify(e.to_string(), CaptureError::Backend))?;

    if let Err(e) = camera.set_resolution(Resolution::new(constraints.width, constraints.height)) {
        log::warn!(
            "Could not set resolution {}x{}: {e}. Using camera default.",
            constraints.width,
            constraints.height
        );
    }

    let res = camera.resolution();
    if res.width() == 0 || res.height() == 0 {
        return Err(CaptureError::Unsatisfiable {
            width: constraints.width,
            height: constraints.height,
            reason: "device reported an empty resolution".into(),
        });
    }
    Ok(camera)
}

/// Maps an OS-level failure to `PermissionDenied` when it reads like one.
fn classify(message: String, fallback: fn(String) -> CaptureError) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied(message)
    } else {
        fallback(message)
    }
}

fn capture_loop(camera: &mut nokhwa::Camera, latest: &Mutex<Option<Frame>>, stop: &AtomicBool) {
    let mut index = 0usize;
    while !stop.load(Ordering::Relaxed) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(image) => {
                let (width, height) = (image.width(), image.height());
                let frame = Frame::new(image.to_vec(), width, height, index);
                *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
                index += 1;
            }
            Err(e) => {
                log::warn!("Dropped webcam frame: {e}");
                thread::sleep(RETRY_DELAY);
            }
        }
    }
}

struct NokhwaStream {
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    resolution: (u32, u32),
}

impl FrameStream for NokhwaStream {
    fn latest_frame(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Drop for NokhwaStream {
    fn drop(&mut self) {
        self.stop();
    }
}
