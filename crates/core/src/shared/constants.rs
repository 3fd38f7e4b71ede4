pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const LANDMARK_MODEL_NAME: &str = "face_landmark_68.onnx";

pub const DESCRIPTOR_MODEL_NAME: &str = "w600k_r50.onnx";
pub const DESCRIPTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Requested live-preview resolution.
pub const CAMERA_WIDTH: u32 = 640;
pub const CAMERA_HEIGHT: u32 = 360;

/// Enrollment snapshots are always this wide; height follows from `SNAPSHOT_ASPECT`.
pub const SNAPSHOT_WIDTH: u32 = 414;
pub const SNAPSHOT_ASPECT: f64 = 16.0 / 9.0;

pub const SNAPSHOT_MIME: &str = "image/png";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/register";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Snapshot height for a given width at the fixed enrollment aspect ratio.
pub fn snapshot_height(width: u32) -> u32 {
    (width as f64 / SNAPSHOT_ASPECT).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(414, 233)]
    #[case(1920, 1080)]
    #[case(640, 360)]
    #[case(1, 1)]
    fn test_snapshot_height(#[case] width: u32, #[case] expected: u32) {
        assert_eq!(snapshot_height(width), expected);
    }
}
