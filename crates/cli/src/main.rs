mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use faceenroll_core::capture::domain::camera::{Camera, CaptureConstraints};
use faceenroll_core::capture::domain::capture_source::CaptureSource;
use faceenroll_core::capture::domain::snapshot::{Snapshot, SnapshotError};
use faceenroll_core::capture::infrastructure::still_image_camera::StillImageCamera;
use faceenroll_core::enrollment::domain::enrollment_request::EnrollmentRequest;
use faceenroll_core::enrollment::infrastructure::http_enrollment_api::HttpEnrollmentApi;
use faceenroll_core::models::domain::model_loader::ModelLoader;
use faceenroll_core::models::domain::model_state::ModelArtifact;
use faceenroll_core::models::infrastructure::model_resolver::model_cache_dir;
use faceenroll_core::models::infrastructure::onnx_model_backend::OnnxModelBackend;
use faceenroll_core::models::infrastructure::resolved_model_source::ResolvedModelSource;
use faceenroll_core::pipeline::enrollment_submitter::EnrollmentSubmitter;
use faceenroll_core::pipeline::enrollment_workflow::EnrollmentWorkflow;
use faceenroll_core::pipeline::frame_snapshotter::FrameSnapshotter;
use faceenroll_core::pipeline::pipeline_logger::LogPipelineLogger;

use settings::Settings;

/// Capture a face and enroll it under an identity label.
#[derive(Parser, Debug)]
#[command(name = "faceenroll")]
struct Cli {
    /// Identity label (username) to enroll.
    #[arg(long)]
    label: String,

    /// Use a still image as the camera instead of a webcam.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Webcam device index.
    #[arg(long)]
    device: Option<u32>,

    /// Enrollment API endpoint.
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory searched for model files before downloading.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Base URL models are downloaded from (`<url>/<file name>`).
    #[arg(long)]
    model_url: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Snapshot width in pixels; height follows the 16:9 aspect.
    #[arg(long)]
    snapshot_width: Option<u32>,

    /// Seconds to wait for the camera's first frame.
    #[arg(long, default_value = "5")]
    frame_timeout: u64,

    /// Also write the snapshot to this PNG file.
    #[arg(long)]
    save_snapshot: Option<PathBuf>,

    /// Print the enrollment request instead of sending it.
    #[arg(long)]
    dry_run: bool,

    /// Persist the effective settings for future runs.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = merge(Settings::load(), &cli);
    validate(&cli, &settings)?;

    if cli.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    let progress_shown = Arc::new(AtomicBool::new(false));
    let loader = Arc::new(build_loader(&settings, progress_shown.clone())?);
    let camera = build_camera(&cli, &settings)?;
    let api = HttpEnrollmentApi::new(
        settings.endpoint.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    )?;

    let mut workflow = EnrollmentWorkflow::new(
        loader,
        CaptureSource::new(camera),
        FrameSnapshotter::new(settings.snapshot_width),
        EnrollmentSubmitter::new(Box::new(api)),
        Box::new(LogPipelineLogger::new()),
    );
    workflow.set_label(cli.label.clone());

    let loaded = workflow.load_models();
    if progress_shown.load(Ordering::Relaxed) {
        eprintln!();
    }
    loaded?;

    workflow.start_camera(CaptureConstraints::new(
        settings.camera_width,
        settings.camera_height,
    ))?;
    let timeout = Duration::from_secs(cli.frame_timeout);
    if workflow
        .capture_stream()
        .and_then(|stream| stream.wait_for_frame(timeout))
        .is_none()
    {
        return Err(format!("Camera produced no frame within {}s", cli.frame_timeout).into());
    }

    let faces = workflow.take_snapshot()?;
    workflow.stop_camera();

    if let (Some(path), Some(snapshot)) = (&cli.save_snapshot, workflow.session().snapshot()) {
        snapshot.save(path)?;
        log::info!("Snapshot written to {}", path.display());
    }

    if faces == 0 {
        return Err("No face detected in snapshot; retake with the face clearly visible".into());
    }

    if cli.dry_run {
        let request = workflow.request().ok_or("Enrollment is not ready to submit")?;
        let (width, height) = decoded_image_size(&request)?;
        log::info!("Request image decodes to {width}x{height}");
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        let ack = workflow.submit()?;
        println!("{}", serde_json::to_string_pretty(&ack.body)?);
        log::info!("Enrolled {} at {}", cli.label, settings.endpoint);
    }

    workflow.logger().summary();
    Ok(())
}

/// Command-line values override persisted settings for this run.
fn merge(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(ref endpoint) = cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(ref dir) = cli.model_dir {
        settings.model_dir = Some(dir.clone());
    }
    if let Some(ref url) = cli.model_url {
        settings.model_base_url = Some(url.clone());
    }
    if let Some(device) = cli.device {
        settings.camera_device = device;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(width) = cli.snapshot_width {
        settings.snapshot_width = width;
    }
    settings
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if cli.label.is_empty() {
        return Err("--label must not be empty".into());
    }
    if let Some(ref image) = cli.image {
        if !image.exists() {
            return Err(format!("Image file not found: {}", image.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if settings.snapshot_width == 0 {
        return Err("Snapshot width must be positive".into());
    }
    if settings.camera_width == 0 || settings.camera_height == 0 {
        return Err(format!(
            "Camera resolution must be positive, got {}x{}",
            settings.camera_width, settings.camera_height
        )
        .into());
    }
    if !cli.dry_run && settings.endpoint.is_empty() {
        return Err("An enrollment endpoint is required unless --dry-run is used".into());
    }
    Ok(())
}

fn build_loader(
    settings: &Settings,
    progress_shown: Arc<AtomicBool>,
) -> Result<ModelLoader, Box<dyn std::error::Error>> {
    let source = ResolvedModelSource::new(model_cache_dir()?)
        .with_model_dir(settings.model_dir.clone())
        .with_base_url(settings.model_base_url.clone())
        .with_progress(Arc::new(download_progress(progress_shown)));
    let backend = OnnxModelBackend::new(settings.confidence);
    Ok(ModelLoader::new(Box::new(source), Box::new(backend)))
}

fn build_camera(cli: &Cli, settings: &Settings) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    if let Some(ref image) = cli.image {
        return Ok(Box::new(StillImageCamera::from_path(image)));
    }
    webcam(settings.camera_device)
}

#[cfg(feature = "webcam")]
fn webcam(device: u32) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    use faceenroll_core::capture::infrastructure::nokhwa_camera::NokhwaCamera;
    Ok(Box::new(NokhwaCamera::new(device)))
}

#[cfg(not(feature = "webcam"))]
fn webcam(_device: u32) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    Err("Built without webcam support; pass --image or rebuild with --features webcam".into())
}

/// Prints download progress on one line and raises `shown` once anything
/// has been printed, so the caller knows to end that line.
fn download_progress(shown: Arc<AtomicBool>) -> impl Fn(ModelArtifact, u64, u64) + Send + Sync {
    move |artifact, downloaded, total| {
        shown.store(true, Ordering::Relaxed);
        eprint!("\r{}", progress_line(artifact, downloaded, total));
    }
}

fn progress_line(artifact: ModelArtifact, downloaded: u64, total: u64) -> String {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        format!("Downloading {artifact} model... {pct}%")
    } else {
        format!("Downloading {artifact} model... {downloaded} bytes")
    }
}

/// Decodes the request's image back into pixels, confirming the payload
/// carries a valid PNG before it is shown or sent.
fn decoded_image_size(request: &EnrollmentRequest) -> Result<(u32, u32), SnapshotError> {
    let snapshot = Snapshot::from_data_url(&request.img_url)?;
    Ok((snapshot.width(), snapshot.height()))
}
