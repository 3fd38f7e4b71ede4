use std::path::PathBuf;
use std::sync::Arc;

use crate::models::domain::model_ports::ModelSource;
use crate::models::domain::model_state::ModelArtifact;

use super::model_resolver::{self, ProgressFn};

/// Download progress for one artifact: `(artifact, bytes_downloaded, total_bytes)`.
pub type ArtifactProgressFn = Arc<dyn Fn(ModelArtifact, u64, u64) + Send + Sync>;

/// Resolves artifacts through the on-disk cache, an optional local model
/// directory, and finally a download.
///
/// When `base_url` is set, every artifact downloads from `<base_url>/<file name>`;
/// otherwise the artifact's published release URL is used where one exists.
pub struct ResolvedModelSource {
    cache_dir: PathBuf,
    model_dir: Option<PathBuf>,
    base_url: Option<String>,
    progress: Option<ArtifactProgressFn>,
}

impl ResolvedModelSource {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            model_dir: None,
            base_url: None,
            progress: None,
        }
    }

    pub fn with_model_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.model_dir = dir;
        self
    }

    pub fn with_base_url(mut self, url: Option<String>) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_progress(mut self, progress: ArtifactProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn download_url(&self, artifact: ModelArtifact) -> Option<String> {
        match self.base_url {
            Some(ref base) => Some(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                artifact.file_name()
            )),
            None => artifact.release_url().map(str::to_string),
        }
    }
}

impl ModelSource for ResolvedModelSource {
    fn fetch(&self, artifact: ModelArtifact) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let url = self.download_url(artifact);
        let progress: Option<ProgressFn> = self.progress.clone().map(|cb| -> ProgressFn {
            Box::new(move |downloaded, total| cb(artifact, downloaded, total))
        });
        let path = model_resolver::resolve(
            artifact.file_name(),
            url.as_deref(),
            &self.cache_dir,
            self.model_dir.as_deref(),
            progress,
        )?;
        Ok(path)
    }
}
