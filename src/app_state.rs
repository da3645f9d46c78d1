use crate::Config;
use crate::api::ApiError;
use mime_guess::Mime;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const STATIC_DIR: &str = "static";

async fn init_workspace(workspace: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(workspace.join(STATIC_DIR)).await
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    static_dir: PathBuf,
    sample_video: PathBuf,
    download_name: String,
    content_type: Mime,
    expose_internal_errors: bool,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let workspace = Path::new(&config.workspace);
        init_workspace(workspace).await?;

        let static_dir = workspace.join(STATIC_DIR);
        let sample_video = static_dir.join(&config.sample_video);

        if !tokio::fs::try_exists(&sample_video).await.unwrap_or(false) {
            warn!(
                path = %sample_video.display(),
                "Please place a sample video file at this path. \
                 The service will still run, but video generation will fail"
            );
        } else {
            info!(path = %sample_video.display(), "Sample video found");
        }

        let content_type = mime_guess::from_path(&config.download_name)
            .first()
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown content type for '{}'", config.download_name)
            })?;

        Ok(Self {
            inner: Arc::new(Inner {
                static_dir,
                sample_video,
                download_name: config.download_name.clone(),
                content_type,
                expose_internal_errors: config.expose_internal_errors,
            }),
        })
    }

    pub fn static_dir(&self) -> &Path {
        self.inner.static_dir.as_path()
    }

    pub fn sample_video(&self) -> &Path {
        self.inner.sample_video.as_path()
    }

    pub fn download_name(&self) -> &str {
        &self.inner.download_name
    }

    pub fn content_type(&self) -> &Mime {
        &self.inner.content_type
    }

    /// Log an unexpected failure and turn it into the 500 response body
    pub fn internal_error(&self, error: impl Display) -> ApiError {
        error!(%error, "Error occurred while generating video");
        if self.inner.expose_internal_errors {
            ApiError::Internal(error.to_string())
        } else {
            ApiError::internal_redacted()
        }
    }
}
