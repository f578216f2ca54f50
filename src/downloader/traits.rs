// Seam to the metadata/stream provider

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::models::{NetworkConfig, StreamDescriptor, VideoId, VideoMetadata};

/// What one resolution round returns: normalized metadata plus the set of
/// selectable streams.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub metadata: VideoMetadata,
    pub streams: Vec<StreamDescriptor>,
}

/// Download progress snapshot fed to the progress callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Progress observer shared with the provider for both resolution and
/// download.
pub type ProgressCallback = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// Progress callback that reports to the debug log.
pub fn log_progress() -> ProgressCallback {
    Arc::new(|p: DownloadProgress| {
        tracing::debug!(percent = p.percent, status = %p.status, "download progress");
    })
}

/// The external metadata/stream provider. Implementations wrap whatever
/// library actually talks to the video platform; the orchestrator only
/// sees this surface.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Resolve provider metadata and the selectable streams for a video,
    /// over the configured proxy (absence means a direct connection).
    async fn resolve(
        &self,
        id: &VideoId,
        net: &NetworkConfig,
        on_progress: ProgressCallback,
    ) -> Result<ResolvedVideo, DownloadError>;

    /// Download one stream to `dest`, fully written before returning.
    async fn download(
        &self,
        stream: &StreamDescriptor,
        dest: &Path,
        net: &NetworkConfig,
        on_progress: ProgressCallback,
    ) -> Result<(), DownloadError>;
}
