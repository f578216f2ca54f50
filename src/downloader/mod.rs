// Acquisition pipeline - extraction, resolution, download, cleanup

pub mod cleanup;
pub mod errors;
pub mod extract;
pub mod models;
pub mod net;
pub mod normalize;
pub mod orchestrator;
pub mod stream_selector;
pub mod traits;

pub use errors::DownloadError;
pub use extract::{extract_video_id, TRIGGER_PATTERN};
pub use models::{
    DownloadJob, JobState, NetworkConfig, StreamDescriptor, VideoId, VideoMetadata,
};
pub use normalize::normalize_count;
pub use orchestrator::Orchestrator;
pub use traits::{DownloadProgress, ProgressCallback, ResolvedVideo, VideoProvider};
