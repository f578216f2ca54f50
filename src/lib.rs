//! Chat-bot plugin core for YouTube video acquisition.
//!
//! Watches a chat stream for YouTube links, resolves them into a
//! downloadable video, delivers thumbnail, metadata summary and the file
//! itself to the chat, and reclaims the ephemeral file after a
//! configurable delay.
//!
//! The chat platform, the metadata/stream provider and persistent
//! configuration storage are external collaborators: a host adapter
//! implements [`ChatSink`] and [`VideoProvider`], registers
//! [`TRIGGER_PATTERN`] and the admin commands, and routes matched
//! messages into [`TubeFetch`].

pub mod chat;
pub mod config;
pub mod downloader;
pub mod handlers;
pub mod policy;

pub use chat::{ChatEvent, ChatSink};
pub use config::{Config, ConfigError};
pub use downloader::{
    extract_video_id, normalize_count, DownloadError, DownloadJob, DownloadProgress, JobState,
    NetworkConfig, Orchestrator, ProgressCallback, ResolvedVideo, StreamDescriptor, VideoId,
    VideoMetadata, VideoProvider, TRIGGER_PATTERN,
};
pub use handlers::{TubeFetch, COMMAND_PREFIX, USAGE};
pub use policy::{PolicyError, PolicyStore, RuntimePolicy, DEFAULT_TIMEOUT_SECS};
