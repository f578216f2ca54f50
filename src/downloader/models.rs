// Core data model for acquisition requests

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use super::errors::DownloadError;
use super::normalize::normalize_count;

/// Length of a canonical video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// The exactly-11-character opaque token naming a video at the provider.
/// Immutable once produced; only the extractor and [`VideoId::parse`]
/// construct one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Validate an already-isolated token: 11 characters from
    /// `[a-zA-Z0-9_-]`, nothing else.
    pub fn parse(raw: &str) -> Result<Self, DownloadError> {
        let valid = raw.len() == VIDEO_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DownloadError::InvalidIdentifier(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Where the provider buries the raw subscriber-count string inside its
// watch-page detail blob.
const SUBSCRIBER_COUNT_POINTER: &str = "/contents/twoColumnWatchNextResults/results/results\
/contents/1/videoSecondaryInfoRenderer/owner/videoOwnerRenderer/subscriberCountText/simpleText";

/// Descriptive metadata for one video, built once per request from the
/// provider's raw fields and discarded after the summary is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub views: u64,
    /// Missing when the provider withholds the like count
    pub likes: Option<u64>,
    pub publish_date: Date,
    pub description: String,
    /// Missing when the provider withholds the author name
    pub author: Option<String>,
    pub thumbnail_url: String,
    /// Provider-specific nested structure; the raw subscriber-count
    /// string lives deep inside it.
    pub details: Value,
}

impl VideoMetadata {
    /// The raw abbreviated subscriber-count string (e.g. "3.74M
    /// subscribers"), dug out of the provider detail blob.
    pub fn subscriber_count_text(&self) -> Option<&str> {
        self.details
            .pointer(SUBSCRIBER_COUNT_POINTER)
            .and_then(Value::as_str)
    }

    /// Display-ready summary sent to the chat after the thumbnail.
    /// Missing likes or author become "unknown"; the subscriber count is
    /// normalized to an exact integer before display.
    pub fn summary_text(&self) -> Result<String, DownloadError> {
        let likes = self
            .likes
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let author = self.author.as_deref().unwrap_or("unknown");
        let raw_subscribers = self.subscriber_count_text().ok_or_else(|| {
            DownloadError::Resolution("subscriber count missing from provider details".to_string())
        })?;
        let subscribers = normalize_count(raw_subscribers)?;
        let date = self.publish_date;

        Ok(format!(
            "Title: {}\n\
             👀: {} 👍: {}\n\
             Published: {:04}-{:02}-{:02}\n\
             Description: {}\n\n\
             ------\n\
             Author: {}\nSubscribers: {}",
            self.title,
            self.views,
            likes,
            date.year(),
            u8::from(date.month()),
            date.day(),
            self.description,
            author,
            subscribers,
        ))
    }
}

/// One selectable stream as offered by the provider, ranked by resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Provider-side format id (e.g. "22")
    pub itag: String,
    /// Container extension (mp4, webm)
    pub ext: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    /// Total bitrate in kbps
    pub bitrate: Option<f32>,
}

impl StreamDescriptor {
    pub fn resolution_label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            (_, Some(h)) => format!("{}p", h),
            _ => "unknown".to_string(),
        }
    }
}

/// Per-request network settings, snapshotted from the runtime policy.
/// An absent proxy means a direct connection.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub proxy: Option<String>,
}

/// Lifecycle of one acquisition request's ephemeral file. States only
/// advance; the file exists on disk exactly while the state is
/// `Downloading` or `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobState {
    Pending,
    Downloading,
    Delivered,
    Cleaned,
    CleanupFailed,
}

/// A single download in flight. Owns the ephemeral file exclusively from
/// creation until the reclaimer deletes it (or fails to and leaks it).
#[derive(Debug)]
pub struct DownloadJob {
    pub video_id: VideoId,
    pub path: PathBuf,
    pub stream: StreamDescriptor,
    state: JobState,
}

impl DownloadJob {
    pub fn new(video_id: VideoId, path: PathBuf, stream: StreamDescriptor) -> Self {
        Self {
            video_id,
            path,
            stream,
            state: JobState::Pending,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Advance the lifecycle. Going backwards is a logic bug.
    pub fn advance(&mut self, next: JobState) {
        debug_assert!(
            next > self.state,
            "job state must advance monotonically: {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Local-file reference handed to the delivery sink.
    pub fn file_uri(&self) -> String {
        format!("file://{}", self.path.display())
    }
}
