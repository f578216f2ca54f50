// Video identifier extraction from chat message text

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DownloadError;
use super::models::VideoId;

/// Loose pattern the host framework registers as the message trigger.
/// Anything matching this is worth handing to [`extract_video_id`].
pub const TRIGGER_PATTERN: &str =
    r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/)[\w-]+";

lazy_static! {
    // One pattern for every supported URL shape; the capture group is the
    // 11-character identifier. The domain part stays case-sensitive,
    // matching how these URLs appear in the wild.
    static ref VIDEO_ID_RE: Regex = Regex::new(
        r"(?:youtu\.be/|youtube\.com/(?:watch\?v=|embed/|v/|shorts/|user/[^#]+/u/\d/|v=))([a-zA-Z0-9_-]{11})"
    )
    .expect("video id pattern is valid");
}

/// Isolate the canonical 11-character video identifier from a message.
///
/// Recognizes short links, `watch?v=`, `embed/`, `v/`, `shorts/` and
/// channel-scoped `user/.../u/N/` shapes anywhere in the text. Fails with
/// `InvalidIdentifier` when no shape matches. No side effects.
pub fn extract_video_id(text: &str) -> Result<VideoId, DownloadError> {
    let captures = VIDEO_ID_RE
        .captures(text)
        .ok_or_else(|| DownloadError::InvalidIdentifier(text.to_string()))?;
    VideoId::parse(&captures[1])
}
