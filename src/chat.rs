// Chat-platform seam: inbound events and the outbound delivery sink

use async_trait::async_trait;

use crate::downloader::errors::DownloadError;

/// Inbound chat message as handed over by the host framework.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// Raw identifier of the sending user, as extracted from the event
    pub user_id: String,
    /// Full message text
    pub text: String,
}

impl ChatEvent {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

/// Outbound delivery surface. Host adapters implement the three message
/// shapes the plugin emits: plain text, an inline image from raw bytes,
/// and a video reference from a local `file://` URI.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), DownloadError>;

    async fn send_image(&self, bytes: Vec<u8>) -> Result<(), DownloadError>;

    async fn send_video(&self, file_uri: &str) -> Result<(), DownloadError>;
}
