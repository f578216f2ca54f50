// Error types for the acquisition pipeline

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// No recognizable video URL shape in the message text
    InvalidIdentifier(String),

    /// Abbreviated count string could not be parsed
    InvalidCountFormat(String),

    /// Metadata or stream resolution failed (network or provider error)
    Resolution(String),

    /// Thumbnail fetch failed; degrades to a text notice, never fatal
    Thumbnail(String),

    /// Ephemeral file allocation or write failed
    Io(String),

    /// The chat sink rejected a message
    Delivery(String),

    /// Deleting the ephemeral file failed; the file is leaked and logged
    Cleanup(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier(text) => write!(f, "No valid video id in: {}", text),
            Self::InvalidCountFormat(raw) => write!(f, "Invalid count string: {}", raw),
            Self::Resolution(msg) => write!(f, "{}", msg),
            Self::Thumbnail(msg) => write!(f, "Thumbnail fetch failed: {}", msg),
            Self::Io(msg) => write!(f, "File error: {}", msg),
            Self::Delivery(msg) => write!(f, "Delivery failed: {}", msg),
            Self::Cleanup(msg) => write!(f, "Cleanup failed: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl DownloadError {
    /// Whether the failure text points at a connectivity problem rather
    /// than a provider-side rejection. Drives the proxy hint appended to
    /// the user-facing error message.
    pub fn looks_like_connectivity(&self) -> bool {
        let msg = match self {
            Self::Resolution(msg) | Self::Thumbnail(msg) => msg.as_str(),
            _ => return false,
        };

        let msg = msg.to_ascii_lowercase();
        msg.contains("fetch failed")
            || msg.contains("timeout")
            || msg.contains("timed out")
            || msg.contains("connect")
            || msg.contains("dns")
            || msg.contains("proxy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_detection_on_resolution_text() {
        assert!(DownloadError::Resolution("fetch failed: reset by peer".into())
            .looks_like_connectivity());
        assert!(DownloadError::Resolution("request timed out".into()).looks_like_connectivity());
        assert!(DownloadError::Resolution("error trying to CONNECT".into())
            .looks_like_connectivity());
        assert!(!DownloadError::Resolution("video is private".into()).looks_like_connectivity());
    }

    #[test]
    fn non_network_variants_never_look_like_connectivity() {
        assert!(!DownloadError::InvalidIdentifier("timeout".into()).looks_like_connectivity());
        assert!(!DownloadError::Cleanup("connection refused".into()).looks_like_connectivity());
    }
}
