// Acquisition orchestration - admission, resolution, delivery, handoff

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::chat::ChatSink;
use crate::policy::PolicyStore;

use super::cleanup;
use super::errors::DownloadError;
use super::extract::extract_video_id;
use super::models::{DownloadJob, JobState, NetworkConfig, VideoId};
use super::net;
use super::stream_selector;
use super::traits::{log_progress, VideoProvider};

/// Drives one video request from identifier to delivered file, then hands
/// the ephemeral file to the reclaimer.
pub struct Orchestrator {
    provider: Arc<dyn VideoProvider>,
    sink: Arc<dyn ChatSink>,
    policy: PolicyStore,
    /// The bot's own user id; its messages are never handled
    self_id: String,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        sink: Arc<dyn ChatSink>,
        policy: PolicyStore,
        self_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            sink,
            policy,
            self_id: self_id.into(),
        }
    }

    /// Entry point for a trigger-matched message. Extraction runs here so
    /// a junk link is dropped before any network round-trip.
    pub async fn handle_message(&self, text: &str, requester_id: &str) {
        match extract_video_id(text) {
            Ok(id) => self.handle_request(&id, requester_id).await,
            Err(e) => debug!(%e, "trigger matched but no identifier extracted"),
        }
    }

    /// Run the full request state machine. Every failure past admission
    /// is caught here, reported to the requester exactly once, and
    /// logged; nothing propagates to the host process.
    pub async fn handle_request(&self, id: &VideoId, requester_id: &str) {
        if requester_id == self.self_id {
            return;
        }
        if self.policy.is_banned(requester_id).await {
            info!(user = requester_id, "denylisted user ignored");
            return;
        }

        if let Err(e) = self.run(id).await {
            let mut message = format!("Processing failed: {}", e);
            if e.looks_like_connectivity() {
                let proxy = self.policy.proxy().await;
                message.push_str(&format!(
                    "\nCurrent proxy: {}\nUse the proxy command to reconfigure it",
                    proxy.as_deref().unwrap_or("none"),
                ));
            }
            if let Err(send_err) = self.sink.send_text(&message).await {
                error!(video_id = %id, %send_err, "failed to report the error to the chat");
            }
            error!(video_id = %id, %e, "video request failed");
        }
    }

    // Steps from acknowledgment through reclaimer handoff.
    async fn run(&self, id: &VideoId) -> Result<(), DownloadError> {
        self.sink
            .send_text("Resolving YouTube video, please wait")
            .await?;

        let net = NetworkConfig {
            proxy: self.policy.proxy().await,
        };
        let resolved = self.provider.resolve(id, &net, log_progress()).await?;

        // Thumbnail delivery is best-effort: any failure here degrades to
        // a notice and the request continues.
        match net::fetch_thumbnail(&resolved.metadata.thumbnail_url, &net).await {
            Ok(bytes) => self.sink.send_image(bytes).await?,
            Err(e) => {
                error!(video_id = %id, %e, "thumbnail fetch failed");
                self.sink
                    .send_text("Could not fetch the thumbnail, continuing with the download")
                    .await?;
            }
        }

        self.sink.send_text(&resolved.metadata.summary_text()?).await?;

        let stream = stream_selector::highest_resolution(&resolved.streams)
            .ok_or_else(|| {
                DownloadError::Resolution("no downloadable stream offered".to_string())
            })?
            .clone();

        let path = allocate_ephemeral_path()?;
        let mut job = DownloadJob::new(id.clone(), path, stream);
        job.advance(JobState::Downloading);

        if let Err(e) = self.deliver(&mut job, &net).await {
            // Release the ephemeral file on the failure path too; only a
            // failed cleanup may leak it.
            if let Err(rm) = tokio::fs::remove_file(&job.path).await {
                warn!(video_id = %id, path = %job.path.display(), %rm, "could not remove file after failed delivery");
            }
            return Err(e);
        }

        cleanup::schedule(job, self.policy.clone());
        Ok(())
    }

    // Synchronous with respect to the request: the file is fully written
    // before the reference is sent.
    async fn deliver(&self, job: &mut DownloadJob, net: &NetworkConfig) -> Result<(), DownloadError> {
        self.provider
            .download(&job.stream, &job.path, net, log_progress())
            .await?;
        debug!(video_id = %job.video_id, path = %job.path.display(), "video downloaded");

        self.sink.send_video(&job.file_uri()).await?;
        job.advance(JobState::Delivered);
        Ok(())
    }
}

/// Allocate a fresh ephemeral path, owned by the job until cleanup.
fn allocate_ephemeral_path() -> Result<PathBuf, DownloadError> {
    let file = tempfile::Builder::new()
        .prefix("tubefetch-")
        .suffix(".mp4")
        .tempfile()
        .map_err(|e| DownloadError::Io(e.to_string()))?;
    file.into_temp_path()
        .keep()
        .map_err(|e| DownloadError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{StreamDescriptor, VideoMetadata};
    use crate::downloader::traits::{ProgressCallback, ResolvedVideo};
    use async_trait::async_trait;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;
    use time::macros::date;

    #[derive(Debug, PartialEq)]
    enum Sent {
        Text(String),
        Image(usize),
        Video(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<Sent> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    #[async_trait]
    impl ChatSink for RecordingSink {
        async fn send_text(&self, text: &str) -> Result<(), DownloadError> {
            self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
            Ok(())
        }

        async fn send_image(&self, bytes: Vec<u8>) -> Result<(), DownloadError> {
            self.sent.lock().unwrap().push(Sent::Image(bytes.len()));
            Ok(())
        }

        async fn send_video(&self, file_uri: &str) -> Result<(), DownloadError> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Video(file_uri.to_string()));
            Ok(())
        }
    }

    struct FakeProvider {
        fail_resolution: Option<String>,
        downloaded: Mutex<Vec<PathBuf>>,
    }

    impl FakeProvider {
        fn ok() -> Self {
            Self {
                fail_resolution: None,
                downloaded: Mutex::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                fail_resolution: Some(msg.to_string()),
                downloaded: Mutex::new(Vec::new()),
            }
        }

        fn downloads(&self) -> Vec<PathBuf> {
            self.downloaded.lock().unwrap().clone()
        }
    }

    fn make_metadata() -> VideoMetadata {
        VideoMetadata {
            title: "Some video".to_string(),
            views: 1000,
            likes: Some(10),
            publish_date: date!(2024 - 03 - 09),
            description: "desc".to_string(),
            author: Some("Channel".to_string()),
            // Unroutable so the thumbnail step exercises its fallback.
            thumbnail_url: "http://127.0.0.1:1/thumb.jpg".to_string(),
            details: json!({
                "contents": { "twoColumnWatchNextResults": { "results": { "results": {
                    "contents": [
                        {},
                        { "videoSecondaryInfoRenderer": { "owner": { "videoOwnerRenderer": {
                            "subscriberCountText": { "simpleText": "2K subscribers" }
                        }}}}
                    ]
                }}}}
            }),
        }
    }

    #[async_trait]
    impl VideoProvider for FakeProvider {
        async fn resolve(
            &self,
            _id: &VideoId,
            _net: &NetworkConfig,
            _on_progress: ProgressCallback,
        ) -> Result<ResolvedVideo, DownloadError> {
            if let Some(msg) = &self.fail_resolution {
                return Err(DownloadError::Resolution(msg.clone()));
            }
            Ok(ResolvedVideo {
                metadata: make_metadata(),
                streams: vec![
                    StreamDescriptor {
                        itag: "18".to_string(),
                        ext: "mp4".to_string(),
                        width: Some(640),
                        height: Some(360),
                        filesize: None,
                        bitrate: None,
                    },
                    StreamDescriptor {
                        itag: "22".to_string(),
                        ext: "mp4".to_string(),
                        width: Some(1280),
                        height: Some(720),
                        filesize: None,
                        bitrate: None,
                    },
                ],
            })
        }

        async fn download(
            &self,
            _stream: &StreamDescriptor,
            dest: &Path,
            _net: &NetworkConfig,
            _on_progress: ProgressCallback,
        ) -> Result<(), DownloadError> {
            tokio::fs::write(dest, b"video bytes").await?;
            self.downloaded.lock().unwrap().push(dest.to_path_buf());
            Ok(())
        }
    }

    fn make_orchestrator(
        provider: Arc<FakeProvider>,
        sink: Arc<RecordingSink>,
        policy: PolicyStore,
    ) -> Orchestrator {
        Orchestrator::new(provider, sink, policy, "999")
    }

    fn test_id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn full_request_delivers_notice_summary_and_file() {
        let provider = Arc::new(FakeProvider::ok());
        let sink = Arc::new(RecordingSink::default());
        let orch = make_orchestrator(provider.clone(), sink.clone(), PolicyStore::default());

        orch.handle_request(&test_id(), "42").await;

        let sent = sink.messages();
        assert_eq!(
            sent[0],
            Sent::Text("Resolving YouTube video, please wait".to_string())
        );
        // Unroutable thumbnail URL degrades to the fallback notice.
        assert_eq!(
            sent[1],
            Sent::Text("Could not fetch the thumbnail, continuing with the download".to_string())
        );
        match &sent[2] {
            Sent::Text(summary) => {
                assert!(summary.contains("Title: Some video"));
                assert!(summary.contains("Subscribers: 2000"));
            }
            other => panic!("expected summary text, got {:?}", other),
        }
        match &sent[3] {
            Sent::Video(uri) => assert!(uri.starts_with("file:///")),
            other => panic!("expected video reference, got {:?}", other),
        }

        // Highest resolution stream was downloaded and the file is on
        // disk until the reclaimer runs.
        let downloads = provider.downloads();
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].exists());
        std::fs::remove_file(&downloads[0]).unwrap();
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let provider = Arc::new(FakeProvider::ok());
        let sink = Arc::new(RecordingSink::default());
        let orch = make_orchestrator(provider, sink.clone(), PolicyStore::default());

        orch.handle_request(&test_id(), "999").await;
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn denylisted_requester_is_silently_dropped() {
        let provider = Arc::new(FakeProvider::ok());
        let sink = Arc::new(RecordingSink::default());
        let policy = PolicyStore::default();
        policy.ban_user("12345").await.unwrap();
        let orch = make_orchestrator(provider.clone(), sink.clone(), policy.clone());

        orch.handle_request(&test_id(), "12345").await;
        assert!(sink.messages().is_empty());
        assert!(provider.downloads().is_empty());

        // Unbanning restores normal handling.
        policy.unban_user("12345").await.unwrap();
        orch.handle_request(&test_id(), "12345").await;
        assert!(!sink.messages().is_empty());
        for path in provider.downloads() {
            let _ = std::fs::remove_file(path);
        }
    }

    #[tokio::test]
    async fn resolution_failure_reports_once_with_proxy_hint() {
        let provider = Arc::new(FakeProvider::failing("fetch failed: connection reset"));
        let sink = Arc::new(RecordingSink::default());
        let policy = PolicyStore::default();
        policy.set_proxy("http://127.0.0.1:10809").await.unwrap();
        let orch = make_orchestrator(provider, sink.clone(), policy);

        orch.handle_request(&test_id(), "42").await;

        let sent = sink.messages();
        assert_eq!(sent.len(), 2);
        match &sent[1] {
            Sent::Text(msg) => {
                assert!(msg.starts_with("Processing failed:"));
                assert!(msg.contains("Current proxy: http://127.0.0.1:10809"));
            }
            other => panic!("expected error text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn non_connectivity_failure_gets_no_proxy_hint() {
        let provider = Arc::new(FakeProvider::failing("video is private"));
        let sink = Arc::new(RecordingSink::default());
        let orch = make_orchestrator(provider, sink.clone(), PolicyStore::default());

        orch.handle_request(&test_id(), "42").await;

        let sent = sink.messages();
        match &sent[1] {
            Sent::Text(msg) => assert!(!msg.contains("Current proxy")),
            other => panic!("expected error text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn junk_text_produces_no_traffic() {
        let provider = Arc::new(FakeProvider::ok());
        let sink = Arc::new(RecordingSink::default());
        let orch = make_orchestrator(provider.clone(), sink.clone(), PolicyStore::default());

        orch.handle_message("no links here", "42").await;
        assert!(sink.messages().is_empty());
        assert!(provider.downloads().is_empty());
    }

    #[tokio::test]
    async fn concurrent_requests_for_one_video_stay_independent() {
        let provider = Arc::new(FakeProvider::ok());
        let sink = Arc::new(RecordingSink::default());
        let orch = make_orchestrator(provider.clone(), sink.clone(), PolicyStore::default());

        let id = test_id();
        tokio::join!(
            orch.handle_request(&id, "42"),
            orch.handle_request(&id, "43"),
        );

        let downloads = provider.downloads();
        assert_eq!(downloads.len(), 2);
        assert_ne!(downloads[0], downloads[1]);
        for path in downloads {
            assert!(path.exists());
            std::fs::remove_file(path).unwrap();
        }
    }
}
