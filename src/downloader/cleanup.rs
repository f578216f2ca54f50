// Deferred reclamation of delivered video files

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::policy::PolicyStore;

use super::errors::DownloadError;
use super::models::{DownloadJob, JobState};

/// Spawn an independent reclamation task for a delivered job. The
/// orchestrator's responsibility ends here; the handle is returned for
/// callers that want to observe the final job state, and can be dropped
/// freely.
pub fn schedule(job: DownloadJob, policy: PolicyStore) -> JoinHandle<DownloadJob> {
    tokio::spawn(reclaim(job, policy))
}

/// Wait out the configured timeout, then delete the ephemeral file.
///
/// The delay is read from the policy store on entry rather than captured
/// at job creation, so an administrative timeout change applies to jobs
/// whose wait has not started yet. Deletion failure leaks the file with a
/// warning and is never surfaced to the user.
pub async fn reclaim(mut job: DownloadJob, policy: PolicyStore) -> DownloadJob {
    tokio::time::sleep(policy.timeout().await).await;

    match tokio::fs::remove_file(&job.path).await {
        Ok(()) => {
            job.advance(JobState::Cleaned);
            info!(video_id = %job.video_id, "video file cleaned up");
        }
        Err(e) => {
            job.advance(JobState::CleanupFailed);
            let err = DownloadError::Cleanup(e.to_string());
            warn!(
                video_id = %job.video_id,
                path = %job.path.display(),
                %err,
                "video file cleanup failed",
            );
        }
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{StreamDescriptor, VideoId};
    use std::path::PathBuf;

    fn make_job(path: PathBuf) -> DownloadJob {
        let stream = StreamDescriptor {
            itag: "22".to_string(),
            ext: "mp4".to_string(),
            width: Some(1280),
            height: Some(720),
            filesize: None,
            bitrate: None,
        };
        let mut job = DownloadJob::new(VideoId::parse("dQw4w9WgXcQ").unwrap(), path, stream);
        job.advance(JobState::Downloading);
        job.advance(JobState::Delivered);
        job
    }

    #[tokio::test(start_paused = true)]
    async fn delivered_file_is_removed_after_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");
        std::fs::write(&path, b"data").unwrap();

        let policy = PolicyStore::default();
        let job = reclaim(make_job(path.clone()), policy).await;

        assert_eq!(job.state(), JobState::Cleaned);
        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_file_marks_cleanup_failed() {
        let job = make_job(PathBuf::from("/nonexistent/video.mp4"));
        let policy = PolicyStore::default();

        let job = reclaim(job, policy).await;
        assert_eq!(job.state(), JobState::CleanupFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_read_from_the_store_not_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");
        std::fs::write(&path, b"data").unwrap();

        let policy = PolicyStore::default();
        let job = make_job(path.clone());
        // Changed after job creation, before the wait starts.
        policy.set_timeout("5").await.unwrap();

        let started = tokio::time::Instant::now();
        let job = reclaim(job, policy).await;

        assert_eq!(job.state(), JobState::Cleaned);
        assert_eq!(started.elapsed(), std::time::Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn reclamations_run_independently() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        std::fs::write(&first, b"a").unwrap();
        std::fs::write(&second, b"b").unwrap();

        let policy = PolicyStore::default();
        let a = schedule(make_job(first.clone()), policy.clone());
        let b = schedule(make_job(second.clone()), policy);

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap().state(), JobState::Cleaned);
        assert_eq!(b.unwrap().state(), JobState::Cleaned);
        assert!(!first.exists());
        assert!(!second.exists());
    }
}
