use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form key/value payload attached to a job.
///
/// While a download is running it carries `progress`; once the job is
/// `Complete` it carries the output URLs, and on `Error` the `message`.
pub type JobData = BTreeMap<String, String>;

/// Phase of a karaoke job, serialized as a plain snake_case string.
///
/// Variants are declared in pipeline order. A job only moves forward through
/// this order, except that `Error` can be reached from any non-terminal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Sitting in the queue.
    Waiting,
    /// Dequeued by the worker but no phase reported yet. Never stored, only
    /// inferred by the status endpoint.
    Processing,
    FetchingInfo,
    DownloadingAudio,
    DownloadingVideo,
    AiSeparation,
    Merging,
    Complete,
    Error,
}

impl JobStatus {
    /// `true` for `Complete` and `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Waiting => 0,
            JobStatus::Processing => 1,
            JobStatus::FetchingInfo => 2,
            JobStatus::DownloadingAudio => 3,
            JobStatus::DownloadingVideo => 4,
            JobStatus::AiSeparation => 5,
            JobStatus::Merging => 6,
            JobStatus::Complete => 7,
            JobStatus::Error => 8,
        }
    }

    /// Whether a job currently in `self` may be moved to `next`.
    ///
    /// Terminal phases accept nothing. Otherwise the phase may stay the same
    /// (a progress refresh), move forward, or jump to `Error`.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == JobStatus::Error || next.rank() >= self.rank()
    }

    /// Stable string code, identical to the serialized form.
    pub fn code(self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Processing => "processing",
            JobStatus::FetchingInfo => "fetching_info",
            JobStatus::DownloadingAudio => "downloading_audio",
            JobStatus::DownloadingVideo => "downloading_video",
            JobStatus::AiSeparation => "ai_separation",
            JobStatus::Merging => "merging",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }
}

/// A job as stored in the backend registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub status: JobStatus,
    #[serde(default)]
    pub data: JobData,
}

impl Job {
    pub fn waiting() -> Self {
        Self {
            status: JobStatus::Waiting,
            data: JobData::new(),
        }
    }
}

/// Response body of `GET /status/{job_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub status: JobStatus,
    /// 1-based position in the queue, only set while `Waiting`.
    pub position: Option<usize>,
    #[serde(default)]
    pub data: JobData,
}

/// Keys used inside [`JobData`].
pub mod keys {
    pub const PROGRESS: &str = "progress";
    pub const MESSAGE: &str = "message";
    pub const VIDEO: &str = "video";
    pub const INSTRUMENTAL: &str = "instrumental";
    pub const VOCALS: &str = "vocals";
    pub const VIDEO_ID: &str = "video_id";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_plain_code() {
        for status in [
            JobStatus::Waiting,
            JobStatus::DownloadingAudio,
            JobStatus::AiSeparation,
            JobStatus::Complete,
            JobStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.code()));
        }
    }

    #[test]
    fn phases_only_move_forward() {
        assert!(JobStatus::Waiting.can_advance_to(JobStatus::FetchingInfo));
        assert!(JobStatus::DownloadingAudio.can_advance_to(JobStatus::DownloadingAudio));
        assert!(JobStatus::Merging.can_advance_to(JobStatus::Complete));
        assert!(!JobStatus::Merging.can_advance_to(JobStatus::DownloadingVideo));
        assert!(!JobStatus::AiSeparation.can_advance_to(JobStatus::Waiting));
    }

    #[test]
    fn error_is_reachable_and_absorbing() {
        assert!(JobStatus::Waiting.can_advance_to(JobStatus::Error));
        assert!(JobStatus::Merging.can_advance_to(JobStatus::Error));
        assert!(!JobStatus::Error.can_advance_to(JobStatus::Complete));
        assert!(!JobStatus::Error.can_advance_to(JobStatus::Error));
        assert!(!JobStatus::Complete.can_advance_to(JobStatus::Error));
    }

    #[test]
    fn view_keeps_null_position() {
        let view = JobView {
            status: JobStatus::Merging,
            position: None,
            data: JobData::new(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["position"].is_null());
        assert_eq!(json["status"], "merging");
    }
}
