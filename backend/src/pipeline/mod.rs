//! # Karaoke pipeline
//!
//! One job runs these stages in order, reporting each phase before it starts:
//!
//! 1.  **Metadata** (`FetchingInfo`): resolve the video id of the URL.
//! 2.  **Audio** (`DownloadingAudio`): download the soundtrack as WAV into the
//!     temp dir, reporting scraped progress.
//! 3.  **Video** (`DownloadingVideo`): download the best video-only stream.
//! 4.  **Separation** (`AiSeparation`): split the WAV into stems and publish
//!     every stem into the storage dir as `<job_id>_<stem file>`.
//! 5.  **Remux** (`Merging`): instrumental on the left channel, original mix
//!     on the right, original video copied as-is.
//!
//! The first failing stage aborts the rest. Temp files are removed whatever
//! the outcome, panics included. A job that does not complete also takes
//! back whatever it already published. The stages themselves are behind the [`Stages`] trait so the
//! worker can be driven without the external tools.

pub mod progress;
pub mod tools;

use crate::error::{PipelineError, PipelineResult};
use crate::job_controller::state::{JobUpdate, QueueEntry};
use common::jobs::{keys, JobData, JobStatus};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Everything the merge stage needs to build the karaoke video.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeInputs {
    pub instrumental: PathBuf,
    pub original_audio: PathBuf,
    pub video: PathBuf,
    pub output: PathBuf,
}

/// The external collaborators of the pipeline. Every call blocks until the
/// underlying tool is done.
pub trait Stages: Send + Sync {
    /// Resolves the platform id of the video behind `url`.
    fn fetch_video_id(&self, url: &str) -> PipelineResult<String>;

    /// Downloads the soundtrack of `url` as WAV to `output`.
    fn download_audio(
        &self,
        url: &str,
        output: &Path,
        progress: &mut dyn FnMut(String),
    ) -> PipelineResult<()>;

    /// Downloads the video-only stream of `url` to `output`.
    fn download_video(
        &self,
        url: &str,
        output: &Path,
        progress: &mut dyn FnMut(String),
    ) -> PipelineResult<()>;

    /// Splits `input` into stems written under `output_dir` and returns their
    /// paths.
    fn separate(&self, input: &Path, output_dir: &Path) -> PipelineResult<Vec<PathBuf>>;

    /// Remuxes the separated audio with the original video.
    fn merge(&self, inputs: &MergeInputs) -> PipelineResult<()>;
}

/// Directory layout shared by the pipeline and the `/songs` route.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Published files, served under `/songs`.
    pub storage_dir: PathBuf,
    /// Intermediate downloads and separator output.
    pub tmp_dir: PathBuf,
}

impl Workspace {
    pub fn new(storage_dir: impl Into<PathBuf>, tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            tmp_dir: tmp_dir.into(),
        }
    }

    pub fn input_wav(&self, job_id: &str) -> PathBuf {
        self.tmp_dir.join(format!("{}_in.wav", job_id))
    }

    pub fn video_only(&self, job_id: &str) -> PathBuf {
        self.tmp_dir.join(format!("{}_v.mp4", job_id))
    }

    pub fn stems_dir(&self, job_id: &str) -> PathBuf {
        self.tmp_dir.join(format!("{}_stems", job_id))
    }

    pub fn karaoke_file_name(job_id: &str) -> String {
        format!("{}_karaoke.mp4", job_id)
    }
}

/// Published stem file names, relative to the storage dir.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedStems {
    pub instrumental: String,
    pub vocals: String,
}

/// Runs the whole pipeline for `entry` and returns the data of the
/// `Complete` status. Intermediate phases go through `report`.
pub fn run_blocking(
    stages: &dyn Stages,
    workspace: &Workspace,
    entry: &QueueEntry,
    report: &mut dyn FnMut(JobUpdate),
) -> PipelineResult<JobData> {
    let mut files = JobFiles {
        workspace,
        job_id: &entry.job_id,
        published: Vec::new(),
        completed: false,
    };
    let data = run_stages(stages, workspace, entry, &mut files, report)?;
    files.completed = true;
    Ok(data)
}

/// Files one job leaves on disk. Dropping it removes the temp files, and the
/// published ones too unless the job completed. Drop also runs while a
/// panicking stage unwinds.
struct JobFiles<'a> {
    workspace: &'a Workspace,
    job_id: &'a str,
    published: Vec<PathBuf>,
    completed: bool,
}

impl Drop for JobFiles<'_> {
    fn drop(&mut self) {
        cleanup(self.workspace, self.job_id);
        if !self.completed {
            for file in &self.published {
                remove_file_quietly(self.job_id, file);
            }
        }
    }
}

fn run_stages(
    stages: &dyn Stages,
    workspace: &Workspace,
    entry: &QueueEntry,
    files: &mut JobFiles<'_>,
    report: &mut dyn FnMut(JobUpdate),
) -> PipelineResult<JobData> {
    let job_id = entry.job_id.as_str();

    report(JobUpdate::phase(job_id, JobStatus::FetchingInfo));
    let video_id = stages.fetch_video_id(&entry.url)?;
    info!("Job {}: resolved video id {}", job_id, video_id);

    let input_wav = workspace.input_wav(job_id);
    let video_only = workspace.video_only(job_id);

    report(JobUpdate::phase(job_id, JobStatus::DownloadingAudio));
    stages.download_audio(&entry.url, &input_wav, &mut |percent: String| {
        report(JobUpdate::progress(job_id, JobStatus::DownloadingAudio, &percent))
    })?;

    report(JobUpdate::phase(job_id, JobStatus::DownloadingVideo));
    stages.download_video(&entry.url, &video_only, &mut |percent: String| {
        report(JobUpdate::progress(job_id, JobStatus::DownloadingVideo, &percent))
    })?;

    report(JobUpdate::phase(job_id, JobStatus::AiSeparation));
    let stems_dir = workspace.stems_dir(job_id);
    fs::create_dir_all(&stems_dir)?;
    let stem_files = stages.separate(&input_wav, &stems_dir)?;
    files.published.extend(
        stem_files
            .iter()
            .filter_map(|stem| stem.file_name().and_then(|name| name.to_str()))
            .map(|name| workspace.storage_dir.join(published_name(job_id, name))),
    );
    let stems = publish_stems(job_id, &stem_files, &workspace.storage_dir)?;

    report(JobUpdate::phase(job_id, JobStatus::Merging));
    let karaoke_file = Workspace::karaoke_file_name(job_id);
    let karaoke_path = workspace.storage_dir.join(&karaoke_file);
    files.published.push(karaoke_path.clone());
    stages.merge(&MergeInputs {
        instrumental: workspace.storage_dir.join(&stems.instrumental),
        original_audio: input_wav,
        video: video_only,
        output: karaoke_path,
    })?;

    let mut data = JobData::new();
    data.insert(keys::VIDEO.to_string(), song_url(&entry.base_url, &karaoke_file));
    data.insert(
        keys::INSTRUMENTAL.to_string(),
        song_url(&entry.base_url, &stems.instrumental),
    );
    data.insert(keys::VOCALS.to_string(), song_url(&entry.base_url, &stems.vocals));
    data.insert(keys::VIDEO_ID.to_string(), video_id);
    Ok(data)
}

/// Moves every stem into `storage_dir` under a job-prefixed name and picks
/// out the instrumental and vocal ones by file name.
pub fn publish_stems(
    job_id: &str,
    stem_files: &[PathBuf],
    storage_dir: &Path,
) -> PipelineResult<PublishedStems> {
    let mut instrumental = None;
    let mut vocals = None;

    for stem in stem_files {
        let Some(file_name) = stem.file_name().and_then(|name| name.to_str()) else {
            return Err(PipelineError::InvalidOutput {
                tool: "separator".to_string(),
                message: format!("unusable stem path {}", stem.display()),
            });
        };
        let published = published_name(job_id, file_name);
        move_file(stem, &storage_dir.join(&published))?;

        let lower = file_name.to_lowercase();
        if lower.contains("instrumental") {
            instrumental = Some(published);
        } else if lower.contains("vocals") {
            vocals = Some(published);
        }
    }

    Ok(PublishedStems {
        instrumental: instrumental.ok_or(PipelineError::MissingStem("instrumental"))?,
        vocals: vocals.ok_or(PipelineError::MissingStem("vocals"))?,
    })
}

/// `<job_id>_<file_name>`, with whitespace turned into `_` so the name
/// survives in a URL unescaped.
fn published_name(job_id: &str, file_name: &str) -> String {
    format!("{}_{}", job_id, file_name)
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Public link of a file in the storage dir.
pub fn song_url(base_url: &str, file_name: &str) -> String {
    format!("{}/songs/{}", base_url.trim_end_matches('/'), file_name)
}

/// `rename`, falling back to copy + delete when the directories live on
/// different filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

fn cleanup(workspace: &Workspace, job_id: &str) {
    for file in [workspace.input_wav(job_id), workspace.video_only(job_id)] {
        remove_file_quietly(job_id, &file);
    }
    let stems_dir = workspace.stems_dir(job_id);
    if let Err(e) = fs::remove_dir_all(&stems_dir) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Job {}: could not remove {}: {}", job_id, stems_dir.display(), e);
        }
    }
}

fn remove_file_quietly(job_id: &str, file: &Path) {
    if let Err(e) = fs::remove_file(file) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Job {}: could not remove {}: {}", job_id, file.display(), e);
        }
    }
}
