//! The single consumer of the job queue.
//!
//! `start_worker` pops one queue entry at a time and runs the whole pipeline
//! for it on a blocking thread before looking at the queue again, so jobs
//! never overlap. Whatever happens inside the pipeline, the job ends up
//! either `Complete` or `Error` and the loop moves on to the next entry.

use crate::job_controller::state::{JobUpdate, JobsState, QueueEntry};
use crate::pipeline::{self, Stages, Workspace};
use log::{error, info};
use std::sync::Arc;

/// Runs forever, draining `state`'s queue.
pub async fn start_worker(state: JobsState, stages: Arc<dyn Stages>, workspace: Workspace) {
    loop {
        let entry = state.next_entry().await;
        run_job(&state, stages.clone(), workspace.clone(), entry).await;
    }
}

async fn run_job(state: &JobsState, stages: Arc<dyn Stages>, workspace: Workspace, entry: QueueEntry) {
    let job_id = entry.job_id.clone();
    info!("Job {}: started for {}", job_id, entry.url);

    let tx = state.tx.clone();
    let handle = tokio::task::spawn_blocking(move || {
        pipeline::run_blocking(stages.as_ref(), &workspace, &entry, &mut |update: JobUpdate| {
            let _ = tx.blocking_send(update);
        })
    });

    let final_update = match handle.await {
        Ok(Ok(data)) => {
            info!("Job {}: complete", job_id);
            JobUpdate::complete(&job_id, data)
        }
        Ok(Err(e)) => {
            error!("Job {}: failed: {}", job_id, e);
            JobUpdate::failed(&job_id, e.to_string())
        }
        Err(e) => {
            // The pipeline panicked.
            error!("Job {}: worker task died: {}", job_id, e);
            JobUpdate::failed(&job_id, format!("Task join error: {}", e))
        }
    };
    let _ = state.tx.send(final_update).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineResult;
    use crate::job_controller::state::start_job_updater;
    use crate::pipeline::tests::{assert_no_files_left, FakeStages, PanickingStages};
    use crate::pipeline::MergeInputs;
    use common::jobs::{keys, JobStatus, JobView};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Harness {
        state: JobsState,
        workspace: Workspace,
        _root: tempfile::TempDir,
    }

    fn start(stages: Arc<dyn Stages>) -> Harness {
        let root = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(root.path().join("songs"), root.path().join("tmp"));
        std::fs::create_dir_all(&workspace.storage_dir).unwrap();
        std::fs::create_dir_all(&workspace.tmp_dir).unwrap();

        let (state, rx) = JobsState::new(64);
        tokio::spawn(start_job_updater(state.clone(), rx));
        tokio::spawn(start_worker(state.clone(), stages, workspace.clone()));
        Harness {
            state,
            workspace,
            _root: root,
        }
    }

    async fn submit(state: &JobsState) -> String {
        state
            .submit(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                "http://localhost:5000".to_string(),
            )
            .await
    }

    async fn wait_for(state: &JobsState, job_id: &str, done: impl Fn(&JobView) -> bool) -> JobView {
        for _ in 0..500 {
            let view = state.get_status(job_id).await.unwrap();
            if done(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached the expected state", job_id);
    }

    #[actix_web::test]
    async fn submitted_job_reaches_complete() {
        let harness = start(Arc::new(FakeStages::default()));
        let job_id = submit(&harness.state).await;

        let view = wait_for(&harness.state, &job_id, |v| v.status.is_terminal()).await;
        assert_eq!(view.status, JobStatus::Complete);
        assert_eq!(view.position, None);
        assert_eq!(
            view.data[keys::VIDEO],
            format!("http://localhost:5000/songs/{}_karaoke.mp4", job_id)
        );
        assert!(view.data.contains_key(keys::INSTRUMENTAL));
        assert!(view.data.contains_key(keys::VOCALS));
    }

    #[actix_web::test]
    async fn failing_stage_marks_job_as_error() {
        let stages = Arc::new(FakeStages::failing_at(JobStatus::DownloadingVideo));
        let harness = start(stages.clone());
        let job_id = submit(&harness.state).await;

        let view = wait_for(&harness.state, &job_id, |v| v.status.is_terminal()).await;
        assert_eq!(view.status, JobStatus::Error);
        assert!(view.data[keys::MESSAGE].contains("simulated failure"));

        // Nothing after the failing stage ran, and the job stays put.
        assert!(!stages.calls.lock().unwrap().contains(&JobStatus::AiSeparation));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let later = harness.state.get_status(&job_id).await.unwrap();
        assert_eq!(later, view);
    }

    #[actix_web::test]
    async fn queue_moves_on_after_a_failure() {
        let harness = start(Arc::new(FakeStages::failing_at(JobStatus::Merging)));
        let first = submit(&harness.state).await;
        let second = submit(&harness.state).await;

        let second_view = wait_for(&harness.state, &second, |v| v.status.is_terminal()).await;
        let first_view = harness.state.get_status(&first).await.unwrap();
        assert_eq!(first_view.status, JobStatus::Error);
        assert_eq!(second_view.status, JobStatus::Error);
    }

    #[actix_web::test]
    async fn panicking_pipeline_is_reported_as_error() {
        let harness = start(Arc::new(PanickingStages::default()));
        let first = submit(&harness.state).await;
        let second = submit(&harness.state).await;

        let view = wait_for(&harness.state, &first, |v| v.status.is_terminal()).await;
        assert_eq!(view.status, JobStatus::Error);
        let message = &view.data[keys::MESSAGE];
        assert!(message.starts_with("Task join error"), "{}", message);
        assert!(message.contains("ffmpeg wrapper blew up"), "{}", message);
        assert_no_files_left(&harness.workspace, &first);

        // The worker survives and takes the next job.
        let second_view = wait_for(&harness.state, &second, |v| v.status.is_terminal()).await;
        assert_eq!(second_view.status, JobStatus::Error);
        assert_no_files_left(&harness.workspace, &second);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.state.get_status(&first).await.unwrap(), view);
    }

    /// Blocks every job in `fetch_video_id` until the test lets it through.
    struct GatedStages {
        inner: FakeStages,
        gate: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl Stages for GatedStages {
        fn fetch_video_id(&self, url: &str) -> PipelineResult<String> {
            let _ = self.gate.lock().unwrap().recv();
            self.inner.fetch_video_id(url)
        }

        fn download_audio(
            &self,
            url: &str,
            output: &Path,
            progress: &mut dyn FnMut(String),
        ) -> PipelineResult<()> {
            self.inner.download_audio(url, output, progress)
        }

        fn download_video(
            &self,
            url: &str,
            output: &Path,
            progress: &mut dyn FnMut(String),
        ) -> PipelineResult<()> {
            self.inner.download_video(url, output, progress)
        }

        fn separate(&self, input: &Path, output_dir: &Path) -> PipelineResult<Vec<PathBuf>> {
            self.inner.separate(input, output_dir)
        }

        fn merge(&self, inputs: &MergeInputs) -> PipelineResult<()> {
            self.inner.merge(inputs)
        }
    }

    #[actix_web::test]
    async fn positions_decrease_as_jobs_ahead_finish() {
        let (release, gate) = std::sync::mpsc::channel();
        let harness = start(Arc::new(GatedStages {
            inner: FakeStages::default(),
            gate: Mutex::new(gate),
        }));
        let state = &harness.state;

        let first = submit(state).await;
        let second = submit(state).await;
        let third = submit(state).await;

        // The worker holds the first job inside the gate.
        wait_for(state, &first, |v| v.position.is_none()).await;
        assert_eq!(state.get_status(&second).await.unwrap().position, Some(1));
        assert_eq!(state.get_status(&third).await.unwrap().position, Some(2));

        release.send(()).unwrap();
        wait_for(state, &first, |v| v.status == JobStatus::Complete).await;
        wait_for(state, &second, |v| v.position.is_none()).await;
        assert_eq!(state.get_status(&third).await.unwrap().position, Some(1));

        release.send(()).unwrap();
        release.send(()).unwrap();
        wait_for(state, &third, |v| v.status == JobStatus::Complete).await;
        assert_eq!(state.queue_len().await, 0);
    }
}
