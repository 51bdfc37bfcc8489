//! Process-wide registry and queue of karaoke jobs.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe handle holding the job registry, the
//!   pending queue and the channel used to report status changes. It is
//!   injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: a message sent by the worker whenever a job changes phase.
//! - `start_job_updater`: the single task allowed to write job statuses. It
//!   drains `JobUpdate`s and applies them in order, dropping any update that
//!   would move a job backwards or out of a terminal state.

use common::jobs::{keys, Job, JobData, JobStatus, JobView};
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use uuid::Uuid;

/// Length of the opaque job id handed to clients.
const JOB_ID_LEN: usize = 8;

/// A submission waiting for the worker.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueEntry {
    pub job_id: String,
    /// Source media URL, passed to yt-dlp untouched.
    pub url: String,
    /// `<scheme>://<host>` used to build the result links.
    pub base_url: String,
}

/// A thread-safe, shareable container for the state of all jobs.
#[derive(Clone)]
pub struct JobsState {
    /// Job id → current status and data. Entries are never removed.
    ///
    /// Handlers only read it; all writes after submission go through `tx`
    /// and `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, Job>>>,

    /// FIFO of submissions not yet picked up by the worker. Unbounded.
    pub queue: Arc<Mutex<VecDeque<QueueEntry>>>,

    /// Wakes the worker when something is pushed onto `queue`.
    pub wakeup: Arc<Notify>,

    /// Sender side of the status update channel.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A status change for one job. `data` replaces the job's data wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
    pub(crate) data: JobData,
}

impl JobUpdate {
    pub fn phase(job_id: &str, status: JobStatus) -> Self {
        Self {
            job_id: job_id.to_string(),
            status,
            data: JobData::new(),
        }
    }

    pub fn progress(job_id: &str, status: JobStatus, percent: &str) -> Self {
        let mut update = Self::phase(job_id, status);
        update
            .data
            .insert(keys::PROGRESS.to_string(), percent.to_string());
        update
    }

    pub fn complete(job_id: &str, data: JobData) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Complete,
            data,
        }
    }

    pub fn failed(job_id: &str, message: impl Into<String>) -> Self {
        let mut update = Self::phase(job_id, JobStatus::Error);
        update
            .data
            .insert(keys::MESSAGE.to_string(), message.into());
        update
    }
}

impl JobsState {
    /// Builds an empty state. The returned receiver must be handed to
    /// `start_job_updater`.
    pub fn new(update_capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(update_capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            wakeup: Arc::new(Notify::new()),
            tx,
        };
        (state, rx)
    }

    /// Registers a new `Waiting` job, queues it and wakes the worker.
    pub async fn submit(&self, url: String, base_url: String) -> String {
        // Queue before registry, the same order `get_status` locks in.
        let mut queue = self.queue.lock().await;
        let mut jobs = self.jobs.write().await;

        let mut job_id = new_job_id();
        while jobs.contains_key(&job_id) {
            job_id = new_job_id();
        }
        jobs.insert(job_id.clone(), Job::waiting());
        queue.push_back(QueueEntry {
            job_id: job_id.clone(),
            url,
            base_url,
        });
        drop(jobs);
        drop(queue);

        self.wakeup.notify_one();
        debug!("Job {} queued", job_id);
        job_id
    }

    /// Reports a job as seen by clients, or `None` for an unknown id.
    ///
    /// A queued job reports its 1-based queue position. A job that left the
    /// queue but is still recorded as `Waiting` has been picked up by the
    /// worker before it reported anything, so it is shown as `Processing`.
    pub async fn get_status(&self, job_id: &str) -> Option<JobView> {
        let queue = self.queue.lock().await;
        let position = queue
            .iter()
            .position(|entry| entry.job_id == job_id)
            .map(|index| index + 1);
        let jobs = self.jobs.read().await;
        let job = jobs.get(job_id)?;

        let view = match position {
            Some(_) => JobView {
                status: JobStatus::Waiting,
                position,
                data: job.data.clone(),
            },
            None if job.status == JobStatus::Waiting => JobView {
                status: JobStatus::Processing,
                position: None,
                data: job.data.clone(),
            },
            None => JobView {
                status: job.status,
                position: None,
                data: job.data.clone(),
            },
        };
        Some(view)
    }

    /// Number of jobs still waiting in the queue.
    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Pops the next queued entry, waiting until one is available.
    pub async fn next_entry(&self) -> QueueEntry {
        loop {
            let next = self.queue.lock().await.pop_front();
            if let Some(entry) = next {
                return entry;
            }
            self.wakeup.notified().await;
        }
    }
}

fn new_job_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// Applies one update to the registry. Returns `false` when it was dropped.
pub(crate) fn apply_update(jobs: &mut HashMap<String, Job>, update: JobUpdate) -> bool {
    let Some(job) = jobs.get_mut(&update.job_id) else {
        warn!("Dropping update for unknown job {}", update.job_id);
        return false;
    };
    if !job.status.can_advance_to(update.status) {
        warn!(
            "Dropping update for job {}: {} -> {} is not allowed",
            update.job_id,
            job.status.code(),
            update.status.code()
        );
        return false;
    }
    job.status = update.status;
    job.data = update.data;
    true
}

/// Starts the central job state updater task.
///
/// Spawn it once as a long-running task (as seen in `main.rs`). It exits
/// when every sender has been dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        apply_update(&mut jobs, update);
    }
}
