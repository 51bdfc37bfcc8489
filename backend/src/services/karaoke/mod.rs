//! The karaoke job API.
//!
//! The provided routes are:
//! - `POST /process`: takes `{ "url": ... }`, registers a job, queues it for
//!   the worker and immediately answers `{ "job_id": ... }`.
//! - `GET /status/{job_id}`: current `{ status, position, data }` of a job.
//!   `position` is the 1-based place in the queue while the job is waiting.
//! - `GET /songs/{file}`: finished karaoke videos and stems, straight from
//!   the storage directory.

use actix_web::web;
use std::path::Path;

mod get_status;
mod process;

/// Registers the karaoke routes on the application.
pub fn configure_routes(cfg: &mut web::ServiceConfig, storage_dir: &Path) {
    cfg.route("/process", web::post().to(process::process))
        .route("/status/{job_id}", web::get().to(get_status::process))
        .service(actix_files::Files::new("/songs", storage_dir));
}
