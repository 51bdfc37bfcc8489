mod config;
mod error;
mod job_controller;
mod locale;
mod pipeline;
mod services;

use crate::config::Config;
use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use crate::locale::Locales;
use crate::pipeline::tools::ExternalTools;
use crate::pipeline::{Stages, Workspace};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use clap::Parser;
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{info, warn};
use mime_guess::from_path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

static STATIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/static/dist");

/// Capacity of the worker → updater status channel.
const UPDATE_CHANNEL_CAPACITY: usize = 100;

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    embedded_response(&STATIC_DIR, req.path())
}

/// A file of `dir`, or its `index.html` for any path it doesn't hold so
/// the frontend can route client-side.
fn embedded_response(dir: &Dir<'_>, path: &str) -> HttpResponse {
    let path = path.trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match dir.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match dir.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

/// JSON extractor settings; malformed bodies come back as `{ "detail": ... }`.
pub(crate) fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = Config::parse();
    config.ensure_dirs()?;

    let url = config.local_url();
    if config.open_browser {
        let url_clone = url.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            let _ = webbrowser::open(&url_clone);
        });
    }

    let tools = ExternalTools::from_config(&config);
    for (tool, found) in tools.availability() {
        if !found {
            warn!("{} not found, jobs will fail until it is installed", tool);
        }
    }
    info!("Separation model: {}", config.model);

    let locales = Locales::load(&config.locales_dir, &config.default_locale);
    let workspace = Workspace::new(config.storage_dir.clone(), config.tmp_dir.clone());

    // Job registry, queue and the single status writer.
    let (jobs_state, rx) = JobsState::new(UPDATE_CHANNEL_CAPACITY);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    // Exactly one worker drains the queue.
    let worker_state = jobs_state.clone();
    let stages: Arc<dyn Stages> = Arc::new(tools.clone());
    let worker_workspace = workspace.clone();
    tokio::spawn(async move {
        job_controller::worker::start_worker(worker_state, stages, worker_workspace).await;
    });

    info!("Server running at {}", url);

    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);
    let locales = web::Data::new(locales);
    let tools = web::Data::new(tools);
    let jobs_state = web::Data::new(jobs_state);

    HttpServer::new(move || {
        App::new()
            .app_data(json_config())
            .app_data(jobs_state.clone())
            .app_data(config.clone())
            .app_data(locales.clone())
            .app_data(tools.clone())
            .configure(|cfg| services::karaoke::configure_routes(cfg, &workspace.storage_dir))
            .service(services::locales::configure_routes())
            .service(services::health::configure_routes())
            .default_service(web::route().to(serve_embedded))
    })
        .bind(bind)?
        .run()
        .await
}
