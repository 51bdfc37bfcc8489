//! `POST /process`: registers a karaoke job and hands back its id for polling.

use crate::config::Config;
use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpRequest, HttpResponse};
use common::requests::{ProcessRequest, ProcessResponse};
use log::info;

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<JobsState>,
    config: web::Data<Config>,
    payload: web::Json<ProcessRequest>,
) -> Result<HttpResponse, ApiError> {
    let url = validate_url(&payload.url)?;
    let base_url = base_url(&req, config.public_url.as_deref());

    let job_id = state.submit(url, base_url).await;
    info!("Job {} submitted ({} waiting)", job_id, state.queue_len().await);
    Ok(HttpResponse::Ok().json(ProcessResponse { job_id }))
}

/// Trims the URL and makes sure it is something yt-dlp can fetch over HTTP.
fn validate_url(url: &str) -> Result<String, ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("url is required"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::bad_request("url must start with http:// or https://"));
    }
    Ok(url.to_string())
}

/// `<scheme>://<host>` the client used, unless a public URL is configured.
fn base_url(req: &HttpRequest, public_url: Option<&str>) -> String {
    match public_url {
        Some(public_url) => public_url.trim_end_matches('/').to_string(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}
