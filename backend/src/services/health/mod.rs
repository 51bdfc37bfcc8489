//! `GET /api/health`: liveness plus a check that the external tools the
//! pipeline shells out to are installed.

use crate::pipeline::tools::ExternalTools;
use actix_web::web::{get, scope};
use actix_web::{web, HttpResponse, Scope};
use serde::Serialize;
use std::collections::BTreeMap;

const API_PATH: &str = "/api/health";

#[derive(Serialize)]
struct HealthResponse {
    /// `ok` when every tool was found, `degraded` otherwise.
    status: &'static str,
    version: &'static str,
    tools: BTreeMap<String, bool>,
}

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process(tools: web::Data<ExternalTools>) -> HttpResponse {
    let tools = tools.availability();
    let status = if tools.values().all(|found| *found) {
        "ok"
    } else {
        "degraded"
    };
    HttpResponse::Ok().json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        tools,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn reports_missing_tools_as_degraded() {
        let tools = ExternalTools::new("no-such-yt-dlp-91c2", "no-such-ffmpeg-91c2", "no-such-sep-91c2", "m.onnx");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(tools))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["tools"]["no-such-ffmpeg-91c2"], false);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
