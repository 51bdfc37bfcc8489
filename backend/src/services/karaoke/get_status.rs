use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub(crate) async fn process(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    get_job_status(job_id, state).await
}

async fn get_job_status(job_id: web::Path<String>, state: web::Data<JobsState>) -> HttpResponse {
    match state.get_status(&job_id.into_inner()).await {
        Some(view) => HttpResponse::Ok().json(view),
        None => HttpResponse::NotFound().json(json!({
            "status": "not_found",
            "position": null,
            "data": {},
        })),
    }
}
