use crate::error::ApiError;
use crate::locale::Locales;
use actix_web::{web, HttpResponse};

pub(crate) async fn list(locales: web::Data<Locales>) -> HttpResponse {
    HttpResponse::Ok().json(locales.languages())
}

pub(crate) async fn process(
    lang: web::Path<String>,
    locales: web::Data<Locales>,
) -> Result<HttpResponse, ApiError> {
    let lang = lang.into_inner();
    locales
        .get(&lang)
        .map(|pack| HttpResponse::Ok().json(pack))
        .ok_or_else(|| ApiError::not_found(format!("no language pack for {}", lang)))
}
