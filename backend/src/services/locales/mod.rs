//! Language packs for the frontend.
//!
//! - `GET /api/locales`: codes of every loaded pack.
//! - `GET /api/locales/{lang}`: one pack; unknown codes get the default pack.

mod get;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/locales";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("/{lang}", get().to(get::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locales;
    use actix_web::{test, web, App};
    use common::model::locale::LanguagePack;
    use std::path::Path;

    #[actix_web::test]
    async fn serves_packs_with_fallback() {
        let locales = Locales::load(Path::new("/nonexistent/locales"), "en");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(locales))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/locales").to_request();
        let langs: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(langs, vec!["en", "es"]);

        let req = test::TestRequest::get().uri("/api/locales/es-AR").to_request();
        let pack: LanguagePack = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pack.lang, "es");

        let req = test::TestRequest::get().uri("/api/locales/pt").to_request();
        let pack: LanguagePack = test::call_and_read_body_json(&app, req).await;
        assert_eq!(pack.lang, "en");
        assert_eq!(pack.text("status.complete"), "Complete");
    }
}
