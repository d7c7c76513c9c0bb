use actix_web::error::InternalError;
use actix_web::web::{JsonConfig, PathConfig};
use actix_web::HttpResponse;
use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/books")
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::get_all_books))
                        .route(web::post().to(handlers::create_book)),
                )
                .service(
                    web::resource("/{book_id}")
                        .route(web::get().to(handlers::get_book))
                        .route(web::put().to(handlers::update_book))
                        .route(web::delete().to(handlers::delete_book)),
                ),
        )
        .service(
            web::scope("/auth")
                .service(web::resource("/sign-up").route(web::post().to(handlers::sign_up)))
                .service(
                    web::resource("/sign-in")
                        .route(web::get().to(handlers::sign_in))
                        .route(web::post().to(handlers::sign_in)),
                ),
        );
}

/// Malformed JSON bodies are answered with an empty 400
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, req| {
        tracing::warn!("Malformed JSON body for {}: {}", req.path(), err);
        InternalError::from_response(err, HttpResponse::BadRequest().finish()).into()
    })
}

/// Path ids that are not numbers are answered with an empty 400
pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err, req| {
        tracing::warn!("Bad path parameter for {}: {}", req.path(), err);
        InternalError::from_response(err, HttpResponse::BadRequest().finish()).into()
    })
}
