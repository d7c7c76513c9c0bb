use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use paperclip::actix::OpenApiExt;
use tracing_actix_web::TracingLogger;

use book_api::app_config::{config_app, json_config, path_config};
use book_api::book_service::BookService;
use book_api::books_repository::{BookRepository, InMemoryBookRepository, PostgresBooksRepository};
use book_api::database;
use book_api::password_hasher::Sha256PasswordHasher;
use book_api::settings::Settings;
use book_api::telemetry::init_telemetry;
use book_api::token_manager::TokenManager;
use book_api::user_service::UserService;
use book_api::users_repository::{
    InMemoryUsersRepository, PostgresUsersRepository, UserRepository,
};

const APP_NAME: &str = "book_api";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_telemetry(APP_NAME, &settings.telemetry)?;

    if settings.auth.uses_development_secrets() {
        tracing::warn!("Signing secret or password salt left at development defaults");
    }

    let books_repository: Arc<dyn BookRepository>;
    let users_repository: Arc<dyn UserRepository>;
    if settings.use_in_memory_store {
        tracing::info!("Using in-memory store");
        books_repository = Arc::new(InMemoryBookRepository::default());
        users_repository = Arc::new(InMemoryUsersRepository::default());
    } else {
        let client = database::connect(&settings.database.postgres_config()).await?;
        books_repository = Arc::new(
            PostgresBooksRepository::init(client.clone())
                .await
                .context("Failed to init books repository")?,
        );
        users_repository = Arc::new(
            PostgresUsersRepository::init(client)
                .await
                .context("Failed to init users repository")?,
        );
    }

    let book_service = Data::new(BookService::new(books_repository));
    let user_service = Data::new(UserService::new(
        users_repository,
        Arc::new(Sha256PasswordHasher::new(&settings.auth.password_salt)?),
        TokenManager::new(
            settings.auth.signing_secret.as_bytes(),
            settings.auth.token_ttl()?,
        )
        .context("Invalid auth settings")?,
    ));

    let bind_address = (settings.server.host.clone(), settings.server.port);
    tracing::info!(
        "Starting HTTP server at http://{}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(json_config())
            .app_data(path_config())
            .app_data(book_service.clone())
            .app_data(user_service.clone())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
