use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod errors;
mod model;
mod models;
mod repository;
mod routes;
mod services;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::repository::MySqlAcademyRepository;
use crate::utils::email_cache::{COACH_EMAIL_CACHE, refresh_coach_email_index};
use crate::utils::email_filter::COACH_EMAIL_FILTER;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Academy API"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "academy.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        currency = %config.payroll.currency,
        excluded_roles = ?config.payroll.excluded_roles,
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await;

    let pool_for_email_index = pool.clone();
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let repository = MySqlAcademyRepository::new(pool.clone());
    let refresh_every = Duration::from_secs(config.email_index_refresh_secs.max(1));

    // Coach email index: first tick fires immediately, then every `refresh_every`
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(refresh_every);
        loop {
            ticker.tick().await;
            if let Err(e) = refresh_coach_email_index(
                &pool_for_email_index,
                &COACH_EMAIL_FILTER,
                &COACH_EMAIL_CACHE,
                250,
            )
            .await
            {
                warn!(error = %e, "Failed to refresh coach email index");
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets resolve
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(repository.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
