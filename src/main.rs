use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod approval;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod models;
mod pdf;
mod routes;
mod store;
#[cfg(test)]
mod test_support;

use approval::service::LeaveService;
use config::Config;
use db::init_db;
use pdf::pass::LopdfPassRenderer;
use store::mysql::{MySqlLeaveStore, MySqlStudentDirectory};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave pass service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let service = Data::new(LeaveService::new(
        Arc::new(MySqlLeaveStore::new(pool.clone())),
        Arc::new(MySqlStudentDirectory::new(pool)),
        Arc::new(LopdfPassRenderer::new(
            &config.uploads_dir,
            &config.uploads_url_prefix,
        )),
        config.approval_policy(),
    ));
    let limiter = Arc::new(routes::build_limiter(config.rate_protected_per_min)?);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let api_prefix = config_data.api_prefix.clone();
        let limiter = limiter.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(service.clone())
            .service(index)
            // protected leave routes with auth + rate limiting
            .configure(move |cfg| routes::configure(cfg, &api_prefix, limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
