use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

use branch_attendance::attendance::{AttendanceService, clock::SystemClock};
use branch_attendance::config::Config;
use branch_attendance::db::init_db;
use branch_attendance::docs::ApiDoc;
use branch_attendance::routes;
use branch_attendance::store::{
    BranchRegistry,
    cache::CachedBranchRegistry,
    mysql::{MySqlAttendanceStore, MySqlBranchRegistry},
};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Branch attendance service"
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

    let branch_cache = Arc::new(CachedBranchRegistry::new(
        Arc::new(MySqlBranchRegistry::new(pool.clone())),
        config.branch_cache_ttl(),
    ));
    let branches: Arc<dyn BranchRegistry> = branch_cache.clone();

    let service = Data::new(AttendanceService::new(
        Arc::new(MySqlAttendanceStore::new(pool.clone())),
        branches,
        Arc::new(SystemClock),
        config.day_offset()?,
    ));
    let branch_cache = Data::from(branch_cache);

    info!(
        utc_offset_minutes = config.attendance_utc_offset_minutes,
        addr = %config.server_addr,
        "Attendance service configured"
    );

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(service.clone())
            .app_data(branch_cache.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
