mod config;
mod db;
mod error;
mod handlers;
mod jobs;
mod models;
mod player;
mod routes;
mod services;
mod state;
mod storage;
mod utils;

use std::{net::SocketAddr, sync::Arc};

use tokio::{net::TcpListener, sync::watch};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::AppConfig,
    jobs::{monitor, ping},
    state::AppState,
    storage::ObjectStorage,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);

    let pool = db::init_db(&config.database_url).await?;
    tracing::info!("Conexión a Postgres exitosa");
    if config.run_migrations {
        db::run_migrations(&pool).await?;
        tracing::info!("Migraciones aplicadas");
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("cms-medios-backend/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let storage = ObjectStorage::from_config(&config.storage, http.clone());

    let state = AppState {
        pool: pool.clone(),
        storage,
        http: http.clone(),
        config: config.clone(),
    };

    // Tareas en segundo plano; se detienen con el mismo apagado que el servidor
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut jobs = Vec::new();

    jobs.push(tokio::spawn(monitor::run(
        Arc::new(monitor::PgMonitorStore::new(pool.clone())),
        monitor::StreamProber::new(http.clone(), &config.monitor),
        config.monitor.interval,
        shutdown_rx.clone(),
    )));

    if let Some(every) = config.ping.search_ping_every {
        match ping::search_ping_url(&config.ping.search_ping_url, &config.sitemap_url()) {
            Ok(url) => jobs.push(tokio::spawn(ping::run(
                "ping a buscadores",
                http.clone(),
                url,
                every,
                shutdown_rx.clone(),
            ))),
            Err(e) => tracing::error!("Ping a buscadores desactivado: {}", e),
        }
    }
    if let Some(every) = config.ping.sitemap_refresh_every {
        match reqwest::Url::parse(&config.sitemap_url()) {
            Ok(url) => jobs.push(tokio::spawn(ping::run(
                "refresco del sitemap",
                http.clone(),
                url,
                every,
                shutdown_rx.clone(),
            ))),
            Err(e) => tracing::error!("Refresco del sitemap desactivado: {}", e),
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Servidor CMS corriendo en http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("No se pudo escuchar Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Apagando servidor");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    for job in jobs {
        let _ = job.await;
    }
    Ok(())
}
