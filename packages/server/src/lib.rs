#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for disaster watch.
//!
//! Republishes the latest GDACS alerts, `ReliefWeb` disasters, and local
//! weather from an in-memory snapshot store that a background refresher
//! keeps current. Request handlers never wait on upstream feeds, except
//! for weather at caller-supplied coordinates. Prometheus metrics are
//! served at `/metrics`.

pub mod combined;
pub mod config;
mod handlers;
pub mod metrics;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use disaster_watch_feed::config::{ConfigSource, WeatherConfig};
use disaster_watch_feed::{FeedFetcher, HttpFetcher, http};
use disaster_watch_refresh::{Refresher, ShutdownHandle};
use disaster_watch_store::SnapshotStore;

pub use config::ServerArgs;
pub use handlers::ValidationError;
pub use metrics::ServerMetrics;

/// Shared application state.
pub struct AppState {
    /// Latest snapshot per source.
    pub store: Arc<SnapshotStore>,
    /// Used only for on-demand weather lookups.
    pub fetcher: Arc<dyn FeedFetcher>,
    /// Request and fetch counters.
    pub metrics: Arc<ServerMetrics>,
}

/// Registers every route. `prefix` applies to the JSON API only.
pub fn configure(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.route("/metrics", web::get().to(handlers::metrics))
        .service(
            web::scope(prefix)
                .route("/health", web::get().to(handlers::health))
                .route("/gdacs", web::get().to(handlers::gdacs))
                .route("/reliefweb", web::get().to(handlers::reliefweb))
                .route("/disasters", web::get().to(handlers::disasters))
                .route("/weather", web::get().to(handlers::weather))
                .route("/status", web::get().to(handlers::status)),
        );
}

/// Starts the disaster watch API server.
///
/// Loads every source once, starts the background refresher, and then
/// serves HTTP until the server stops, at which point the refresher is
/// shut down too. This is a regular async function; the caller provides
/// the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client cannot be built,
/// or the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(args: ServerArgs) -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let client = http::build_client(args.request_timeout()).map_err(std::io::Error::other)?;
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFetcher::new(
        client,
        ConfigSource::File(args.gdacs_config.clone()),
        ConfigSource::File(args.reliefweb_config.clone()),
        WeatherConfig::from_env(),
    ));
    let store = Arc::new(SnapshotStore::new());
    let metrics = Arc::new(ServerMetrics::new());

    let mut refresher = Refresher::new(
        store.clone(),
        fetcher.clone(),
        metrics.clone(),
        args.refresh_settings(),
    );
    refresher.initial_load().await;

    let (shutdown, signal) = ShutdownHandle::new();
    let refresh_task = actix_web::rt::spawn(refresher.run(signal));

    let state = web::Data::new(AppState {
        store,
        fetcher,
        metrics: metrics.clone(),
    });

    let prefix = args.normalized_prefix();
    let bind_addr = args.bind_addr.clone();
    let port = args.port;

    log::info!("Starting server on {bind_addr}:{port} (API prefix {prefix:?})");

    let result = async {
        HttpServer::new(move || {
            let cors = Cors::permissive();
            let request_metrics = metrics.clone();
            let prefix = prefix.clone();

            App::new()
                .wrap(cors)
                .wrap(middleware::Logger::default())
                .wrap_fn(move |req, srv| metrics::track(request_metrics.clone(), req, srv))
                .app_data(state.clone())
                .configure(|cfg| configure(cfg, &prefix))
        })
        .bind((bind_addr, port))?
        .run()
        .await
    }
    .await;

    log::info!("Server stopped, shutting down refresh loop");
    shutdown.shutdown();
    if let Err(e) = refresh_task.await {
        log::error!("Refresh loop ended abnormally: {e}");
    }

    result
}
