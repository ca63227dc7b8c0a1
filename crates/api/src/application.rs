use std::sync::Arc;

use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    middleware::Logger,
    web, App, HttpRequest, HttpServer,
};
use buffer_calc_domain::config::{ApiConfig, ConfigError, PhreeqcConfig};
use buffer_calc_domain::services::{
    cache::SimulationCache,
    telemetry::{init_telemetry, TelemetryConfig, TelemetryError},
};
use buffer_calc_phreeqc::PhreeqcCliBuilder;
use thiserror::Error;
use tracing::info;

use crate::{
    handlers::{
        calculate_handler, debug_handler, health_handler, index_handler, metrics_handler,
        recipe_handler, show_input_handler, show_output_handler, ApiError, Endpoint,
    },
    state::AppState,
};

pub async fn run() -> Result<(), BootstrapError> {
    let config = ApiConfig::load_from_env()?;
    let phreeqc = PhreeqcConfig::load_from_env()?;

    let telemetry_config = TelemetryConfig::from_env("API");
    let telemetry = init_telemetry(&telemetry_config)?;
    info!(
        port = config.port(),
        workers = config.workers(),
        timeout_secs = config.request_timeout().as_secs(),
        "starting buffer calculator on {}",
        config.bind_address()
    );

    let engine = PhreeqcCliBuilder::from_config(&phreeqc)
        .timeout(config.request_timeout())
        .build();
    let cache = SimulationCache::new(config.simulation_cache_ttl());
    let state = AppState::new(
        Arc::new(engine),
        cache,
        telemetry,
        config.workers(),
        config.request_timeout(),
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(routes)
    })
    .workers(config.workers())
    .bind(config.bind_address())?
    .run()
    .await?;

    Ok(())
}

/// Registers every route plus the extractor error handlers, so malformed
/// payloads come back in the same `{"error": ...}` shape as handler errors.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route(Endpoint::Index.path(), web::get().to(index_handler))
        .route(Endpoint::Health.path(), web::get().to(health_handler))
        .route(Endpoint::Recipe.path(), web::post().to(recipe_handler))
        .route(Endpoint::Calculate.path(), web::post().to(calculate_handler))
        .route(Endpoint::ShowInput.path(), web::get().to(show_input_handler))
        .route(Endpoint::ShowOutput.path(), web::get().to(show_output_handler))
        .route(Endpoint::Debug.path(), web::get().to(debug_handler))
        .route(Endpoint::Metrics.path(), web::get().to(metrics_handler));
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Payload(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Payload(err.to_string()).into()
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
