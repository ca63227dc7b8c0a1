use actix_web::{web::Data, HttpResponse};
use buffer_calc_domain::EngineDiagnostics;
use buffer_calc_phreeqc::RUN_DATABASE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::state::AppState;

use super::Endpoint;

/// Databases reported by the diagnostics route.
pub const DIAGNOSED_DATABASES: [&str; 2] = [RUN_DATABASE, "phreeqc.dat"];

#[derive(Debug, Serialize, Deserialize)]
pub struct Banner {
    pub name: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub routes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub service_version: String,
    pub workers_available: usize,
    pub request_timeout_secs: u64,
    pub engine: EngineDiagnostics,
}

pub async fn index_handler(state: Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(Banner {
        name: "Hypersaline Buffer Calculator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at(),
        routes: Endpoint::iter()
            .map(|endpoint| format!("{} {}", endpoint.method(), endpoint.path()))
            .collect(),
    })
}

pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn debug_handler(state: Data<AppState>) -> HttpResponse {
    let engine = state.engine().diagnostics(&DIAGNOSED_DATABASES).await;
    HttpResponse::Ok().json(DebugResponse {
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        workers_available: state.available_slots(),
        request_timeout_secs: state.request_timeout().as_secs(),
        engine,
    })
}

pub async fn metrics_handler(state: Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(state.telemetry().render_metrics())
}
