pub mod calculate;
pub mod ops;
pub mod preview;

pub use calculate::{calculate_handler, recipe_handler};
pub use ops::{debug_handler, health_handler, index_handler, metrics_handler};
pub use preview::{show_input_handler, show_output_handler};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use buffer_calc_domain::{ModelError, SimulationError};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Invalid(#[from] ModelError),
    #[error("invalid request payload: {0}")]
    Payload(String),
    #[error("{0}")]
    Simulation(#[from] SimulationError),
}

impl ApiError {
    /// Label used for the `status` dimension of request metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ApiError::Invalid(_) | ApiError::Payload(_) => "invalid",
            ApiError::Simulation(SimulationError::TimedOut { .. }) => "timeout",
            ApiError::Simulation(
                SimulationError::EngineUnavailable { .. } | SimulationError::DatabaseMissing { .. },
            ) => "unavailable",
            ApiError::Simulation(_) => "engine_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) | ApiError::Payload(_) => StatusCode::BAD_REQUEST,
            ApiError::Simulation(SimulationError::TimedOut { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Simulation(
                SimulationError::EngineUnavailable { .. } | SimulationError::DatabaseMissing { .. },
            ) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Simulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Every route the service exposes, in banner order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    Index,
    Health,
    Recipe,
    Calculate,
    ShowInput,
    ShowOutput,
    Debug,
    Metrics,
}

impl Endpoint {
    pub fn method(self) -> &'static str {
        match self {
            Endpoint::Recipe | Endpoint::Calculate => "POST",
            _ => "GET",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Index => "/",
            Endpoint::Health => "/healthz",
            Endpoint::Recipe => "/recipe",
            Endpoint::Calculate => "/calculate",
            Endpoint::ShowInput => "/show_input",
            Endpoint::ShowOutput => "/show_output",
            Endpoint::Debug => "/debug",
            Endpoint::Metrics => "/metrics",
        }
    }
}

/// Counts one request outcome under `api_requests_total{endpoint,status}`.
pub fn record_request<T>(endpoint: Endpoint, result: &Result<T, ApiError>) {
    let status = match result {
        Ok(_) => "ok",
        Err(err) => err.metric_label(),
    };
    let endpoint: &'static str = endpoint.into();
    metrics::counter!(
        "api_requests_total",
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}
