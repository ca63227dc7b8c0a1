use std::{sync::Arc, time::Duration};

use buffer_calc_domain::services::{cache::SimulationCache, telemetry::TelemetryGuard};
use buffer_calc_domain::{InputDeck, SelectedOutput, SimulationError, SimulationResult, Simulator};
use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::{sync::Semaphore, time::timeout};
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn Simulator>,
    cache: SimulationCache,
    telemetry: TelemetryGuard,
    gate: Arc<Semaphore>,
    request_timeout: Duration,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// `workers` bounds how many engine runs are in flight at once; further
    /// requests queue on the gate.
    pub fn new(
        engine: Arc<dyn Simulator>,
        cache: SimulationCache,
        telemetry: TelemetryGuard,
        workers: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            cache,
            telemetry,
            gate: Arc::new(Semaphore::new(workers.max(1))),
            request_timeout,
            started_at: Utc::now(),
        }
    }

    pub fn engine(&self) -> &dyn Simulator {
        self.engine.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    /// Runs `deck`, serving repeats from the cache. The request timeout covers
    /// both the wait for a free slot and the engine run itself.
    pub async fn simulate(&self, deck: &InputDeck) -> SimulationResult<Arc<SelectedOutput>> {
        if let Some(hit) = self.cache.get(deck) {
            counter!("api_simulation_cache_total", "result" => "hit").increment(1);
            return Ok(hit);
        }
        if self.cache.is_enabled() {
            counter!("api_simulation_cache_total", "result" => "miss").increment(1);
        }

        let run = async {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| SimulationError::from_io("simulation gate closed"))?;
            debug!(fingerprint = %deck.fingerprint(), "simulation slot acquired");
            self.engine.run(deck).await
        };

        let output = match timeout(self.request_timeout, run).await {
            Ok(result) => Arc::new(result?),
            Err(_) => {
                return Err(SimulationError::TimedOut {
                    seconds: self.request_timeout.as_secs(),
                })
            }
        };

        self.cache.insert(deck, output.clone());
        Ok(output)
    }
}
