use std::{sync::Arc, time::Duration};

use moka::sync::Cache;

use crate::phreeqc::{InputDeck, SelectedOutput};

/// Memoises engine results by deck fingerprint. PHREEQC is deterministic for
/// a given deck and database, so a repeated calculation can skip the run.
#[derive(Debug, Clone)]
pub struct SimulationCache {
    results: Option<Cache<String, Arc<SelectedOutput>>>,
}

impl SimulationCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
    pub const DEFAULT_CAPACITY: u64 = 1_024;

    /// A zero `ttl` yields a cache that never stores anything.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        if ttl.is_zero() {
            return Self::disabled();
        }
        let capacity = capacity.max(1);
        Self {
            results: Some(
                Cache::builder()
                    .time_to_live(ttl)
                    .max_capacity(capacity)
                    .build(),
            ),
        }
    }

    pub fn disabled() -> Self {
        Self { results: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.results.is_some()
    }

    pub fn get(&self, deck: &InputDeck) -> Option<Arc<SelectedOutput>> {
        self.results
            .as_ref()
            .and_then(|results| results.get(&deck.fingerprint()))
    }

    pub fn insert(&self, deck: &InputDeck, output: Arc<SelectedOutput>) {
        if let Some(results) = &self.results {
            results.insert(deck.fingerprint(), output);
        }
    }
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}
