use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::phreeqc::{InputDeck, OutputError, SelectedOutput};

/// Common result alias for engine runs.
pub type SimulationResult<T> = Result<T, SimulationError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("PHREEQC engine `{binary}` is not available: {reason}")]
    EngineUnavailable { binary: String, reason: String },
    #[error("database `{name}` not found (searched: {})", searched.join(", "))]
    DatabaseMissing { name: String, searched: Vec<String> },
    #[error("PHREEQC error:\n{message}")]
    Engine { message: String },
    #[error("simulation exceeded {seconds}s and was terminated")]
    TimedOut { seconds: u64 },
    #[error("could not read simulation output: {0}")]
    Output(#[from] OutputError),
    #[error("simulation io error: {0}")]
    Io(String),
}

impl SimulationError {
    pub fn from_io(err: impl std::fmt::Display) -> Self {
        Self::Io(err.to_string())
    }
}

/// Where an engine looks for a database file and whether it found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseReport {
    pub name: String,
    pub path: Option<PathBuf>,
    pub exists: bool,
    pub searched: Vec<PathBuf>,
}

/// Snapshot of the engine set-up, served by the diagnostics route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDiagnostics {
    pub engine: String,
    pub binary: String,
    pub binary_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub databases: Vec<DatabaseReport>,
}

/// Runs PHREEQC input decks. Implementations must be cheap to share across
/// HTTP workers.
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn run(&self, deck: &InputDeck) -> SimulationResult<SelectedOutput>;

    /// Reports how the engine resolves each of the named databases.
    async fn diagnostics(&self, databases: &[&str]) -> EngineDiagnostics;
}
