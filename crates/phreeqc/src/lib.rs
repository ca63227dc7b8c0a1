//! PHREEQC command-line engine behind the domain `Simulator` trait. Each run
//! gets its own scratch directory, so concurrent requests never share input,
//! output or selected-output files.

mod builder;
pub mod locator;

use std::{
    env,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use buffer_calc_domain::{
    EngineDiagnostics, InputDeck, SelectedOutput, SimulationError, SimulationResult, Simulator,
};
use metrics::{counter, histogram};
use tokio::{fs, process::Command, sync::OnceCell, task, time::timeout};
use tracing::{debug, warn};

pub use builder::PhreeqcCliBuilder;
pub use locator::DatabaseLocator;

/// Database every buffer titration runs against.
pub const RUN_DATABASE: &str = "pitzer.dat";

const INPUT_FILE: &str = "input.pqi";
const OUTPUT_FILE: &str = "output.out";
const SELECTED_FILE: &str = "selected.sel";

/// Runs decks through the `phreeqc` executable.
#[derive(Debug, Clone)]
pub struct PhreeqcCli {
    binary: PathBuf,
    locator: DatabaseLocator,
    database: Arc<OnceCell<PathBuf>>,
    timeout: Duration,
}

impl PhreeqcCli {
    pub fn builder() -> PhreeqcCliBuilder {
        PhreeqcCliBuilder::new()
    }

    /// The run database, located once and then reused. A failed lookup is
    /// not remembered, so a database installed later is still picked up.
    async fn run_database(&self) -> SimulationResult<PathBuf> {
        self.database
            .get_or_try_init(|| {
                let locator = self.locator.clone();
                async move {
                    task::spawn_blocking(move || locator.resolve(RUN_DATABASE))
                        .await
                        .map_err(SimulationError::from_io)?
                }
            })
            .await
            .cloned()
    }

    /// The executable as the OS would resolve it: as given when it contains a
    /// path separator, otherwise the first match on `PATH`.
    fn resolve_binary(&self) -> Option<PathBuf> {
        if self.binary.components().count() > 1 {
            return self.binary.is_file().then(|| self.binary.clone());
        }
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join(&self.binary))
            .find(|candidate| candidate.is_file())
    }

    async fn execute(&self, deck: &InputDeck, database: &Path) -> SimulationResult<SelectedOutput> {
        let scratch = tempfile::Builder::new()
            .prefix("phreeqc-")
            .tempdir()
            .map_err(SimulationError::from_io)?;
        let input_path = scratch.path().join(INPUT_FILE);
        let output_path = scratch.path().join(OUTPUT_FILE);
        let selected_path = scratch.path().join(SELECTED_FILE);

        fs::write(&input_path, deck.with_selected_output_file(&selected_path))
            .await
            .map_err(SimulationError::from_io)?;

        let child = Command::new(&self.binary)
            .arg(&input_path)
            .arg(&output_path)
            .arg(database)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let finished = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(SimulationError::from_io)?,
            Err(_) => {
                return Err(SimulationError::TimedOut {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        let listing = fs::read_to_string(&output_path).await.unwrap_or_default();
        let mut errors = error_lines(&String::from_utf8_lossy(&finished.stderr));
        errors.extend(error_lines(&String::from_utf8_lossy(&finished.stdout)));
        errors.extend(error_lines(&listing));
        errors.dedup();

        if !finished.status.success() || !errors.is_empty() {
            let message = if errors.is_empty() {
                format!("engine exited with {}", finished.status)
            } else {
                errors.join("\n")
            };
            return Err(SimulationError::Engine { message });
        }

        let selected = match fs::read_to_string(&selected_path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SimulationError::Engine {
                    message: "engine finished without writing selected output".to_string(),
                })
            }
            Err(err) => return Err(SimulationError::from_io(err)),
        };

        Ok(SelectedOutput::parse(&selected)?)
    }

    fn spawn_error(&self, err: std::io::Error) -> SimulationError {
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                SimulationError::EngineUnavailable {
                    binary: self.binary.display().to_string(),
                    reason: err.to_string(),
                }
            }
            _ => SimulationError::from_io(err),
        }
    }
}

#[async_trait]
impl Simulator for PhreeqcCli {
    async fn run(&self, deck: &InputDeck) -> SimulationResult<SelectedOutput> {
        let database = self.run_database().await.inspect_err(|_| {
            counter!("phreeqc_runs_total", "result" => "database_missing").increment(1);
        })?;

        let started = Instant::now();
        let outcome = self.execute(deck, &database).await;
        let elapsed = started.elapsed().as_secs_f64();
        histogram!("phreeqc_run_seconds").record(elapsed);

        match &outcome {
            Ok(output) => {
                counter!("phreeqc_runs_total", "result" => "ok").increment(1);
                debug!(rows = output.len(), elapsed, "phreeqc run finished");
            }
            Err(SimulationError::TimedOut { seconds }) => {
                counter!("phreeqc_runs_total", "result" => "timeout").increment(1);
                warn!(seconds, "phreeqc run timed out and was killed");
            }
            Err(err) => {
                counter!("phreeqc_runs_total", "result" => "error").increment(1);
                warn!(%err, elapsed, "phreeqc run failed");
            }
        }

        outcome
    }

    async fn diagnostics(&self, databases: &[&str]) -> EngineDiagnostics {
        let names: Vec<String> = databases.iter().map(|name| name.to_string()).collect();
        let engine = self.clone();
        // Directory walks and PATH lookups stay off the async workers.
        let (binary_path, reports) = task::spawn_blocking(move || {
            let reports = names.iter().map(|name| engine.locator.report(name)).collect();
            (engine.resolve_binary(), reports)
        })
        .await
        .unwrap_or_default();

        EngineDiagnostics {
            engine: "phreeqc-cli".to_string(),
            binary: self.binary.display().to_string(),
            binary_path,
            timeout_secs: self.timeout.as_secs(),
            databases: reports,
        }
    }
}

fn error_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR"))
        .map(str::to_string)
        .collect()
}
