use std::{path::PathBuf, sync::Arc, time::Duration};

use buffer_calc_domain::config::PhreeqcConfig;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{locator::DatabaseLocator, PhreeqcCli, RUN_DATABASE};

pub struct PhreeqcCliBuilder {
    binary: PathBuf,
    database: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
    standard_locations: bool,
    timeout: Duration,
}

impl Default for PhreeqcCliBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PhreeqcCliBuilder {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(PhreeqcConfig::DEFAULT_BINARY),
            database: None,
            search_dirs: Vec::new(),
            standard_locations: true,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &PhreeqcConfig) -> Self {
        let mut builder = Self::new()
            .binary(config.binary())
            .search_dirs(config.database_dirs().to_vec());
        if let Some(database) = config.database() {
            builder = builder.database(database);
        }
        builder
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Whether the working directory, executable directory and conventional
    /// install locations are searched in addition to `search_dirs`.
    pub fn standard_locations(mut self, enabled: bool) -> Self {
        self.standard_locations = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> PhreeqcCli {
        let roots = if self.standard_locations {
            DatabaseLocator::standard_roots(&self.search_dirs)
        } else {
            self.search_dirs
        };
        let locator = DatabaseLocator::new(self.database, roots);

        let database = match locator.resolve(RUN_DATABASE) {
            Ok(path) => {
                info!(database = %path.display(), "phreeqc database located");
                Some(path)
            }
            Err(err) => {
                warn!(%err, "phreeqc database not found yet; runs will fail until it is installed");
                None
            }
        };

        PhreeqcCli {
            binary: self.binary,
            locator,
            database: Arc::new(OnceCell::new_with(database)),
            timeout: self.timeout,
        }
    }
}
