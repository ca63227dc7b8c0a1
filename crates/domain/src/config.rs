//! Environment-driven configuration structures shared by all binaries.

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// HTTP surface configuration: listener, worker pool and request deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    port: u16,
    bind_host: String,
    workers: usize,
    request_timeout: Duration,
    simulation_cache_ttl: Duration,
}

impl ApiConfig {
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_BIND_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_WORKERS: usize = 2;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_SIMULATION_CACHE_TTL_SECS: u64 = 600;

    /// Loads the variables read by the API binary. Everything is optional;
    /// malformed values surface as `ConfigError` instead of silently falling
    /// back to defaults.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let port = parse_optional_var::<u16>("PORT")?.unwrap_or(Self::DEFAULT_PORT);
        let bind_host =
            get_optional_var("API_BIND_HOST").unwrap_or_else(|| Self::DEFAULT_BIND_HOST.to_string());

        let workers = parse_optional_var::<u64>("API_WORKERS")?
            .unwrap_or(Self::DEFAULT_WORKERS as u64);
        if workers == 0 {
            return Err(ConfigError::OutOfRange {
                key: "API_WORKERS",
                value: workers.to_string(),
            });
        }

        let timeout_secs = parse_optional_var::<u64>("API_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(Self::DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                key: "API_REQUEST_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
            });
        }

        let cache_ttl_secs = parse_optional_var::<u64>("API_SIMULATION_CACHE_TTL_SECS")?
            .unwrap_or(Self::DEFAULT_SIMULATION_CACHE_TTL_SECS);

        Ok(Self {
            port,
            bind_host,
            workers: workers as usize,
            request_timeout: Duration::from_secs(timeout_secs),
            simulation_cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn bind_host(&self) -> &str {
        &self.bind_host
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn simulation_cache_ttl(&self) -> Duration {
        self.simulation_cache_ttl
    }
}

/// Location of the PHREEQC executable and its thermodynamic databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhreeqcConfig {
    binary: PathBuf,
    database: Option<PathBuf>,
    database_dirs: Vec<PathBuf>,
}

impl PhreeqcConfig {
    pub const DEFAULT_BINARY: &'static str = "phreeqc";

    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let binary = get_optional_var("PHREEQC_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_BINARY));
        let database = get_optional_var("PHREEQC_DATABASE").map(PathBuf::from);
        let database_dirs = get_optional_var("PHREEQC_DATABASE_DIRS")
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default();

        Ok(Self {
            binary,
            database,
            database_dirs,
        })
    }

    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }

    pub fn database(&self) -> Option<&std::path::Path> {
        self.database.as_deref()
    }

    pub fn database_dirs(&self) -> &[PathBuf] {
        &self.database_dirs
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_optional_var<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    get_optional_var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|source| ConfigError::InvalidNumber { key, source })
        })
        .transpose()
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("BUFFER_CALC_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("value `{value}` is out of range for `{key}`")]
    OutOfRange { key: &'static str, value: String },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn reset_env() {
        std::env::set_var("BUFFER_CALC_SKIP_DOTENV", "1");
        for key in [
            "PORT",
            "API_BIND_HOST",
            "API_WORKERS",
            "API_REQUEST_TIMEOUT_SECS",
            "API_SIMULATION_CACHE_TTL_SECS",
            "PHREEQC_BIN",
            "PHREEQC_DATABASE",
            "PHREEQC_DATABASE_DIRS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn port_defaults_to_8080_when_unset() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();

        let config = ApiConfig::load_from_env().expect("api config loads");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.workers(), 2);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.simulation_cache_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn port_is_read_from_env() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        std::env::set_var("PORT", "3000");

        let config = ApiConfig::load_from_env().expect("api config loads");
        assert_eq!(config.port(), 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        reset_env();
    }

    #[test]
    fn values_are_trimmed_and_blank_means_default() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        std::env::set_var("PORT", "   ");
        std::env::set_var("API_BIND_HOST", " 127.0.0.1 ");
        std::env::set_var("API_WORKERS", " 4 ");

        let config = ApiConfig::load_from_env().expect("api config loads");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.bind_host(), "127.0.0.1");
        assert_eq!(config.workers(), 4);

        reset_env();
    }

    #[test]
    fn malformed_port_is_rejected() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        std::env::set_var("PORT", "eighty");

        let err = ApiConfig::load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "PORT", .. }));

        std::env::set_var("PORT", "70000");
        let err = ApiConfig::load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "PORT", .. }));

        reset_env();
    }

    #[test]
    fn zero_workers_or_timeout_is_out_of_range() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();
        std::env::set_var("API_WORKERS", "0");
        let err = ApiConfig::load_from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                key: "API_WORKERS",
                ..
            }
        ));

        reset_env();
        std::env::set_var("API_REQUEST_TIMEOUT_SECS", "0");
        let err = ApiConfig::load_from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                key: "API_REQUEST_TIMEOUT_SECS",
                ..
            }
        ));

        reset_env();
    }

    #[test]
    fn phreeqc_config_reads_paths() {
        let _guard = ENV_GUARD.lock().unwrap();
        reset_env();

        let config = PhreeqcConfig::load_from_env().expect("phreeqc config loads");
        assert_eq!(config.binary(), std::path::Path::new("phreeqc"));
        assert!(config.database().is_none());
        assert!(config.database_dirs().is_empty());

        let dirs = env::join_paths(["/opt/a", "/opt/b"]).unwrap();
        std::env::set_var("PHREEQC_BIN", "/usr/local/bin/phreeqc");
        std::env::set_var("PHREEQC_DATABASE", "/data/pitzer.dat");
        std::env::set_var("PHREEQC_DATABASE_DIRS", &dirs);

        let config = PhreeqcConfig::load_from_env().expect("phreeqc config loads");
        assert_eq!(config.binary(), std::path::Path::new("/usr/local/bin/phreeqc"));
        assert_eq!(
            config.database(),
            Some(std::path::Path::new("/data/pitzer.dat"))
        );
        assert_eq!(
            config.database_dirs(),
            &[PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );

        reset_env();
    }
}
