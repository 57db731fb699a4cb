use crate::error::{AppError, Result};
use serde::Deserialize;
use std::env;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENV_FILE: &str = ".env";

/// Load `path` (or `.env` when `None`) into the process environment.
///
/// Variables already present in the environment are not overridden.
pub fn init_env(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
    dotenv::from_path(path).map_err(|e| {
        AppError::config(format!("Error loading {}: {}", path.display(), e))
    })?;

    debug!(path = %path.display(), "Loaded environment file");
    Ok(path.to_path_buf())
}

/// Value of `key`, or an empty string when unset.
pub fn get_env_string(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

/// Helper function to get environment variable with a default value
pub fn get_env_or_default(key: &str, default_value: &str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.to_string())
}

/// Parse `key` as `T`, falling back to `default` when unset.
pub fn get_env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::config(format!("{} has invalid value '{}': {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

/// Helper function to validate required environment variables
pub fn validate_required_env_vars(vars: &[&str]) -> Result<()> {
    let missing_vars: Vec<String> = vars
        .iter()
        .filter(|&&var| env::var(var).is_err())
        .map(|var| var.to_string())
        .collect();

    if !missing_vars.is_empty() {
        return Err(AppError::MissingEnvVars(missing_vars));
    }

    Ok(())
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

impl LogFormat {
    pub fn from_string(format: &str) -> Self {
        match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" | "" => LogFormat::Compact,
            _ => {
                warn!("Unknown log format '{}', defaulting to compact", format);
                LogFormat::Compact
            }
        }
    }
}

/// Size-based rotation of the log file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogRotation {
    /// Rotate once the active file grows past this many bytes.
    pub max_bytes: usize,
    /// Rotated files kept next to the active one (`app.log.1`, `app.log.2`, ...).
    pub max_backups: usize,
    /// Gzip rotated files.
    pub compress: bool,
}

impl Default for LogRotation {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_backups: 3,
            compress: true,
        }
    }
}

impl LogRotation {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: env_or_warn("LOG_MAX_SIZE_MB", defaults.max_bytes / (1024 * 1024))
                .saturating_mul(1024 * 1024),
            max_backups: env_or_warn("LOG_MAX_BACKUPS", defaults.max_backups),
            compress: env_or_warn("LOG_COMPRESS", defaults.compress),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are written to this file as JSON lines instead of
    /// going to stdout, rotated according to `rotation`.
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            file: None,
            rotation: LogRotation::default(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let level = get_env_or_default("LOG_LEVEL", "info");
        let format = LogFormat::from_string(&get_env_string("LOG_FORMAT"));
        let file = env::var("LOG_FILE")
            .ok()
            .filter(|f| !f.trim().is_empty())
            .map(PathBuf::from);

        Self {
            level,
            format,
            file,
            rotation: LogRotation::from_env(),
        }
    }
}

fn env_or_warn<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + fmt::Debug,
    T::Err: Display,
{
    get_env_parsed(key, default).unwrap_or_else(|e| {
        warn!("{}, using default {:?}", e, default);
        default
    })
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpConfig {
    pub fn from_env() -> Result<Self> {
        let timeout_secs = get_env_parsed::<u64>("HTTP_TIMEOUT_SECS", 30)?;
        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
