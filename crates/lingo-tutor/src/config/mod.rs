use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::progression::{ProgressionConfig, ThresholdError};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub storage: StorageConfig,
    pub tutor: TutorConfig,
    pub progression: ProgressionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let telemetry = TelemetryConfig {
            log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(&env::var("APP_LOG_FORMAT").unwrap_or_default())?,
            log_dir: non_empty_var("APP_LOG_DIR").map(PathBuf::from),
            rotation: LogRotation::parse(&env::var("APP_LOG_ROTATION").unwrap_or_default())?,
        };

        let storage = StorageConfig {
            database_url: non_empty_var("APP_DATABASE_URL"),
        };

        let tutor = TutorConfig {
            api_key: non_empty_var("APP_TUTOR_API_KEY").or_else(|| non_empty_var("OPENAI_API_KEY")),
            model: non_empty_var("APP_TUTOR_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            base_url: non_empty_var("APP_TUTOR_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        };

        let progression = match non_empty_var("APP_PROGRESSION_FILE") {
            Some(path) => load_progression_file(PathBuf::from(path))?,
            None => ProgressionConfig::standard(),
        };
        progression.validate().map_err(ConfigError::Progression)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry,
            storage,
            tutor,
            progression,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read a progression rules JSON file.
pub fn load_progression_file(path: PathBuf) -> Result<ProgressionConfig, ConfigError> {
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::ProgressionFile {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::ProgressionFormat { path, source })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
    /// When set, structured JSON logs are also written below this directory.
    pub log_dir: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Compact,
            log_dir: None,
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Daily,
    Hourly,
    Never,
}

impl LogRotation {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "never" => Ok(Self::Never),
            other => Err(ConfigError::InvalidLogRotation(other.to_string())),
        }
    }
}

/// Where accounts, chat history and progression live. No URL means the in-process store.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub database_url: Option<String>,
}

/// Connection details for the LLM tutor. Without an API key the canned tutor is used.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidLogFormat(String),
    InvalidLogRotation(String),
    ProgressionFile {
        path: PathBuf,
        source: std::io::Error,
    },
    ProgressionFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    Progression(ThresholdError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidLogRotation(value) => write!(
                f,
                "APP_LOG_ROTATION must be 'daily', 'hourly' or 'never', got '{value}'"
            ),
            ConfigError::ProgressionFile { path, .. } => {
                write!(f, "unable to read progression file {}", path.display())
            }
            ConfigError::ProgressionFormat { path, source } => {
                write!(f, "invalid progression file {}: {source}", path.display())
            }
            ConfigError::Progression(err) => write!(f, "invalid progression table: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat(_)
            | ConfigError::InvalidLogRotation(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ProgressionFile { source, .. } => Some(source),
            ConfigError::ProgressionFormat { source, .. } => Some(source),
            ConfigError::Progression(err) => Some(err),
        }
    }
}
