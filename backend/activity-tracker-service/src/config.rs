use dotenvy::dotenv;
use resilience::{BackoffConfig, ExponentialBackoff};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub kafka: KafkaConfig,
    pub logging: LoggingConfig,
    pub backoff: BackoffSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub group_id: String,
    pub client_id: String,
    pub session_timeout_ms: u64,
    pub delivery_timeout_ms: u64,
    /// Create the registry's topics on startup
    pub bootstrap_topics: bool,
    pub replication_factor: i32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            group_id: "user-activity-tracker".to_string(),
            client_id: "user-activity-tracker".to_string(),
            session_timeout_ms: 30_000,
            delivery_timeout_ms: 30_000,
            bootstrap_topics: false,
            replication_factor: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl TryFrom<String> for LogFormat {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for LogFormat {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ServiceError::Config(format!(
                "unsupported log format '{other}' (expected json or pretty)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackoffSettings {
    pub initial_ms: u64,
    pub max_ms: u64,
}

impl BackoffSettings {
    /// Policy applied by each consumer lane after fetch failures
    pub fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(BackoffConfig {
            initial_backoff: Duration::from_millis(self.initial_ms),
            max_backoff: Duration::from_millis(self.max_ms),
            ..Default::default()
        })
    }
}

/// Candidate config files, in lookup order, when `APP_CONFIG_FILE` is unset
const DEFAULT_CONFIG_FILES: [&str; 2] = ["../config.yml", "config.yml"];

impl Config {
    /// Load configuration from an optional YAML file overridden by `APP_*`
    /// environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenv().ok();
        let lookup = |key: &str| env::var(key).ok();
        let file = config_file_path(&lookup);
        Self::from_sources(file.as_deref(), lookup)
    }

    /// Defaults overridden by `lookup` only, without any config file
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_sources(None, lookup)
    }

    /// Layer defaults, then `file` (if any), then the `APP_*` values from `lookup`
    pub fn from_sources<F>(file: Option<&Path>, lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kafka = KafkaConfig::default();

        let mut builder = ::config::Config::builder()
            .set_default("app.name", "user-activity-tracker")?
            .set_default("app.version", env!("CARGO_PKG_VERSION"))?
            .set_default("app.environment", "development")?
            .set_default("kafka.brokers", kafka.brokers.clone())?
            .set_default("kafka.group_id", kafka.group_id.clone())?
            .set_default("kafka.client_id", kafka.client_id.clone())?
            .set_default("kafka.session_timeout_ms", kafka.session_timeout_ms as i64)?
            .set_default("kafka.delivery_timeout_ms", kafka.delivery_timeout_ms as i64)?
            .set_default("kafka.bootstrap_topics", kafka.bootstrap_topics)?
            .set_default("kafka.replication_factor", i64::from(kafka.replication_factor))?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("backoff.initial_ms", 100_i64)?
            .set_default("backoff.max_ms", 30_000_i64)?;

        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path));
        }

        let config: Config = builder
            .set_override_option("app.name", lookup("APP_NAME"))?
            .set_override_option("app.version", lookup("APP_VERSION"))?
            .set_override_option("app.environment", lookup("APP_ENVIRONMENT"))?
            .set_override_option(
                "kafka.brokers",
                lookup("APP_KAFKA_BROKERS").map(|raw| parse_list(&raw)),
            )?
            .set_override_option("kafka.group_id", lookup("APP_KAFKA_GROUP_ID"))?
            .set_override_option("kafka.client_id", lookup("APP_KAFKA_CLIENT_ID"))?
            .set_override_option(
                "kafka.session_timeout_ms",
                parse_var::<_, u64>(&lookup, "APP_KAFKA_SESSION_TIMEOUT_MS")?.map(|v| v as i64),
            )?
            .set_override_option(
                "kafka.delivery_timeout_ms",
                parse_var::<_, u64>(&lookup, "APP_KAFKA_DELIVERY_TIMEOUT_MS")?.map(|v| v as i64),
            )?
            .set_override_option(
                "kafka.bootstrap_topics",
                parse_var::<_, bool>(&lookup, "APP_KAFKA_BOOTSTRAP_TOPICS")?,
            )?
            .set_override_option(
                "kafka.replication_factor",
                parse_var::<_, i32>(&lookup, "APP_KAFKA_REPLICATION_FACTOR")?.map(i64::from),
            )?
            .set_override_option("logging.level", lookup("APP_LOGGING_LEVEL"))?
            .set_override_option("logging.format", lookup("APP_LOGGING_FORMAT"))?
            .set_override_option(
                "backoff.initial_ms",
                parse_var::<_, u64>(&lookup, "APP_BACKOFF_INITIAL_MS")?.map(|v| v as i64),
            )?
            .set_override_option(
                "backoff.max_ms",
                parse_var::<_, u64>(&lookup, "APP_BACKOFF_MAX_MS")?.map(|v| v as i64),
            )?
            .build()?
            .try_deserialize()?;

        config.validated()
    }

    fn validated(mut self) -> Result<Self, ServiceError> {
        self.kafka.brokers = self
            .kafka
            .brokers
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();
        if self.kafka.brokers.is_empty() {
            return Err(ServiceError::Config(
                "kafka.brokers (APP_KAFKA_BROKERS) must list at least one broker".into(),
            ));
        }

        if self.backoff.initial_ms > self.backoff.max_ms {
            return Err(ServiceError::Config(
                "APP_BACKOFF_INITIAL_MS must not exceed APP_BACKOFF_MAX_MS".into(),
            ));
        }

        Ok(self)
    }
}

/// `APP_CONFIG_FILE` if set, otherwise the first default file that exists
pub fn config_file_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = lookup("APP_CONFIG_FILE") {
        return Some(PathBuf::from(explicit));
    }

    DEFAULT_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ServiceError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ServiceError::Config(format!("{key} has invalid value '{raw}'")))
        })
        .transpose()
}
