use serde::Deserialize;
use crate::error::{DateManagerError, Result};

pub const MIN_BATCH_SIZE: usize = 10;
pub const MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 25;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Records processed between pacing pauses (clamped to 10..=100)
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub default_excluded_emails: Vec<String>,
    /// Actors allowed to run updates; empty allows everyone
    pub authorized_actors: Vec<String>,
    pub actor: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: 250,
            default_excluded_emails: Vec::new(),
            authorized_actors: Vec::new(),
            actor: "cli".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "subscriptions.db".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SDM")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("engine.default_excluded_emails")
                    .with_list_parse_key("engine.authorized_actors")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(DateManagerError::Config("database.path must not be empty".to_string()));
        }
        if self.engine.actor.trim().is_empty() {
            return Err(DateManagerError::Config("engine.actor must not be empty".to_string()));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Pacing chunk size, clamped to the supported range
    pub fn batch_size(&self) -> usize {
        self.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
    }

    /// Configured default exclusions, trimmed with blanks dropped, one per line
    pub fn default_exclusion_text(&self) -> String {
        self.default_excluded_emails
            .iter()
            .map(|email| email.trim())
            .filter(|email| !email.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_authorized(&self, actor: &str) -> bool {
        self.authorized_actors.is_empty()
            || self.authorized_actors.iter().any(|allowed| allowed == actor)
    }
}
