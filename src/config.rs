use crate::core::{RankLimits, ScoringWeights};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub directory: DirectorySettings,
    pub cache: CacheSettings,
    pub notifications: NotificationSettings,
    pub matching: MatchingSettings,
    pub scoring: ScoringSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

/// Ledger storage; without a URL the service keeps interactions in memory
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectorySettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Redis L2; L1-only when unset
    pub redis_url: Option<String>,
    pub ttl_secs: u64,
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_secs: 300,
            l1_cache_size: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub channel_buffer: usize,
    pub max_channels_per_user: usize,
    pub keep_alive_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            channel_buffer: 32,
            max_channels_per_user: 8,
            keep_alive_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_min_score: u8,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        let limits = RankLimits::default();
        Self {
            default_limit: limits.default_limit,
            max_limit: limits.max_limit,
            default_min_score: limits.default_min_score,
        }
    }
}

impl MatchingSettings {
    pub fn limits(&self) -> RankLimits {
        RankLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            default_min_score: self.default_min_score,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Component maxima; anything omitted keeps its default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub category: Option<u32>,
    pub skills: Option<u32>,
    pub general_skills: Option<u32>,
    pub suitability: Option<u32>,
    pub overqualified: Option<u32>,
    pub budget_fit: Option<u32>,
    pub budget_buffer: Option<u32>,
    pub budget_neutral: Option<u32>,
    pub budget_buffer_pct: Option<u64>,
    pub timeline: Option<u32>,
    pub bonus_cap: Option<u32>,
}

impl WeightsConfig {
    pub fn to_weights(&self) -> ScoringWeights {
        let d = ScoringWeights::default();
        ScoringWeights {
            category: self.category.unwrap_or(d.category),
            skills: self.skills.unwrap_or(d.skills),
            general_skills: self.general_skills.unwrap_or(d.general_skills),
            suitability: self.suitability.unwrap_or(d.suitability),
            overqualified: self.overqualified.unwrap_or(d.overqualified),
            budget_fit: self.budget_fit.unwrap_or(d.budget_fit),
            budget_buffer: self.budget_buffer.unwrap_or(d.budget_buffer),
            budget_neutral: self.budget_neutral.unwrap_or(d.budget_neutral),
            budget_buffer_pct: self.budget_buffer_pct.unwrap_or(d.budget_buffer_pct),
            timeline: self.timeline.unwrap_or(d.timeline),
            bonus_cap: self.bonus_cap.unwrap_or(d.bonus_cap),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    // e.g., FOUNDRY__SERVER__PORT -> server.port
    Environment::with_prefix("FOUNDRY")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Later sources override earlier ones:
    /// 1. Defaults on the structs
    /// 2. `config/default.toml`
    /// 3. `config/local.toml`
    /// 4. Environment variables prefixed with `FOUNDRY`
    /// 5. `DATABASE_URL` and `JWT_SECRET`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

/// Conventional unprefixed variables win over everything else
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        builder = builder.set_override("auth.jwt_secret", secret)?;
    }

    builder.build()
}
