use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    /// Remote state store (optional). Without it state lives only in the
    /// local file, which is fine on a host with a persistent disk.
    #[serde(default)]
    pub state_store: Option<StateStoreConfig>,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Numeric chat id or @username of the target channel
    pub channel_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateStoreConfig {
    /// Base URL of the storage service
    pub url: String,
    /// Service key
    pub key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Object path of the state blob inside the bucket
    #[serde(default = "default_object_path")]
    pub object_path: String,
}

fn default_bucket() -> String {
    "wallpaper-bot".to_string()
}

fn default_object_path() -> String {
    "state.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// HTML document holding the wallpaper <img> tags
    #[serde(default = "default_wallpapers_file")]
    pub wallpapers_file: String,
    /// JSON document holding the caption list
    #[serde(default = "default_captions_file")]
    pub captions_file: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wallpapers_file: default_wallpapers_file(),
            captions_file: default_captions_file(),
        }
    }
}

fn default_wallpapers_file() -> String {
    "wallpapers.html".to_string()
}

fn default_captions_file() -> String {
    "captions.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PostingConfig {
    /// Local state snapshot file
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Append-only audit log of published images
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            audit_log: default_audit_log(),
        }
    }
}

fn default_state_file() -> String {
    "state.json".to_string()
}

fn default_audit_log() -> String {
    "post_log.txt".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "data/logs".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config.toml").required(false))
            .add_source(config::Environment::with_prefix("WALL").separator("__"));

        // Well-known variables recognized without the prefix, matching the
        // names the deployment environment already uses.
        builder = builder
            .set_override_option("telegram.bot_token", std::env::var("BOT_TOKEN").ok())?
            .set_override_option("telegram.channel_id", std::env::var("CHANNEL_ID").ok())?
            .set_override_option("state_store.url", std::env::var("STATE_STORE_URL").ok())?
            .set_override_option("state_store.key", std::env::var("STATE_STORE_KEY").ok())?;

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.logging.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "info" => tracing::Level::INFO,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}
