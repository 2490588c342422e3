use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{DripfeedError, Result};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_CONFIG_PATH: &str = "dripfeed.toml";
pub const DEFAULT_POST_TIME: &str = "10:00";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 15 * 60;
pub const ENV_PREFIX: &str = "DRIPFEED_";

/// Top-level config (dripfeed.toml + DRIPFEED_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DripfeedConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Dashboard/API authentication. Disabled when no password is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub dashboard_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub database_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_id: String::new(),
            project_id: String::new(),
            base_url: default_notion_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub access_secret: String,
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            access_token: String::new(),
            access_secret: String::new(),
            base_url: default_twitter_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Log posts instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
    /// Daily publish time, `HH:MM` in UTC.
    #[serde(default = "default_post_time")]
    pub post_time: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            post_time: default_post_time(),
        }
    }
}

impl PublishConfig {
    /// Parse `post_time` into `(hour, minute)`.
    pub fn post_time_hm(&self) -> Result<(u8, u8)> {
        let invalid = || DripfeedError::InvalidPostTime {
            value: self.post_time.clone(),
        };
        let (h, m) = self.post_time.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        if hour > 23 || minute > 59 {
            return Err(invalid());
        }
        Ok((hour, minute))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often both sources are polled.
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
        }
    }
}

/// Locations of the persisted documents and the lines file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_schedule_file")]
    pub schedule_file: String,
    #[serde(default = "default_lines_file")]
    pub lines_file: String,
    #[serde(default = "default_file_state_file")]
    pub file_state_file: String,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            schedule_file: default_schedule_file(),
            lines_file: default_lines_file(),
            file_state_file: default_file_state_file(),
            public_dir: default_public_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Move corrupt documents aside on startup instead of refusing to start.
    #[serde(default)]
    pub reset_corrupt: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}
fn default_twitter_base_url() -> String {
    "https://api.twitter.com".to_string()
}
fn default_post_time() -> String {
    DEFAULT_POST_TIME.to_string()
}
fn default_sync_interval() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}
fn default_state_file() -> String {
    "sync-state.json".to_string()
}
fn default_schedule_file() -> String {
    "schedule.json".to_string()
}
fn default_lines_file() -> String {
    "tweets.txt".to_string()
}
fn default_file_state_file() -> String {
    "file-state.json".to_string()
}
fn default_public_dir() -> String {
    "public".to_string()
}

impl DripfeedConfig {
    /// Load config from a TOML file with DRIPFEED_* env var overrides.
    ///
    /// Nested keys use a double underscore: `DRIPFEED_PUBLISH__DRY_RUN=true`.
    /// A missing file is not an error; every key has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| DripfeedError::Config(e.to_string()))
    }

    /// Check that every credential the running service needs is present.
    ///
    /// Twitter credentials are not required in dry-run mode.
    pub fn validate(&self) -> Result<()> {
        self.publish.post_time_hm()?;

        let mut required = vec![
            ("notion.api_key", &self.notion.api_key),
            ("notion.database_id", &self.notion.database_id),
            ("notion.project_id", &self.notion.project_id),
        ];
        if !self.publish.dry_run {
            required.extend([
                ("twitter.app_key", &self.twitter.app_key),
                ("twitter.app_secret", &self.twitter.app_secret),
                ("twitter.access_token", &self.twitter.access_token),
                ("twitter.access_secret", &self.twitter.access_secret),
            ]);
        }

        let missing: Vec<String> = required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DripfeedError::MissingConfig(missing))
        }
    }
}
