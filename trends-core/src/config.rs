use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_PATH_VAR: &str = "REDDIT_TRENDS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const REDDIT_CLIENT_ID_VAR: &str = "REDDIT_CLIENT_ID";
pub const REDDIT_CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";
pub const REDDIT_USER_AGENT_VAR: &str = "REDDIT_USER_AGENT";

/// Settings for one census run. Built once and handed to every component.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TrendsConfig {
    pub region: String,
    pub secret_name: String,
    pub bucket: String,
    pub keywords_key: String,
    pub subreddit: String,
    #[serde(default = "default_post_limit")]
    pub post_limit: usize,
    #[serde(default = "default_initial_comment_fetch")]
    pub initial_comment_fetch: usize,
    #[serde(default = "default_top_comments_limit")]
    pub top_comments_limit: usize,
}

fn default_post_limit() -> usize {
    100
}

fn default_initial_comment_fetch() -> usize {
    50
}

fn default_top_comments_limit() -> usize {
    10
}

impl TrendsConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: TrendsConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reads the file named by `REDDIT_TRENDS_CONFIG`, or `config.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        tracing::debug!("Loading configuration from {}", path);
        Self::from_file(Path::new(&path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("region", &self.region),
            ("secret_name", &self.secret_name),
            ("bucket", &self.bucket),
            ("keywords_key", &self.keywords_key),
            ("subreddit", &self.subreddit),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        for (field, value) in [
            ("post_limit", self.post_limit),
            ("initial_comment_fetch", self.initial_comment_fetch),
            ("top_comments_limit", self.top_comments_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: name.to_string(),
                })
        };

        Ok(Self {
            client_id: require(REDDIT_CLIENT_ID_VAR)?,
            client_secret: require(REDDIT_CLIENT_SECRET_VAR)?,
            user_agent: require(REDDIT_USER_AGENT_VAR)?,
        })
    }
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
