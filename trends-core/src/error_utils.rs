use crate::error::*;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Where in a run a failure originated. Only `Upstream` failures are ever
/// absorbed, and only at the per-post comment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Persistence,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Persistence => "persistence",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(name)
    }
}

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn category(&self) -> ErrorCategory;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Database(e) => {
                error!("Database error details: {:?}", e);
            }
            CoreError::Storage(e) => {
                error!("Object storage error details: {:?}", e);
            }
            CoreError::Secrets(e) => {
                error!("Secrets error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        match self {
            CoreError::Config(_) | CoreError::Secrets(_) => ErrorCategory::Configuration,
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. }) => {
                ErrorCategory::Configuration
            }
            CoreError::RedditApi(_)
            | CoreError::Storage(_)
            | CoreError::Csv(_)
            | CoreError::Network(_) => ErrorCategory::Upstream,
            CoreError::Database(_) => ErrorCategory::Persistence,
            CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Internal { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Database(e) => e.user_friendly_message(),
            CoreError::Storage(e) => e.user_friendly_message(),
            CoreError::Secrets(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error while talking to an upstream service.".to_string()
            }
            CoreError::Csv(_) => "The keyword file could not be parsed as CSV.".to_string(),
            _ => "An unexpected error occurred during the trend run.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Database(_) => "DATABASE".to_string(),
            CoreError::Storage(_) => "STORAGE".to_string(),
            CoreError::Secrets(_) => "SECRETS".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Csv(_) => "KEYWORD_FILE".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        match self {
            RedditApiError::AuthenticationFailed { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Upstream,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Check the client id and secret.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Reddit rejected the request for exceeding its rate limit (retry after {} seconds).",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => {
                format!("Access denied to {}.", resource)
            }
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::PostNotFound { post_id } => {
                format!("Post '{}' could not be found.", post_id)
            }
            RedditApiError::InvalidToken => {
                "Reddit rejected the access token.".to_string()
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            _ => "Reddit API error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::PostNotFound { .. } => "REDDIT_POST_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for StorageError {
    fn log_error(&self) -> &Self {
        error!("StorageError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StorageError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Upstream
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StorageError::ObjectNotFound { bucket, key } => {
                format!("Keyword file s3://{}/{} does not exist.", bucket, key)
            }
            StorageError::InvalidEncoding { .. } => {
                "Keyword file is not valid UTF-8 text.".to_string()
            }
            _ => "Object storage could not be read.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            StorageError::ObjectNotFound { .. } => "STORAGE_OBJECT_NOT_FOUND".to_string(),
            StorageError::ReadFailed { .. } => "STORAGE_READ_FAILED".to_string(),
            StorageError::ListFailed { .. } => "STORAGE_LIST_FAILED".to_string(),
            StorageError::InvalidEncoding { .. } => "STORAGE_INVALID_ENCODING".to_string(),
        }
    }
}

impl ErrorExt for SecretsError {
    fn log_error(&self) -> &Self {
        error!("SecretsError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("SecretsError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }

    fn user_friendly_message(&self) -> String {
        match self {
            SecretsError::NotFound { name } => format!("Secret '{}' does not exist.", name),
            SecretsError::Malformed { name, .. } | SecretsError::MissingValue { name } => {
                format!("Secret '{}' does not hold valid database credentials.", name)
            }
            SecretsError::RetrievalFailed { name, .. } => {
                format!("Secret '{}' could not be retrieved.", name)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            SecretsError::NotFound { .. } => "SECRET_NOT_FOUND".to_string(),
            SecretsError::RetrievalFailed { .. } => "SECRET_RETRIEVAL_FAILED".to_string(),
            SecretsError::MissingValue { .. } => "SECRET_MISSING_VALUE".to_string(),
            SecretsError::Malformed { .. } => "SECRET_MALFORMED".to_string(),
        }
    }
}

impl ErrorExt for DatabaseError {
    fn log_error(&self) -> &Self {
        error!("DatabaseError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DatabaseError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Persistence
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => {
                "Database connection failed.".to_string()
            }
            DatabaseError::SchemaSetupFailed { .. } => {
                "Database session could not be prepared.".to_string()
            }
            _ => "Database error occurred while saving the snapshot.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            DatabaseError::ConnectionFailed { .. } => "DB_CONNECTION_FAILED".to_string(),
            DatabaseError::SchemaSetupFailed { .. } => "DB_SCHEMA_SETUP_FAILED".to_string(),
            DatabaseError::QueryFailed { .. } => "DB_QUERY_FAILED".to_string(),
            DatabaseError::TransactionFailed { .. } => "DB_TRANSACTION_FAILED".to_string(),
            DatabaseError::Sql(_) => "DB_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => "Configuration file is not valid TOML.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    /// Logs a run-ending failure with its code, category and message.
    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("Error category: {}", error.category());
        info!("User message: {}", error.user_friendly_message());
    }

    /// Logs a failure the run absorbs.
    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
        debug!("Error code: {}", error.error_code());
    }
}
