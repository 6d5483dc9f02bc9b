use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keyword file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Post not found: {post_id}")]
    PostNotFound { post_id: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Failed to read s3://{bucket}/{key}: {reason}")]
    ReadFailed {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Failed to list s3://{bucket}/{prefix}: {reason}")]
    ListFailed {
        bucket: String,
        prefix: String,
        reason: String,
    },

    #[error("Object s3://{bucket}/{key} is not valid UTF-8")]
    InvalidEncoding { bucket: String, key: String },
}

#[derive(Error, Debug)]
pub enum SecretsError {
    #[error("Secret not found: {name}")]
    NotFound { name: String },

    #[error("Secret {name} could not be retrieved: {reason}")]
    RetrievalFailed { name: String, reason: String },

    #[error("Secret {name} has no string value")]
    MissingValue { name: String },

    #[error("Secret {name} is malformed: {reason}")]
    Malformed { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Schema setup failed ({statement}): {source}")]
    SchemaSetupFailed {
        statement: String,
        source: sqlx::Error,
    },

    #[error("Query execution failed ({query}): {source}")]
    QueryFailed { query: String, source: sqlx::Error },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
