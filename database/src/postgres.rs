use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};
use trends_core::{
    CoreError, DatabaseError, SnapshotRecord, SnapshotStore, StoreConnector, WarehouseCredentials,
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS REDDIT_TRENDS (
    TREND_ID UUID PRIMARY KEY,
    SNAPSHOT_TIME TIMESTAMPTZ NOT NULL,
    SNAPSHOT_DATE DATE NOT NULL,
    KEYWORD TEXT NOT NULL,
    MENTION_COUNT BIGINT NOT NULL
)";

const COUNT_FOR_DATE: &str = "SELECT COUNT(*) FROM REDDIT_TRENDS WHERE SNAPSHOT_DATE = $1";

const INSERT_PREFIX: &str =
    "INSERT INTO REDDIT_TRENDS (TREND_ID, SNAPSHOT_TIME, SNAPSHOT_DATE, KEYWORD, MENTION_COUNT) ";

/// Rows per INSERT statement; five binds per row keeps well under the
/// Postgres limit of 65535 parameters.
const INSERT_CHUNK_ROWS: usize = 1000;

/// Builds connection options from stored credentials. `account` is the
/// server address as `host` or `host:port`; `schema` becomes the session's
/// search path and `warehouse` its application name.
pub fn connect_options(credentials: &WarehouseCredentials) -> Result<PgConnectOptions, CoreError> {
    let (host, port) = match credentials.account.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| DatabaseError::ConnectionFailed {
                reason: format!("invalid port in account '{}'", credentials.account),
            })?;
            (host, Some(port))
        }
        None => (credentials.account.as_str(), None),
    };

    let mut options = PgConnectOptions::new()
        .host(host)
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.database)
        .application_name(&credentials.warehouse)
        .options([("search_path", credentials.schema.as_str())]);
    if let Some(port) = port {
        options = options.port(port);
    }
    Ok(options)
}

#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub async fn connect(credentials: &WarehouseCredentials) -> Result<Self, CoreError> {
        info!(
            "Connecting to database {} on {}",
            credentials.database, credentials.account
        );

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_options(credentials)?)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), CoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|source| DatabaseError::SchemaSetupFailed {
                statement: "CREATE TABLE REDDIT_TRENDS".to_string(),
                source,
            })?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn count_for_date(&self, date: NaiveDate) -> Result<i64, CoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_FOR_DATE)
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;
        debug!("{} existing rows for {}", count, date);
        Ok(count)
    }

    async fn insert_snapshot(&self, records: &[SnapshotRecord]) -> Result<(), CoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed {
                reason: e.to_string(),
            })?;

        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder = QueryBuilder::<Postgres>::new(INSERT_PREFIX);
            builder.push_values(chunk.iter(), |mut row, record| {
                row.push_bind(record.trend_id)
                    .push_bind(record.snapshot_time)
                    .push_bind(record.snapshot_date)
                    .push_bind(record.keyword.clone())
                    .push_bind(record.mention_count);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|source| DatabaseError::QueryFailed {
                    query: "INSERT INTO REDDIT_TRENDS".to_string(),
                    source,
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Database connection closed");
    }
}

/// Opens a [`PgSnapshotStore`] per run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait]
impl StoreConnector for PgConnector {
    async fn connect(
        &self,
        credentials: &WarehouseCredentials,
    ) -> Result<Box<dyn SnapshotStore>, CoreError> {
        Ok(Box::new(PgSnapshotStore::connect(credentials).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(account: &str) -> WarehouseCredentials {
        WarehouseCredentials {
            user: "loader".to_string(),
            password: "pw".to_string(),
            account: account.to_string(),
            warehouse: "analytics".to_string(),
            database: "trends".to_string(),
            schema: "reddit".to_string(),
        }
    }

    #[test]
    fn test_connect_options_with_port() {
        let options = connect_options(&credentials("db.internal:6543")).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "loader");
        assert_eq!(options.get_database(), Some("trends"));
    }

    #[test]
    fn test_connect_options_default_port() {
        let options = connect_options(&credentials("db.internal")).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
    }

    #[tokio::test]
    async fn test_schema_failure_carries_driver_error() {
        // Nothing listens on port 1.
        let options = connect_options(&credentials("127.0.0.1:1")).unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy_with(options);
        let store = PgSnapshotStore::from_pool(pool);

        match store.ensure_schema().await {
            Err(CoreError::Database(error @ DatabaseError::SchemaSetupFailed { .. })) => {
                assert!(std::error::Error::source(&error).is_some());
                let message = error.to_string();
                assert!(message.starts_with("Schema setup failed (CREATE TABLE REDDIT_TRENDS): "));
                assert!(message.len() > "Schema setup failed (CREATE TABLE REDDIT_TRENDS): ".len());
            }
            other => panic!("expected SchemaSetupFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_connect_options_rejects_bad_port() {
        let result = connect_options(&credentials("db.internal:abc"));
        assert!(matches!(
            result,
            Err(CoreError::Database(DatabaseError::ConnectionFailed { .. }))
        ));
    }
}
