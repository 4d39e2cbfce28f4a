use crate::config::{self, DbConfig};
use crate::schema;
use anyhow::{bail, Context, Result};
use sqlx::any::{AnyPoolOptions, AnyQueryResult};
use sqlx::{AnyPool, Row};
use std::time::Duration;
use tracing::{debug, info};

/// Handle to the target store.
///
/// Built once by the orchestrator and handed to every component; cloning
/// shares the underlying pool.
#[derive(Clone)]
pub struct Store {
    pool: AnyPool,
}

impl Store {
    /// Opens the pool and checks it with a round trip, retrying a few times.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let url = cfg.connection_url();
        let max_retries = config::CONNECT_MAX_RETRIES;
        let delay = Duration::from_secs(config::CONNECT_RETRY_DELAY_SECS);

        for attempt in 1..=max_retries {
            let pool = AnyPoolOptions::new()
                .max_connections(cfg.pool_size.max(1))
                .acquire_timeout(Duration::from_secs(config::ACQUIRE_TIMEOUT_SECS))
                .connect(&url)
                .await;

            let err = match pool {
                Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                    Ok(_) => return Ok(Self { pool }),
                    Err(e) => {
                        pool.close().await;
                        e
                    }
                },
                Err(e) => e,
            };

            if attempt < max_retries {
                info!(attempt, error = %err, "Cannot reach {}, retrying...", cfg.display_target());
                tokio::time::sleep(delay).await;
            } else {
                return Err(err).context(format!(
                    "Cannot connect to {} after {max_retries} attempts",
                    cfg.display_target()
                ));
            }
        }

        bail!(
            "Cannot connect to {} after {max_retries} attempts",
            cfg.display_target()
        );
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Creates every inventory table that does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        for ddl in schema::CREATE_TABLES {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute: {ddl}"))?;
        }
        debug!(tables = schema::CREATE_TABLES.len(), "Schema ensured");
        Ok(())
    }

    /// `SELECT COUNT(*)` over a table, optionally narrowed by a WHERE clause.
    pub async fn count(&self, table: &str, scope: Option<&str>) -> Result<i64> {
        let sql = match scope {
            Some(scope) => format!("SELECT COUNT(*) AS cnt FROM {table} WHERE {scope}"),
            None => format!("SELECT COUNT(*) AS cnt FROM {table}"),
        };
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to execute count query: {sql}"))?;
        let count: i64 = row.try_get("cnt").context("Missing 'cnt' field in result")?;
        Ok(count)
    }

    pub async fn execute(&self, sql: &str) -> Result<AnyQueryResult> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute: {sql}"))
    }

    /// Releases every pooled connection. Safe to call more than once.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use tempfile::TempDir;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;
        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        assert_eq!(store.count("vehicle", None).await.unwrap(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn scoped_count() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;
        store.ensure_schema().await.unwrap();
        store
            .execute("INSERT INTO amenity (amenity_id, name) VALUES (X'00000000000000000000000000000001', 'Pool')")
            .await
            .unwrap();
        store
            .execute("INSERT INTO amenity (amenity_id, name) VALUES (X'00000000000000000000000000000002', 'Spa')")
            .await
            .unwrap();
        assert_eq!(store.count("amenity", None).await.unwrap(), 2);
        assert_eq!(store.count("amenity", Some("name = 'Spa'")).await.unwrap(), 1);
        store.close().await;
    }

    #[tokio::test]
    async fn count_on_missing_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = temp_store(&dir).await;
        let err = store.count("no_such_table", None).await.unwrap_err();
        assert!(err.to_string().contains("count query"));
        store.close().await;
    }
}
