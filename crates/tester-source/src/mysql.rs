use std::{future::Future, time::Duration};

use async_trait::async_trait;
use sqlx::{MySqlPool, mysql::MySqlPoolOptions};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use tester_core::{DesiredSetSource, SourceError};
use tester_model::DesiredSet;

use crate::{config::MySqlSourceConfig, errors::MySqlSourceError};

const SELECT_TESTS: &str = "SELECT test FROM pod_test WHERE pod_uuid = ?";

/// Reads the desired workloads of one pod from the `pod_test` table.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
    pod_uuid: Uuid,
}

impl MySqlSource {
    /// Builds the pool and waits until the database answers.
    pub async fn connect(cfg: MySqlSourceConfig) -> Result<Self, MySqlSourceError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .connect_lazy(&cfg.url)
            .map_err(MySqlSourceError::Config)?;

        wait_ready(cfg.ready_attempts, cfg.ready_delay, || ping(&pool)).await?;
        info!(pod = %cfg.pod_uuid, "database ready");

        Ok(Self {
            pool,
            pod_uuid: cfg.pod_uuid,
        })
    }

    pub fn pod_uuid(&self) -> Uuid {
        self.pod_uuid
    }
}

#[async_trait]
impl DesiredSetSource for MySqlSource {
    #[instrument(level = "debug", skip(self), fields(pod = %self.pod_uuid))]
    async fn fetch(&self) -> Result<DesiredSet, SourceError> {
        // `pod_uuid` is BINARY(16); sqlx encodes `Uuid` as raw bytes for MySQL.
        let tests: Vec<String> = sqlx::query_scalar::<_, String>(SELECT_TESTS)
            .bind(self.pod_uuid)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SourceError::unavailable("select pod_test", e.to_string()))?;

        debug!(count = tests.len(), "desired workloads fetched");
        Ok(tests.into_iter().collect())
    }
}

async fn ping(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

async fn wait_ready<F, Fut>(attempts: u32, delay: Duration, mut ping: F) -> Result<(), MySqlSourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), sqlx::Error>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match ping().await {
            Ok(()) => return Ok(()),
            Err(last) if attempt >= attempts => {
                return Err(MySqlSourceError::NotReady { attempts, last });
            }
            Err(e) => {
                info!(attempt, error = %e, "waiting for database to be ready");
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn wait_ready_retries_until_ping_succeeds() {
        let calls = AtomicU32::new(0);
        let res = wait_ready(10, Duration::from_secs(2), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(res.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_ready_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let res = wait_ready(3, Duration::from_secs(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::PoolTimedOut) }
        })
        .await;

        assert!(matches!(res, Err(MySqlSourceError::NotReady { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_url_is_a_config_error() {
        let cfg = MySqlSourceConfig::new("definitely not a url", Uuid::nil());
        let res = MySqlSource::connect(cfg).await;
        assert!(matches!(res, Err(MySqlSourceError::Config(_))));
    }

    #[tokio::test]
    async fn fetch_against_unreachable_database_is_unavailable() {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy("mysql://u:p@127.0.0.1:1/db")
            .unwrap();
        let source = MySqlSource {
            pool,
            pod_uuid: Uuid::nil(),
        };

        let res = source.fetch().await;
        assert!(
            matches!(
                res,
                Err(SourceError::Unavailable { operation: "select pod_test", .. })
            ),
            "got {res:?}"
        );
    }

    #[test]
    fn defaults_follow_database_readiness_policy() {
        let cfg = MySqlSourceConfig::new("mysql://testing:testing@db:3306/testing", Uuid::nil());
        assert_eq!(cfg.ready_attempts, 10);
        assert_eq!(cfg.ready_delay, Duration::from_secs(2));
    }
}
