//! Database bootstrap: pooled sea-orm connection and startup migrations.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Pool tuning knobs, decoupled from the full application config so tests can
/// connect with nothing but a URL.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for PoolSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

impl PoolSettings {
    /// SQLite permits a single writer at a time, and a transaction that starts
    /// with a read and later upgrades to a write gets SQLITE_BUSY immediately
    /// when another connection is writing; the busy timeout never applies to
    /// that upgrade. A single-connection pool serializes transactions at
    /// acquire time, so concurrent callers queue instead of erroring.
    fn adjusted_for(&self, database_url: &str) -> Self {
        if database_url.trim_start().starts_with("sqlite") {
            Self {
                max_connections: 1,
                min_connections: 1,
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }
}

/// Connects with default pool settings.
pub async fn connect(database_url: &str) -> Result<DbPool, ServiceError> {
    connect_with_settings(database_url, &PoolSettings::default()).await
}

/// Connects using the pool tuning carried by the application config.
pub async fn connect_from_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    connect_with_settings(&cfg.database_url, &cfg.into()).await
}

pub async fn connect_with_settings(
    database_url: &str,
    settings: &PoolSettings,
) -> Result<DbPool, ServiceError> {
    let settings = settings.adjusted_for(database_url);
    debug!("Configuring database pool: {:?}", settings);

    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .connect_timeout(settings.connect_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .idle_timeout(settings.idle_timeout)
        .sqlx_logging(true);

    let pool = Database::connect(opt).await?;
    info!(
        max_connections = settings.max_connections,
        "database connection pool established"
    );

    Ok(pool)
}

/// Applies all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    Migrator::up(pool, None).await?;

    info!(elapsed = ?start.elapsed(), "database migrations applied");
    Ok(())
}

/// Checks that the pool can still reach the database.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    pool.ping().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_pool_is_capped_to_one_connection() {
        let settings = PoolSettings::default().adjusted_for("sqlite://warehouse.db?mode=rwc");
        assert_eq!(settings.max_connections, 1);
        assert_eq!(settings.min_connections, 1);
    }

    #[test]
    fn postgres_pool_keeps_configured_size() {
        let settings = PoolSettings {
            max_connections: 20,
            ..PoolSettings::default()
        }
        .adjusted_for("postgres://localhost/warehouse");
        assert_eq!(settings.max_connections, 20);
    }

    #[tokio::test]
    async fn connect_and_migrate_in_memory() {
        let pool = connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should connect");
        assert!(run_migrations(&pool).await.is_ok());
        assert!(check_connection(&pool).await.is_ok());
    }
}
