use anyhow::Result;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{Pool, Postgres};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::models::{Alert, NewAlert};

#[cfg(test)]
pub mod memory;
pub mod queries;
pub mod store;

pub use store::{AlertSession, AlertStore, StoreError};

pub type DbPool = Pool<Postgres>;

/// Builds the pool without connecting. Connections open on first acquire.
pub fn init_pool(config: &DatabaseConfig) -> DbPool {
    let ssl_mode = if config.encrypt {
        PgSslMode::Require
    } else {
        PgSslMode::Prefer
    };

    let options = PgConnectOptions::new()
        .host(&config.server)
        .port(config.port)
        .database(&config.database)
        .username(&config.username)
        .password(&config.password)
        .ssl_mode(ssl_mode);

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy_with(options)
}

pub async fn init_schema(pool: &DbPool) -> Result<()> {
    sqlx::query(queries::CREATE_ALERTS_TABLE)
        .execute(pool)
        .await?;
    info!("Alerts table is in place");
    Ok(())
}

#[derive(Clone)]
pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AlertStore for PgAlertStore {
    type Session = PgAlertSession;

    async fn open(&self) -> Result<PgAlertSession, StoreError> {
        let conn = self.pool.acquire().await?;
        debug!("Acquired database connection");
        Ok(PgAlertSession { conn })
    }
}

pub struct PgAlertSession {
    conn: PoolConnection<Postgres>,
}

impl AlertSession for PgAlertSession {
    async fn fetch_alert(&mut self, id: i32) -> Result<Option<Alert>, StoreError> {
        let alert = sqlx::query_as::<_, Alert>(queries::SELECT_ALERT_BY_ID)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(alert)
    }

    async fn list_alerts(&mut self) -> Result<Vec<Alert>, StoreError> {
        let alerts = sqlx::query_as::<_, Alert>(queries::SELECT_ALERTS_BY_PRIORITY)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(alerts)
    }

    async fn insert_alert(&mut self, alert: &NewAlert) -> Result<i32, StoreError> {
        let id = sqlx::query_scalar::<_, i32>(queries::INSERT_ALERT)
            .bind(&alert.message)
            .bind(alert.latitude)
            .bind(alert.longitude)
            .bind(alert.priority)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(id)
    }

    async fn delete_alert(&mut self, id: i32) -> Result<u64, StoreError> {
        let result = sqlx::query(queries::DELETE_ALERT_BY_ID)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all_alerts(&mut self) -> Result<u64, StoreError> {
        let result = sqlx::query(queries::DELETE_ALL_ALERTS)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected())
    }
}

impl Drop for PgAlertSession {
    fn drop(&mut self) {
        // The pooled connection goes back to the pool right after this.
        debug!("Released database connection");
    }
}
