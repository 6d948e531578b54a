use async_trait::async_trait;
use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, Connection, PgPool, Postgres};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::DbConfig;
use crate::users::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unique constraint violated ({})", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Classifies a failed write: unique-index violations get their own kind.
    fn from_write(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::UniqueViolation {
                constraint: db.constraint().map(str::to_owned),
            },
            _ => StoreError::Other(e.to_string()),
        }
    }
}

/// Hands out one connection-scoped session per request.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn UserSession>, StoreError>;
}

/// A checked-out store connection. Dropping it releases the connection.
#[async_trait]
pub trait UserSession: Send {
    /// Inserts the row in its own transaction and returns it with its new id.
    /// Nothing is left behind when this fails.
    async fn insert_user(&mut self, new_user: &NewUser) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool that only dials the database on first checkout, so the
    /// server comes up even while the store is still starting.
    pub fn connect_lazy(cfg: &DbConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout())
            .connect_lazy_with(cfg.connect_options());
        Self::new(pool)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn acquire(&self) -> Result<Box<dyn UserSession>, StoreError> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        debug!("store connection acquired");
        Ok(Box::new(PgUserSession { conn }))
    }
}

pub struct PgUserSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl UserSession for PgUserSession {
    async fn insert_user(&mut self, new_user: &NewUser) -> Result<User, StoreError> {
        let mut tx = self.conn.begin().await.map_err(StoreError::from_write)?;

        // id is widened so SERIAL and BIGSERIAL keys both decode
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id::BIGINT AS id, username, email, password_hash
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(user) => {
                tx.commit().await.map_err(StoreError::from_write)?;
                Ok(user)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(StoreError::from_write(e))
            }
        }
    }
}
