//! PostgreSQL gateway backed by a `sqlx` connection pool.

use crate::domain::model::{Visitor, VISITORS};
use crate::storage::{GatewayError, VisitorGateway, VisitorSession};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

#[derive(Clone)]
pub struct PgVisitorGateway {
    pool: PgPool,
}

impl PgVisitorGateway {
    /// Connects the pool and makes sure the `visitors` table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let gateway = Self::from_pool(pool);
        gateway.ensure_schema().await?;
        Ok(gateway)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the table and its indexes when absent. Safe to run on every start-up.
    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        sqlx::query(&VISITORS.create_table_sql())
            .execute(&self.pool)
            .await?;
        for statement in VISITORS.create_index_sql() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        info!(
            event = "schema_ready",
            table = VISITORS.table_name,
            "visitor table ensured"
        );
        Ok(())
    }
}

#[async_trait]
impl VisitorGateway for PgVisitorGateway {
    async fn open_session(&self) -> Result<Box<dyn VisitorSession>, GatewayError> {
        let tx = self.pool.begin().await?;
        debug!("Creating a new database session");
        Ok(Box::new(PgVisitorSession { tx: Some(tx) }))
    }
}

/// One pooled connection holding one open transaction.
///
/// `tx` is `None` once the session has been committed or rolled back.
pub struct PgVisitorSession {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgVisitorSession {
    fn tx(&mut self) -> Result<&mut Transaction<'static, Postgres>, GatewayError> {
        self.tx
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("database session already finished").into())
    }
}

#[async_trait]
impl VisitorSession for PgVisitorSession {
    async fn list_all(&mut self) -> Result<Vec<Visitor>, GatewayError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id ASC",
            VISITORS.column_list(),
            VISITORS.table_name
        );
        let tx = self.tx()?;
        let visitors = sqlx::query_as::<_, Visitor>(&sql)
            .fetch_all(&mut **tx)
            .await?;
        Ok(visitors)
    }

    async fn insert(&mut self, name: &str) -> Result<Visitor, GatewayError> {
        let sql = format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING {}",
            VISITORS.table_name,
            VISITORS.column_list()
        );
        let tx = self.tx()?;
        let visitor = sqlx::query_as::<_, Visitor>(&sql)
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
        Ok(visitor)
    }

    async fn commit(&mut self) -> Result<(), GatewayError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<(), GatewayError> {
        match self.tx.take() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Ok(()),
        }
    }
}

impl Drop for PgVisitorSession {
    fn drop(&mut self) {
        // An unfinished transaction is rolled back by sqlx when dropped.
        debug!(
            pending = self.tx.is_some(),
            "Closing the database session"
        );
    }
}
