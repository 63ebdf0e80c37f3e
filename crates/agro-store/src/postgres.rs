//! # Postgres Executor
//!
//! [`Database`] over a `sqlx` connection pool. Each [`PgSession`] owns one
//! pooled connection, so `BEGIN` ... `COMMIT` sent through it form a real
//! transaction. Result rows are decoded column by column into
//! [`SqlValue`]s using the Postgres type name.
//!
//! A session dropped with its transaction still open (the operation future
//! was cancelled, or `ROLLBACK` failed) closes its connection rather than
//! returning it to the pool, so Postgres aborts the transaction.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};

use crate::error::DbError;
use crate::executor::{
    Database, QueryResult, Row, Session, SqlParam, SqlType, SqlValue, TransactionControl,
    TransactionState,
};

/// Pool sizing and limits.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Per-statement limit. `None` lets a statement run indefinitely.
    pub statement_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Connect the pool and run the embedded migrations.
pub async fn init_pool(url: &str, settings: &PoolSettings) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(url)
        .await?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Connected to PostgreSQL"
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

/// Pool-backed [`Database`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PgDatabase {
    pub fn new(pool: PgPool, statement_timeout: Option<Duration>) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn acquire(&self) -> Result<Box<dyn Session>, DbError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession {
            conn,
            statement_timeout: self.statement_timeout,
            state: TransactionState::default(),
        }))
    }
}

/// One checked-out connection.
pub struct PgSession {
    conn: PoolConnection<Postgres>,
    statement_timeout: Option<Duration>,
    state: TransactionState,
}

#[async_trait]
impl Session for PgSession {
    async fn query(&mut self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, DbError> {
        tracing::trace!(sql, params = params.len(), "executing statement");
        self.state.started();
        let run = execute(&mut *self.conn, sql, params);
        let outcome = match self.statement_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(outcome) => outcome,
                Err(_) => Err(DbError::Timeout(limit)),
            },
            None => run.await,
        };
        self.state.finished(sql, &outcome);
        outcome
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        if self.state.must_discard() {
            tracing::warn!(
                open = self.state.is_open(),
                "closing connection left mid-transaction"
            );
            self.conn.close_on_drop();
        }
    }
}

async fn execute(
    conn: &mut PgConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<QueryResult, DbError> {
    if params.is_empty() && TransactionControl::parse(sql).is_some() {
        sqlx::query(sql).execute(&mut *conn).await?;
        return Ok(QueryResult::empty());
    }

    let query = params
        .iter()
        .fold(sqlx::query(sql), |query, param| bind(query, param));
    let rows = query.fetch_all(&mut *conn).await?;
    let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
    Ok(QueryResult::from_rows(rows))
}

fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match param.clone() {
        SqlParam::Int(v) => query.bind(v),
        SqlParam::Float(v) => query.bind(v),
        SqlParam::Text(v) => query.bind(v),
        SqlParam::Bool(v) => query.bind(v),
        SqlParam::IntArray(v) => query.bind(v),
        SqlParam::TextArray(v) => query.bind(v),
        SqlParam::Null(SqlType::BigInt) => query.bind(None::<i64>),
        SqlParam::Null(SqlType::Double) => query.bind(None::<f64>),
        SqlParam::Null(SqlType::Text) => query.bind(None::<String>),
        SqlParam::Null(SqlType::Bool) => query.bind(None::<bool>),
    }
}

fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    let mut columns = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "INT8" => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::Int),
            "INT4" => row
                .try_get::<Option<i32>, _>(index)?
                .map(|v| SqlValue::Int(v.into())),
            "INT2" => row
                .try_get::<Option<i16>, _>(index)?
                .map(|v| SqlValue::Int(v.into())),
            "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(SqlValue::Float),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)?
                .map(|v| SqlValue::Float(v.into())),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text)
            }
            "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(SqlValue::Bool),
            "JSON" | "JSONB" => row
                .try_get::<Option<serde_json::Value>, _>(index)?
                .map(SqlValue::Json),
            other => {
                return Err(DbError::UnsupportedType {
                    column: column.name().to_string(),
                    type_name: other.to_string(),
                })
            }
        };
        columns.push((column.name().to_string(), value.unwrap_or(SqlValue::Null)));
    }
    Ok(Row::new(columns))
}
