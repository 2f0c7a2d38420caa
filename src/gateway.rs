//! Persistence gateway: a shared SQLite pool handing out one transaction scope per unit of work.

use crate::error::AppError;
use crate::migration::apply_migrations;
use crate::schema::{catalog, ColumnType, EntityDef, OrderTerm};
use crate::settings::Settings;
use crate::sql::{self, QueryBuf, SqliteBindValue};
use crate::transfer::Patch;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Cloneable handle on the database; create scopes from it concurrently.
#[derive(Clone, Debug)]
pub struct Gateway {
    pool: SqlitePool,
}

impl Gateway {
    /// Open (creating if missing) the database named by the settings, in WAL mode with foreign keys on.
    pub async fn connect(settings: &Settings) -> Result<Self, AppError> {
        let mut options = SqliteConnectOptions::from_str(&settings.database_url)?
            .create_if_missing(true)
            .busy_timeout(settings.busy_timeout)
            .foreign_keys(true);
        if !settings.database_url.contains(":memory:") {
            options = options.journal_mode(SqliteJournalMode::Wal);
            if let Some(dir) = options.get_filename().parent() {
                if !dir.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(dir).await?;
                }
            }
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?;
        tracing::info!(url = %settings.database_url, "database connected");
        Ok(Gateway { pool })
    }

    /// Private in-memory database with the schema applied. One connection that never expires,
    /// so the data lives as long as the gateway.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        apply_migrations(&pool, catalog()).await?;
        Ok(Gateway { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work. Dropping the scope without `commit` rolls everything back.
    pub async fn begin(&self) -> Result<Scope, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Scope { tx })
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One transaction. Reads see the scope's own uncommitted writes.
pub struct Scope {
    tx: Transaction<'static, Sqlite>,
}

impl Scope {
    pub async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }

    pub async fn get_by_id(&mut self, entity: &EntityDef, id: i64) -> Result<Option<Value>, AppError> {
        let mut q = sql::select_by_id(entity);
        q.params.push(Value::from(id));
        self.fetch_optional(entity, &q).await
    }

    pub async fn exists(&mut self, entity: &EntityDef, id: i64) -> Result<bool, AppError> {
        let mut q = sql::exists(entity);
        q.params.push(Value::from(id));
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(&q).fetch_optional(&mut *self.tx).await?;
        Ok(row.is_some())
    }

    pub async fn find(
        &mut self,
        entity: &EntityDef,
        filters: &[(String, Value)],
        order: &[OrderTerm],
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_list(entity, filters, order);
        self.fetch_all(entity, &q).await
    }

    /// Rows whose value in any of `columns` equals `value`, in the entity's list order.
    pub async fn find_any(&mut self, entity: &EntityDef, columns: &[&str], value: i64) -> Result<Vec<Value>, AppError> {
        let q = sql::select_where_any(entity, columns, Value::from(value), entity.order);
        self.fetch_all(entity, &q).await
    }

    pub async fn insert(&mut self, entity: &EntityDef, body: &BTreeMap<String, Value>) -> Result<Value, AppError> {
        let q = sql::insert(entity, body);
        self.fetch_optional(entity, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Apply the supplied fields; `None` when no row has this id.
    pub async fn update(
        &mut self,
        entity: &EntityDef,
        id: i64,
        patch: &Patch,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update(entity, id, patch);
        self.fetch_optional(entity, &q).await
    }

    /// Remove one row; `false` when no row has this id.
    pub async fn delete(&mut self, entity: &EntityDef, id: i64) -> Result<bool, AppError> {
        let mut q = sql::delete(entity);
        q.params.push(Value::from(id));
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(&q).fetch_optional(&mut *self.tx).await?;
        Ok(row.is_some())
    }

    async fn fetch_optional(&mut self, entity: &EntityDef, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(&mut *self.tx).await?;
        row.map(|r| row_to_json(entity, &r)).transpose()
    }

    async fn fetch_all(&mut self, entity: &EntityDef, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(q).fetch_all(&mut *self.tx).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(SqliteBindValue::from_json(p));
    }
    query
}

/// Project a row into the entity's JSON shape, decoding each column by its declared type.
fn row_to_json(entity: &EntityDef, row: &SqliteRow) -> Result<Value, AppError> {
    let mut map = Map::new();
    for col in entity.columns {
        let name = col.name;
        let v = match col.ty {
            ColumnType::Int => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            ColumnType::Real => row.try_get::<Option<f64>, _>(name)?.map(Value::from),
            ColumnType::Bool => row.try_get::<Option<bool>, _>(name)?.map(Value::from),
            ColumnType::Text | ColumnType::Date | ColumnType::DateTime => {
                row.try_get::<Option<String>, _>(name)?.map(Value::from)
            }
        };
        map.insert(name.to_string(), v.unwrap_or(Value::Null));
    }
    Ok(Value::Object(map))
}
