//! Execution dispatcher: runs finalized queries under a hard timeout.
//!
//! The dispatcher consumes text that already passed the gate and the
//! finalizer; it adds the last line of defense against resource exhaustion.
//! Each call is an independent unit of work: the returned future is
//! cancel-safe, and dropping it mid-query closes the acquired connection
//! instead of returning it dirty, which cancels the statement server-side.

use prahari_commons::ExecutionError;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo};
use std::time::Duration;

/// Forwards finalized queries to the read-only pool.
pub struct Dispatcher {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Dispatcher {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Execute a finalized query, bounded client-side by `timeout` and
    /// server-side by `statement_timeout`.
    pub async fn execute(
        &self,
        sql: &str,
        timeout: Duration,
    ) -> Result<Vec<JsonValue>, ExecutionError> {
        match tokio::time::timeout(timeout, self.fetch_rows(sql)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(target: "dispatch", "query timed out after {:?}", timeout);
                Err(ExecutionError::Timeout {
                    elapsed_secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<JsonValue>, ExecutionError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ExecutionError::database(e.to_string()))?;

        // Server-side bound for the statement about to run.
        sqlx::query(&format!(
            "SET statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *conn)
        .await
        .map_err(|e| ExecutionError::database(e.to_string()))?;

        let fetched = sqlx::query(sql).fetch_all(&mut *conn).await;

        if let Err(e) = sqlx::query("SET statement_timeout = DEFAULT")
            .execute(&mut *conn)
            .await
        {
            log::debug!(target: "dispatch", "failed to reset statement_timeout: {}", e);
        }

        let rows = fetched.map_err(|e| self.normalize(e))?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    fn normalize(&self, err: sqlx::Error) -> ExecutionError {
        // 57014 = query_canceled: the server-side statement_timeout fired
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("57014") {
                return ExecutionError::Timeout {
                    elapsed_secs: self.statement_timeout.as_secs(),
                };
            }
        }
        ExecutionError::database(err.to_string())
    }
}

/// Decode one row into a JSON object, column by column. Types without a
/// direct mapping fall back to their text form, then to null.
fn row_to_json(row: &PgRow) -> JsonValue {
    let mut obj = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        let value: JsonValue = match col.type_info().name() {
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<String, _>(i)
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
            "INT2" => row
                .try_get::<i16, _>(i)
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::Null),
            "INT4" | "SERIAL" => row
                .try_get::<i32, _>(i)
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::Null),
            "INT8" | "BIGSERIAL" => row
                .try_get::<i64, _>(i)
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::Null),
            "FLOAT4" => row
                .try_get::<f32, _>(i)
                .ok()
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            "FLOAT8" => row
                .try_get::<f64, _>(i)
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            "BOOL" => row
                .try_get::<bool, _>(i)
                .map(JsonValue::Bool)
                .unwrap_or(JsonValue::Null),
            "TIMESTAMP" => row
                .try_get::<chrono::NaiveDateTime, _>(i)
                .map(|v| JsonValue::String(v.to_string()))
                .unwrap_or(JsonValue::Null),
            "TIMESTAMPTZ" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(i)
                .map(|v| JsonValue::String(v.to_rfc3339()))
                .unwrap_or(JsonValue::Null),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(i)
                .map(|v| JsonValue::String(v.to_string()))
                .unwrap_or(JsonValue::Null),
            _ => row
                .try_get::<String, _>(i)
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
        };
        obj.insert(col.name().to_string(), value);
    }
    JsonValue::Object(obj)
}
