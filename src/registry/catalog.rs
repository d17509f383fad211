//! Catalog access for schema discovery.
//!
//! The registry talks to the database catalog through [`CatalogSource`] so
//! discovery can be faked in tests. [`PgCatalog`] is the production
//! implementation over `information_schema` and `pg_enum`.

use async_trait::async_trait;
use prahari_commons::{ColumnDef, ForeignKey, RegistryError, TableName};
use sqlx::{PgPool, Row};

/// Catalog-query capability consumed during a schema refresh.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Base tables present in the configured schema.
    async fn list_tables(&self) -> Result<Vec<TableName>, RegistryError>;

    /// Columns of one table, with enumerated values resolved.
    async fn list_columns(&self, table: &TableName) -> Result<Vec<ColumnDef>, RegistryError>;

    /// Foreign-key edges within the configured schema.
    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKey>, RegistryError>;
}

/// Postgres catalog source backed by a read-only pool.
pub struct PgCatalog {
    pool: PgPool,
    schema: String,
}

impl PgCatalog {
    pub fn new(pool: PgPool, schema: String) -> Self {
        Self { pool, schema }
    }

    async fn enum_values(&self, udt_name: &str) -> Result<Vec<String>, RegistryError> {
        let rows = sqlx::query(
            "SELECT e.enumlabel \
             FROM pg_enum e \
             JOIN pg_type t ON e.enumtypid = t.oid \
             WHERE t.typname = $1 \
             ORDER BY e.enumsortorder",
        )
        .bind(udt_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map_err(|e| RegistryError::refresh_failed(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn list_tables(&self) -> Result<Vec<TableName>, RegistryError> {
        let rows = sqlx::query(
            "SELECT table_name \
             FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0)
                    .map(TableName::new)
                    .map_err(|e| RegistryError::refresh_failed(e.to_string()))
            })
            .collect()
    }

    async fn list_columns(&self, table: &TableName) -> Result<Vec<ColumnDef>, RegistryError> {
        let rows = sqlx::query(
            "SELECT c.column_name, c.data_type, c.is_nullable, c.udt_name \
             FROM information_schema.columns c \
             WHERE c.table_schema = $1 AND c.table_name = $2 \
             ORDER BY c.ordinal_position",
        )
        .bind(&self.schema)
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row
                .try_get("column_name")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
            let data_type: String = row
                .try_get("data_type")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
            let nullable: String = row
                .try_get("is_nullable")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

            let mut column = ColumnDef::new(name, data_type, nullable == "YES");

            // USER-DEFINED columns are usually enums; resolve their legal values
            if column.data_type == "USER-DEFINED" {
                let udt: String = row
                    .try_get("udt_name")
                    .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
                let values = self.enum_values(&udt).await?;
                if !values.is_empty() {
                    column = column.with_enum_values(values);
                }
            }

            columns.push(column);
        }
        Ok(columns)
    }

    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKey>, RegistryError> {
        let rows = sqlx::query(
            "SELECT \
                 tc.table_name AS source_table, \
                 kcu.column_name AS source_column, \
                 ccu.table_name AS target_table, \
                 ccu.column_name AS target_column \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
                 ON tc.constraint_name = kcu.constraint_name \
             JOIN information_schema.constraint_column_usage ccu \
                 ON ccu.constraint_name = tc.constraint_name \
             WHERE tc.constraint_type = 'FOREIGN KEY' \
               AND tc.table_schema = $1",
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

        let mut edges = Vec::with_capacity(rows.len());
        for row in &rows {
            let source_table: String = row
                .try_get("source_table")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
            let source_column: String = row
                .try_get("source_column")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
            let target_table: String = row
                .try_get("target_table")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;
            let target_column: String = row
                .try_get("target_column")
                .map_err(|e| RegistryError::refresh_failed(e.to_string()))?;

            edges.push(ForeignKey {
                source_table: TableName::new(source_table),
                source_column,
                target_table: TableName::new(target_table),
                target_column,
            });
        }
        Ok(edges)
    }
}
