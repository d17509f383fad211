//! End-to-end query pipeline: snapshot → validate → finalize → execute.
//!
//! This is the component an outer chat/transport layer consumes. It owns the
//! gate configuration, the schema registry, and the dispatcher, and applies
//! them in a fixed order for every candidate. Rejection is terminal for a
//! candidate; whether the caller asks the generator for a new attempt is
//! orchestration policy outside this crate.

use parking_lot::RwLock;
use prahari_commons::PrahariError;
use prahari_gate::GateConfig;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::registry::{CatalogSource, PgCatalog, SchemaRegistry};

pub struct QueryPipeline {
    gate: RwLock<Arc<GateConfig>>,
    registry: Arc<SchemaRegistry>,
    dispatcher: Dispatcher,
    query_timeout: Duration,
}

impl QueryPipeline {
    /// Build the pipeline against Postgres, discovering schema through the
    /// same pool the dispatcher executes on.
    pub fn new(config: &AppConfig, pool: PgPool) -> Self {
        let catalog = Arc::new(PgCatalog::new(pool.clone(), config.database.schema.clone()));
        Self::with_catalog(config, pool, catalog)
    }

    /// Build the pipeline with a custom catalog source.
    pub fn with_catalog(
        config: &AppConfig,
        pool: PgPool,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        let gate = Arc::new(config.gate_config());
        let statement_timeout = Duration::from_secs(config.database.statement_timeout_secs);
        let registry = Arc::new(SchemaRegistry::new(
            catalog,
            config.registry.table_names(),
            gate.schema_cache_ttl,
        ));
        Self {
            gate: RwLock::new(gate),
            registry,
            dispatcher: Dispatcher::new(pool, statement_timeout),
            query_timeout: statement_timeout,
        }
    }

    /// Connect a pool per the configured settings.
    pub async fn connect_pool(config: &AppConfig) -> Result<PgPool, PrahariError> {
        PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .map_err(|e| PrahariError::Config(format!("database connection failed: {}", e)))
    }

    /// The registry, exposed for the administrative surface (allow-list
    /// add/remove/list, snapshot fetch for prompt building).
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Current gate configuration.
    pub fn gate_config(&self) -> Arc<GateConfig> {
        Arc::clone(&self.gate.read())
    }

    /// Replace the gate configuration wholesale. The only supported way to
    /// change limits at runtime; field-level mutation is not offered.
    pub fn replace_gate_config(&self, config: GateConfig) {
        *self.gate.write() = Arc::new(config);
    }

    /// Validate and finalize a candidate without executing it.
    ///
    /// Returns the text the dispatcher would run. One verdict per candidate;
    /// a rejected candidate is never repaired here.
    pub async fn prepare(&self, candidate: &str) -> Result<String, PrahariError> {
        let gate = self.gate_config();
        let snapshot = self.registry.snapshot().await;
        prahari_gate::validate(candidate, snapshot.allowed_tables(), &gate)?;
        Ok(prahari_gate::finalize(candidate, gate.max_rows))
    }

    /// Full pipeline: validate, finalize, execute.
    pub async fn run(&self, candidate: &str) -> Result<Vec<JsonValue>, PrahariError> {
        let finalized = self.prepare(candidate).await?;
        log::debug!(target: "pipeline", "executing: {}", finalized);
        let rows = self
            .dispatcher
            .execute(&finalized, self.query_timeout)
            .await?;
        log::debug!(target: "pipeline", "query returned {} rows", rows.len());
        Ok(rows)
    }
}
