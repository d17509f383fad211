//! Shared test support: an in-memory catalog source.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::RwLock;
use prahari::{CatalogSource, ColumnDef, ForeignKey, RegistryError, TableName};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Catalog source backed by in-memory definitions. Can be told to fail or to
/// respond slowly, and counts discovery round-trips.
pub struct FakeCatalog {
    tables: RwLock<BTreeMap<TableName, Vec<ColumnDef>>>,
    foreign_keys: RwLock<Vec<ForeignKey>>,
    fail: AtomicBool,
    delay: RwLock<Option<Duration>>,
    discoveries: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(table_names: &[&str]) -> Self {
        let mut tables = BTreeMap::new();
        for name in table_names {
            tables.insert(
                TableName::new(name),
                vec![
                    ColumnDef::new("id", "integer", false),
                    ColumnDef::new("name", "text", true),
                ],
            );
        }
        Self {
            tables: RwLock::new(tables),
            foreign_keys: RwLock::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay: RwLock::new(None),
            discoveries: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.write() = Some(delay);
    }

    pub fn discoveries(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), RegistryError> {
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RegistryError::refresh_failed("catalog unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_tables(&self) -> Result<Vec<TableName>, RegistryError> {
        self.gate().await?;
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.read().keys().cloned().collect())
    }

    async fn list_columns(&self, table: &TableName) -> Result<Vec<ColumnDef>, RegistryError> {
        self.gate().await?;
        Ok(self.tables.read().get(table).cloned().unwrap_or_default())
    }

    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKey>, RegistryError> {
        self.gate().await?;
        Ok(self.foreign_keys.read().clone())
    }
}
