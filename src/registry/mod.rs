//! Schema registry: discovers and caches table/column metadata and owns the
//! table allow-list.
//!
//! The registry shields request handling from per-request catalog queries.
//! A warm snapshot is read lock-free (one `RwLock` read of an `Arc`); a
//! cache miss refreshes under a single-flight guard so concurrent misses
//! coalesce onto one catalog round-trip. Snapshots are installed by atomic
//! replacement — readers of the previous snapshot keep a consistent view and
//! never observe a partially updated allow-list.
//!
//! Fail-closed discipline: a failed refresh retains the last good snapshot;
//! before any successful refresh the registry serves an empty allow-list.

mod catalog;

pub use catalog::{CatalogSource, PgCatalog};

use parking_lot::RwLock;
use prahari_commons::{RegistryError, SchemaSnapshot, TableName};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Installed {
    snapshot: Arc<SchemaSnapshot>,
    installed_at: Instant,
}

/// Process-wide schema cache and allow-list owner.
pub struct SchemaRegistry {
    catalog: Arc<dyn CatalogSource>,
    /// Administratively configured allow-list; the effective allow-list is
    /// its intersection with discovered tables.
    configured: RwLock<BTreeSet<TableName>>,
    current: RwLock<Option<Installed>>,
    /// Single-flight guard: first cache-miss caller refreshes, others await.
    refresh_flight: Mutex<()>,
    ttl: Duration,
}

impl SchemaRegistry {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        configured_tables: BTreeSet<TableName>,
        ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            configured: RwLock::new(configured_tables),
            current: RwLock::new(None),
            refresh_flight: Mutex::new(()),
            ttl,
        }
    }

    /// First refresh before serving. Call once at startup.
    pub async fn init(&self) -> Result<Arc<SchemaSnapshot>, RegistryError> {
        self.refresh().await
    }

    /// Force a catalog refresh and install the resulting snapshot.
    ///
    /// On failure the previously installed snapshot is retained.
    pub async fn refresh(&self) -> Result<Arc<SchemaSnapshot>, RegistryError> {
        let _flight = self.refresh_flight.lock().await;
        self.refresh_locked().await
    }

    /// Current snapshot, refreshed when older than the TTL.
    ///
    /// Never fails: a refresh error falls back to the last good snapshot, or
    /// to the empty (fail-closed) snapshot when none exists yet.
    pub async fn snapshot(&self) -> Arc<SchemaSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        let _flight = self.refresh_flight.lock().await;
        // another caller may have refreshed while we waited for the guard
        if let Some(snapshot) = self.fresh_snapshot() {
            return snapshot;
        }

        match self.refresh_locked().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!(target: "registry", "schema refresh failed, serving last good snapshot: {}", e);
                self.last_good_or_empty()
            }
        }
    }

    /// Effective allow-list of the current snapshot (empty before the first
    /// successful refresh).
    pub fn allowed_tables(&self) -> BTreeSet<TableName> {
        self.current
            .read()
            .as_ref()
            .map(|i| i.snapshot.allowed_tables().clone())
            .unwrap_or_default()
    }

    /// Add a table to the allow-list.
    ///
    /// The table must exist in the catalog. A full refresh follows so the
    /// new table's columns are discovered; the snapshot swap is atomic.
    pub async fn add_table(&self, name: &str) -> Result<(), RegistryError> {
        let table = TableName::new(name);
        let discovered: BTreeSet<TableName> =
            self.catalog.list_tables().await?.into_iter().collect();
        if !discovered.contains(&table) {
            return Err(RegistryError::unknown_table(table.as_str()));
        }

        self.configured.write().insert(table);

        let _flight = self.refresh_flight.lock().await;
        self.refresh_locked().await?;
        Ok(())
    }

    /// Remove a table from the allow-list.
    ///
    /// Narrowing must take effect immediately, so this derives a new snapshot
    /// from the installed one instead of waiting for a catalog round-trip.
    /// Returns whether the table was present.
    pub fn remove_table(&self, name: &str) -> bool {
        let table = TableName::new(name);
        let removed = self.configured.write().remove(&table);
        if !removed {
            return false;
        }

        let mut current = self.current.write();
        let replacement = current.as_ref().map(|installed| {
            let mut allowed = installed.snapshot.allowed_tables().clone();
            allowed.remove(&table);
            Installed {
                snapshot: Arc::new(installed.snapshot.with_allowed_tables(allowed)),
                installed_at: installed.installed_at,
            }
        });
        if let Some(replacement) = replacement {
            *current = Some(replacement);
        }
        true
    }

    fn fresh_snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        self.current
            .read()
            .as_ref()
            .filter(|i| i.installed_at.elapsed() < self.ttl)
            .map(|i| Arc::clone(&i.snapshot))
    }

    fn last_good_or_empty(&self) -> Arc<SchemaSnapshot> {
        self.current
            .read()
            .as_ref()
            .map(|i| Arc::clone(&i.snapshot))
            .unwrap_or_else(|| Arc::new(SchemaSnapshot::empty()))
    }

    /// Discover the schema and install a new snapshot. Caller must hold the
    /// flight guard.
    async fn refresh_locked(&self) -> Result<Arc<SchemaSnapshot>, RegistryError> {
        let configured = self.configured.read().clone();

        let discovered: BTreeSet<TableName> =
            self.catalog.list_tables().await?.into_iter().collect();
        let allowed: BTreeSet<TableName> =
            configured.intersection(&discovered).cloned().collect();

        let mut tables = BTreeMap::new();
        for table in &allowed {
            let columns = self.catalog.list_columns(table).await?;
            tables.insert(table.clone(), columns);
        }

        let relationships = self
            .catalog
            .list_foreign_keys()
            .await?
            .into_iter()
            .filter(|fk| allowed.contains(&fk.source_table) && allowed.contains(&fk.target_table))
            .collect();

        let snapshot = Arc::new(SchemaSnapshot::new(tables, allowed, relationships));
        log::info!(
            target: "registry",
            "schema snapshot installed: {} allow-listed tables",
            snapshot.allowed_tables().len()
        );

        *self.current.write() = Some(Installed {
            snapshot: Arc::clone(&snapshot),
            installed_at: Instant::now(),
        });
        Ok(snapshot)
    }
}
