//! Shared data model for the query pipeline.
//!
//! The central type is [`SchemaSnapshot`], an immutable point-in-time view of
//! the discovered database schema plus the table allow-list. Snapshots are
//! shared as `Arc<SchemaSnapshot>` and replaced wholesale on refresh; they are
//! never mutated in place, so in-flight validations keep a consistent view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Case-normalized table identifier.
///
/// Stored lowercase with any schema qualifier stripped, so that allow-list
/// membership checks are insensitive to case and `public.` prefixes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let raw = name.as_ref().trim();
        let unqualified = raw.rsplit('.').next().unwrap_or(raw);
        let unquoted = unqualified.trim_matches('"');
        TableName(unquoted.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        TableName::new(s)
    }
}

/// A single column as discovered from the database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    /// Legal values when the column is backed by an enumerated type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ColumnDef {
    pub fn new<S: Into<String>>(name: S, data_type: S, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            enum_values: None,
        }
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// A foreign-key edge between two discovered tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub source_table: TableName,
    pub source_column: String,
    pub target_table: TableName,
    pub target_column: String,
}

/// Immutable point-in-time view of schema metadata and the allow-list.
///
/// Invariant: `allowed_tables` is always a subset of `tables.keys()`. The
/// constructor enforces this by intersection, so a configured table that no
/// longer exists in the catalog silently drops out of the allow-list.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSnapshot {
    tables: BTreeMap<TableName, Vec<ColumnDef>>,
    allowed_tables: BTreeSet<TableName>,
    relationships: Vec<ForeignKey>,
    captured_at: DateTime<Utc>,
}

impl SchemaSnapshot {
    pub fn new(
        tables: BTreeMap<TableName, Vec<ColumnDef>>,
        allowed_tables: BTreeSet<TableName>,
        relationships: Vec<ForeignKey>,
    ) -> Self {
        let allowed_tables = allowed_tables
            .into_iter()
            .filter(|t| tables.contains_key(t))
            .collect();
        Self {
            tables,
            allowed_tables,
            relationships,
            captured_at: Utc::now(),
        }
    }

    /// The fail-closed snapshot: no tables, empty allow-list.
    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
            allowed_tables: BTreeSet::new(),
            relationships: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn allowed_tables(&self) -> &BTreeSet<TableName> {
        &self.allowed_tables
    }

    pub fn tables(&self) -> &BTreeMap<TableName, Vec<ColumnDef>> {
        &self.tables
    }

    pub fn columns(&self, table: &TableName) -> Option<&[ColumnDef]> {
        self.tables.get(table).map(|c| c.as_slice())
    }

    pub fn relationships(&self) -> &[ForeignKey] {
        &self.relationships
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Derive a new snapshot with a different allow-list.
    ///
    /// Used by administrative add/remove so the published snapshot is swapped
    /// atomically instead of edited in place. The subset invariant is
    /// re-enforced against this snapshot's tables.
    pub fn with_allowed_tables(&self, allowed_tables: BTreeSet<TableName>) -> Self {
        let allowed_tables = allowed_tables
            .into_iter()
            .filter(|t| self.tables.contains_key(t))
            .collect();
        Self {
            tables: self.tables.clone(),
            allowed_tables,
            relationships: self.relationships.clone(),
            captured_at: self.captured_at,
        }
    }

    /// Render allow-listed tables, columns, enum values, and relationships as
    /// plain text for LLM prompt context. Only allow-listed tables appear.
    pub fn prompt_context(&self) -> String {
        let mut lines = Vec::new();
        lines.push("=== DATABASE SCHEMA ===".to_string());

        for table in &self.allowed_tables {
            let Some(columns) = self.tables.get(table) else {
                continue;
            };
            lines.push(String::new());
            lines.push(format!("Table: {}", table));
            lines.push("Columns:".to_string());
            for col in columns {
                let nullable = if col.nullable { "" } else { " NOT NULL" };
                match &col.enum_values {
                    Some(values) => lines.push(format!(
                        "  - {}: ENUM (values: {}){}",
                        col.name,
                        values.join(", "),
                        nullable
                    )),
                    None => {
                        lines.push(format!("  - {}: {}{}", col.name, col.data_type, nullable))
                    }
                }
            }
        }

        let edges: Vec<String> = self
            .relationships
            .iter()
            .filter(|fk| {
                self.allowed_tables.contains(&fk.source_table)
                    && self.allowed_tables.contains(&fk.target_table)
            })
            .map(|fk| {
                format!(
                    "{}.{} -> {}.{}",
                    fk.source_table, fk.source_column, fk.target_table, fk.target_column
                )
            })
            .collect();
        if !edges.is_empty() {
            lines.push(String::new());
            lines.push("Relationships:".to_string());
            for edge in edges {
                lines.push(format!("  {}", edge));
            }
        }

        lines.join("\n")
    }
}
