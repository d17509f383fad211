//! Blocked-keyword set.
//!
//! These keywords are permanently blocked: any candidate containing one of
//! them as a standalone case-insensitive token is rejected before execution,
//! whatever the surrounding SQL looks like. Matching is whole-word, so an
//! identifier that merely contains a blocked substring (`status_update`,
//! `selected_items`) passes.

use std::collections::BTreeSet;

/// Default blocked keywords, uppercase.
pub const BLOCKED_KEYWORDS: &[&str] = &[
    // Data modification
    "DELETE", "UPDATE", "INSERT", "MERGE", "UPSERT", "REPLACE",
    // Data definition
    "DROP", "ALTER", "CREATE", "TRUNCATE", "RENAME",
    // Permissions & access
    "GRANT", "REVOKE", "DENY",
    // Transaction control
    "COMMIT", "ROLLBACK", "SAVEPOINT",
    // Database administration
    "VACUUM", "ANALYZE", "REINDEX", "CLUSTER",
    // Dangerous functions
    "EXEC", "EXECUTE", "CALL", "PREPARE",
    // System operations
    "COPY", "PG_DUMP", "PG_RESTORE", "LOAD",
    // File operations
    "PG_READ_FILE", "PG_WRITE_FILE", "LO_IMPORT", "LO_EXPORT", "LOAD_FILE",
    // User/role management
    "CREATEUSER", "DROPUSER", "CREATEROLE", "DROPROLE",
    // Timing / side channels
    "BENCHMARK", "WAITFOR",
    // MSSQL escape hatches
    "XP_CMDSHELL", "SP_EXECUTESQL",
    // Catalog probing
    "INFORMATION_SCHEMA", "PG_CATALOG", "PG_SHADOW", "PG_AUTHID",
];

/// Build the default keyword set for a [`crate::GateConfig`].
pub fn default_blocked_keywords() -> BTreeSet<String> {
    BLOCKED_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
