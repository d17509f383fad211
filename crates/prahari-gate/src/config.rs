//! Gate configuration bundle.

use crate::keywords::default_blocked_keywords;
use crate::patterns::{default_blocked_patterns, BlockedPattern};
use std::collections::BTreeSet;
use std::time::Duration;

/// Immutable configuration for the safety gate.
///
/// Built once at process start. Never mutated field-by-field after
/// construction: callers that need different limits build a new bundle and
/// publish it with an explicit replace.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Maximum candidate text length in characters.
    pub max_query_length: usize,
    /// Maximum result rows enforced by the finalizer.
    pub max_rows: u64,
    /// Case-insensitive whole-word blocked keywords, stored uppercase.
    pub blocked_keywords: BTreeSet<String>,
    /// Structural danger detectors.
    pub blocked_patterns: Vec<BlockedPattern>,
    /// Maximum age of a schema snapshot before the registry refreshes.
    pub schema_cache_ttl: Duration,
}

impl GateConfig {
    pub const DEFAULT_MAX_QUERY_LENGTH: usize = 2000;
    pub const DEFAULT_MAX_ROWS: u64 = 200;
    pub const DEFAULT_SCHEMA_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

    /// Build a config with custom limits and the default keyword/pattern sets.
    pub fn new(max_query_length: usize, max_rows: u64, schema_cache_ttl: Duration) -> Self {
        Self {
            max_query_length,
            max_rows,
            blocked_keywords: default_blocked_keywords(),
            blocked_patterns: default_blocked_patterns(),
            schema_cache_ttl,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_QUERY_LENGTH,
            Self::DEFAULT_MAX_ROWS,
            Self::DEFAULT_SCHEMA_CACHE_TTL,
        )
    }
}
