// Error types module
use thiserror::Error;

/// Rejection reasons produced by the safety gate.
///
/// Exactly one reason is attached to each rejected candidate. Variants carry
/// the offending keyword, pattern, or table name where one exists, and never
/// expose schema internals beyond that element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty query not allowed")]
    EmptyQuery,

    #[error("Query too long: {length} characters (max: {max})")]
    QueryTooLong { length: usize, max: usize },

    #[error("Only SELECT queries are allowed (read-only mode)")]
    NotASelect,

    #[error("Query contains forbidden keyword '{0}'")]
    BlockedKeyword(String),

    #[error("Query matches blocked pattern '{0}'")]
    BlockedPattern(String),

    #[error("Multiple statements are not allowed")]
    MultipleStatements,

    #[error("Table not allowed: {0}")]
    TableNotAllowed(String),
}

/// Schema registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Schema refresh failed: {0}")]
    SchemaRefreshFailed(String),

    #[error("Table not found in catalog: {0}")]
    UnknownTable(String),
}

/// Execution dispatcher errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Query execution timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },

    #[error("Query execution failed: {0}")]
    Database(String),
}

/// Main error type for the Prahari pipeline
#[derive(Error, Debug)]
pub enum PrahariError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ValidationError {
    /// Create a blocked-keyword rejection
    pub fn blocked_keyword<S: Into<String>>(word: S) -> Self {
        ValidationError::BlockedKeyword(word.into())
    }

    /// Create a blocked-pattern rejection
    pub fn blocked_pattern<S: Into<String>>(pattern: S) -> Self {
        ValidationError::BlockedPattern(pattern.into())
    }

    /// Create a table-not-allowed rejection
    pub fn table_not_allowed<S: Into<String>>(table: S) -> Self {
        ValidationError::TableNotAllowed(table.into())
    }
}

impl RegistryError {
    /// Create a schema refresh failure
    pub fn refresh_failed<S: Into<String>>(msg: S) -> Self {
        RegistryError::SchemaRefreshFailed(msg.into())
    }

    /// Create an unknown-table error
    pub fn unknown_table<S: Into<String>>(table: S) -> Self {
        RegistryError::UnknownTable(table.into())
    }
}

impl ExecutionError {
    /// Create a driver-level failure
    pub fn database<S: Into<String>>(msg: S) -> Self {
        ExecutionError::Database(msg.into())
    }
}

impl From<String> for PrahariError {
    fn from(msg: String) -> Self {
        PrahariError::Config(msg)
    }
}
