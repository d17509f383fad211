//! Prahari — the safety core of a natural-language-to-SQL chat backend.
//!
//! An LLM suggests SQL; this crate decides whether it runs. The pieces, in
//! pipeline order:
//!
//! - [`SchemaRegistry`]: discovers and caches table/column metadata from the
//!   database catalog and owns the table allow-list.
//! - the safety gate ([`prahari_gate::validate`]): pure, deterministic
//!   accept/reject validation of candidate SQL.
//! - the finalizer ([`prahari_gate::finalize`]): bounds the result size of
//!   accepted queries.
//! - [`Dispatcher`]: executes finalized text under a hard timeout and
//!   normalizes driver failures.
//!
//! [`QueryPipeline`] wires them together for an outer chat/HTTP layer.
//! Natural-language understanding, prompt construction, LLM invocation, and
//! transport are external collaborators and do not live here.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod pipeline;
pub mod registry;

pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use logging::init_logging;
pub use pipeline::QueryPipeline;
pub use registry::{CatalogSource, PgCatalog, SchemaRegistry};

pub use prahari_commons::{
    ColumnDef, ExecutionError, ForeignKey, PrahariError, RegistryError, SchemaSnapshot, TableName,
    ValidationError,
};
pub use prahari_gate::{finalize, validate, GateConfig};
