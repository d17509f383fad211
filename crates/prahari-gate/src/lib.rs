//! Prahari gate — pure validation and rewriting for LLM-generated SQL.
//!
//! SQL text produced by a language model is untrusted input. This crate is
//! the deterministic envelope between "text the generator suggested" and
//! "text the dispatcher may execute": a fixed-order validation pipeline
//! ([`validate`]) plus a row-cap rewriter ([`finalize`]). Both are pure
//! functions over immutable inputs and need no synchronization.
//!
//! The gate never tries to understand what a query *means*. It enforces a
//! conservative envelope — read-only, single statement, allow-listed tables,
//! bounded rows — whatever the query is trying to accomplish.
//!
//! # Example
//!
//! ```
//! use prahari_gate::{finalize, validate, GateConfig};
//! use prahari_commons::TableName;
//! use std::collections::BTreeSet;
//!
//! let config = GateConfig::default();
//! let allowed: BTreeSet<TableName> =
//!     ["users", "checklist"].iter().map(TableName::new).collect();
//!
//! let sql = "SELECT * FROM users";
//! validate(sql, &allowed, &config).unwrap();
//! assert_eq!(finalize(sql, config.max_rows), "SELECT * FROM users LIMIT 200");
//!
//! assert!(validate("DROP TABLE users", &allowed, &config).is_err());
//! ```

pub mod config;
pub mod finalizer;
pub mod keywords;
pub mod patterns;
mod scanner;
pub mod tables;
pub mod validate;

pub use config::GateConfig;
pub use finalizer::finalize;
pub use patterns::BlockedPattern;
pub use validate::validate;
