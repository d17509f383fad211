//! Shared foundation for the Prahari query pipeline.
//!
//! This crate holds the data model exchanged between the safety gate, the
//! schema registry, and the execution dispatcher, plus the full error
//! taxonomy. It deliberately has no database or async dependencies so the
//! gate crate stays pure.

pub mod errors;
pub mod models;

pub use errors::{ExecutionError, PrahariError, RegistryError, ValidationError};
pub use models::{ColumnDef, ForeignKey, SchemaSnapshot, TableName};
