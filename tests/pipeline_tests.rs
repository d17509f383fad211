//! End-to-end gate scenarios through the pipeline: candidate text in,
//! finalized text (or a structured rejection) out. Execution is not driven
//! here; `prepare` covers everything up to the dispatcher handoff.

mod common;

use common::FakeCatalog;
use prahari::{AppConfig, PrahariError, QueryPipeline, ValidationError};
use sqlx::PgPool;
use std::sync::Arc;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.registry.allowed_tables = vec![
        "users".to_string(),
        "checklist".to_string(),
        "delegation".to_string(),
    ];
    config
}

fn pipeline() -> QueryPipeline {
    let config = test_config();
    // lazy pool: never connects, the dispatcher is not exercised here
    let pool = PgPool::connect_lazy(&config.database.url).unwrap();
    let catalog = Arc::new(FakeCatalog::new(&["users", "checklist", "delegation"]));
    QueryPipeline::with_catalog(&config, pool, catalog)
}

fn rejection(result: Result<String, PrahariError>) -> ValidationError {
    match result {
        Err(PrahariError::Validation(e)) => e,
        other => panic!("expected validation rejection, got {:?}", other.map(|_| "accepted")),
    }
}

#[tokio::test]
async fn test_accepted_select_is_finalized() {
    let pipeline = pipeline();
    let finalized = pipeline.prepare("SELECT * FROM users").await.unwrap();
    assert_eq!(finalized, "SELECT * FROM users LIMIT 200");
}

#[tokio::test]
async fn test_oversized_limit_is_clamped() {
    let pipeline = pipeline();
    let finalized = pipeline
        .prepare("SELECT * FROM users LIMIT 5000")
        .await
        .unwrap();
    assert_eq!(finalized, "SELECT * FROM users LIMIT 200");
}

#[tokio::test]
async fn test_join_across_allowed_tables() {
    let pipeline = pipeline();
    let finalized = pipeline
        .prepare(
            "SELECT u.name, c.name FROM users u \
             JOIN checklist c ON u.id = c.id \
             WHERE c.name IS NOT NULL;",
        )
        .await
        .unwrap();
    assert!(finalized.ends_with("LIMIT 200"));
    assert!(!finalized.contains(';'));
}

#[tokio::test]
async fn test_delete_is_rejected_with_keyword() {
    let pipeline = pipeline();
    let err = rejection(pipeline.prepare("DELETE FROM users WHERE user_id=1").await);
    assert_eq!(err, ValidationError::BlockedKeyword("DELETE".to_string()));
}

#[tokio::test]
async fn test_stacked_statements_are_rejected() {
    let pipeline = pipeline();
    let err = rejection(
        pipeline
            .prepare("SELECT * FROM users; DROP TABLE users;")
            .await,
    );
    assert!(matches!(
        err,
        ValidationError::BlockedKeyword(_) | ValidationError::MultipleStatements
    ));
}

#[tokio::test]
async fn test_catalog_probe_is_rejected() {
    let pipeline = pipeline();
    let err = rejection(pipeline.prepare("SELECT * FROM pg_catalog.pg_tables").await);
    assert!(matches!(
        err,
        ValidationError::BlockedKeyword(_) | ValidationError::TableNotAllowed(_)
    ));
}

#[tokio::test]
async fn test_unlisted_table_is_rejected() {
    let pipeline = pipeline();
    let err = rejection(pipeline.prepare("SELECT * FROM payroll").await);
    assert_eq!(err, ValidationError::TableNotAllowed("payroll".to_string()));
}

#[tokio::test]
async fn test_gate_config_replace_takes_effect() {
    let pipeline = pipeline();
    let mut narrowed = prahari::GateConfig::default();
    narrowed.max_rows = 10;
    pipeline.replace_gate_config(narrowed);

    let finalized = pipeline.prepare("SELECT * FROM users").await.unwrap();
    assert_eq!(finalized, "SELECT * FROM users LIMIT 10");
}

#[tokio::test]
async fn test_empty_allowlist_rejects_everything() {
    let mut config = test_config();
    config.registry.allowed_tables.clear();
    let pool = PgPool::connect_lazy(&config.database.url).unwrap();
    let catalog = Arc::new(FakeCatalog::new(&["users"]));
    let pipeline = QueryPipeline::with_catalog(&config, pool, catalog);

    let err = rejection(pipeline.prepare("SELECT * FROM users").await);
    assert_eq!(err, ValidationError::TableNotAllowed("users".to_string()));
}

#[tokio::test]
async fn test_admin_add_table_widens_the_gate() {
    let mut config = test_config();
    config.registry.allowed_tables = vec!["users".to_string()];
    let pool = PgPool::connect_lazy(&config.database.url).unwrap();
    let catalog = Arc::new(FakeCatalog::new(&["users", "checklist"]));
    let pipeline = QueryPipeline::with_catalog(&config, pool, catalog);

    let err = rejection(pipeline.prepare("SELECT * FROM checklist").await);
    assert_eq!(err, ValidationError::TableNotAllowed("checklist".to_string()));

    pipeline.registry().add_table("checklist").await.unwrap();
    assert!(pipeline.prepare("SELECT * FROM checklist").await.is_ok());
}

#[tokio::test]
async fn test_snapshot_exposes_prompt_context() {
    let pipeline = pipeline();
    let snapshot = pipeline.registry().snapshot().await;
    let context = snapshot.prompt_context();
    assert!(context.contains("Table: users"));
    assert!(context.contains("Table: checklist"));
}
