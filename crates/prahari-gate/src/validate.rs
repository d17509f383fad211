//! The safety gate: deterministic accept/reject validation for candidate SQL.
//!
//! The gate treats every candidate as hostile. It is a pure function over
//! immutable inputs: no I/O, no shared state, safe to call from any number of
//! concurrent callers. Checks run in a fixed order and the first failure
//! decides the verdict.

use crate::config::GateConfig;
use crate::scanner::{has_trailing_statement, word_tokens};
use crate::tables::extract_tables;
use prahari_commons::{TableName, ValidationError};
use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::collections::BTreeSet;

/// Validate one candidate query against the allow-list and gate config.
///
/// Check order (short-circuit on first failure):
/// 1. empty input
/// 2. length cap
/// 3. read-only form: must begin with `SELECT` or `WITH`
/// 4. blocked-keyword scan (whole-word, case-insensitive)
/// 5. blocked-pattern scan
/// 6. multiple-statement detection (quote-aware)
/// 7. table allow-list
///
/// A rejected candidate is never repaired or retried; one verdict per call.
pub fn validate(
    sql: &str,
    allowed_tables: &BTreeSet<TableName>,
    config: &GateConfig,
) -> Result<(), ValidationError> {
    let trimmed = sql.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    let length = trimmed.chars().count();
    if length > config.max_query_length {
        return Err(ValidationError::QueryTooLong {
            length,
            max: config.max_query_length,
        });
    }

    match leading_keyword(trimmed).as_deref() {
        Some("SELECT") | Some("WITH") => {}
        // A statement led by a blocked verb reports the specific keyword
        // rather than the generic form failure.
        Some(other) if config.blocked_keywords.contains(other) => {
            return Err(ValidationError::BlockedKeyword(other.to_string()));
        }
        _ => return Err(ValidationError::NotASelect),
    }

    for word in word_tokens(trimmed) {
        let upper = word.to_ascii_uppercase();
        if config.blocked_keywords.contains(&upper) {
            log::warn!(target: "gate", "blocked keyword '{}' in candidate", upper);
            return Err(ValidationError::BlockedKeyword(upper));
        }
    }

    for pattern in &config.blocked_patterns {
        if pattern.is_match(trimmed) {
            log::warn!(target: "gate", "blocked pattern '{}' in candidate", pattern.label());
            return Err(ValidationError::blocked_pattern(pattern.label()));
        }
    }

    if has_trailing_statement(trimmed) {
        return Err(ValidationError::MultipleStatements);
    }

    for table in extract_tables(trimmed) {
        if !allowed_tables.contains(&table) {
            log::warn!(target: "gate", "table '{}' not in allow-list", table);
            return Err(ValidationError::TableNotAllowed(table.as_str().to_string()));
        }
    }

    Ok(())
}

/// First keyword of the statement, skipping leading whitespace and comments.
///
/// Uses the sqlparser tokenizer (comments arrive as whitespace tokens and are
/// skipped), falling back to a plain whitespace split when tokenization fails.
fn leading_keyword(sql: &str) -> Option<String> {
    let dialect = GenericDialect {};
    match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens.iter().find_map(|tok| match tok {
            Token::Word(w) => Some(w.value.to_uppercase()),
            _ => None,
        }),
        Err(_) => sql.split_whitespace().next().map(|w| w.to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> BTreeSet<TableName> {
        ["users", "checklist", "delegation"]
            .iter()
            .map(|t| TableName::new(t))
            .collect()
    }

    fn check(sql: &str) -> Result<(), ValidationError> {
        validate(sql, &allowed(), &GateConfig::default())
    }

    #[test]
    fn test_accepts_plain_select() {
        assert!(check("SELECT * FROM users").is_ok());
        assert!(check("select user_name, status from users where status = 'active'").is_ok());
    }

    #[test]
    fn test_accepts_cte() {
        assert!(check(
            "WITH pending AS (SELECT * FROM checklist WHERE status = 'no') \
             SELECT count(*) FROM pending"
        )
        .is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(check(""), Err(ValidationError::EmptyQuery));
        assert_eq!(check("   \n\t"), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("SELECT * FROM users WHERE note = '{}'", "x".repeat(2000));
        assert!(matches!(
            check(&long),
            Err(ValidationError::QueryTooLong { .. })
        ));
    }

    #[test]
    fn test_rejects_non_select() {
        assert_eq!(check("SHOW TABLES"), Err(ValidationError::NotASelect));
        assert_eq!(check("EXPLAIN SELECT 1"), Err(ValidationError::NotASelect));
    }

    #[test]
    fn test_rejects_delete() {
        assert_eq!(
            check("DELETE FROM users WHERE user_id=1"),
            Err(ValidationError::BlockedKeyword("DELETE".into()))
        );
    }

    #[test]
    fn test_blocked_keyword_anywhere_in_select() {
        assert_eq!(
            check("SELECT * FROM users; DROP TABLE users;"),
            Err(ValidationError::BlockedKeyword("DROP".into()))
        );
        assert_eq!(
            check("SELECT truncate FROM users"),
            Err(ValidationError::BlockedKeyword("TRUNCATE".into()))
        );
    }

    #[test]
    fn test_keyword_matching_is_whole_word() {
        // identifiers merely containing blocked substrings must pass
        assert!(check("SELECT status_update, selected_items FROM users").is_ok());
        assert!(check("SELECT created_at FROM checklist").is_ok());
    }

    #[test]
    fn test_rejects_catalog_probe() {
        let err = check("SELECT * FROM pg_catalog.pg_tables");
        assert!(matches!(
            err,
            Err(ValidationError::BlockedKeyword(_)) | Err(ValidationError::TableNotAllowed(_))
        ));
    }

    #[test]
    fn test_rejects_comment_pattern() {
        assert_eq!(
            check("SELECT * FROM users -- WHERE admin"),
            Err(ValidationError::BlockedPattern("line comment".into()))
        );
    }

    #[test]
    fn test_rejects_timing_probe() {
        assert_eq!(
            check("SELECT pg_sleep(30) FROM users"),
            Err(ValidationError::BlockedPattern("pg_sleep()".into()))
        );
    }

    #[test]
    fn test_rejects_multiple_statements() {
        // no blocked keyword in the second statement, so the quote-aware
        // scanner is what catches it
        assert_eq!(
            check("SELECT * FROM users; SELECT * FROM checklist"),
            Err(ValidationError::MultipleStatements)
        );
    }

    #[test]
    fn test_semicolon_in_literal_accepted() {
        assert!(check("SELECT * FROM users WHERE note = 'one; two'").is_ok());
    }

    #[test]
    fn test_trailing_terminator_accepted() {
        assert!(check("SELECT * FROM users;").is_ok());
    }

    #[test]
    fn test_rejects_unlisted_table() {
        assert_eq!(
            check("SELECT * FROM payroll"),
            Err(ValidationError::TableNotAllowed("payroll".into()))
        );
        assert_eq!(
            check("SELECT * FROM users u JOIN payroll p ON u.id = p.user_id"),
            Err(ValidationError::TableNotAllowed("payroll".into()))
        );
    }

    #[test]
    fn test_schema_qualified_allowed_table_accepted() {
        assert!(check("SELECT * FROM public.users").is_ok());
    }

    #[test]
    fn test_leading_comment_then_select() {
        // form check skips the comment; the pattern scan still rejects it
        assert_eq!(
            check("/* hi */ SELECT * FROM users"),
            Err(ValidationError::BlockedPattern("block comment open".into()))
        );
    }

    #[test]
    fn test_blocked_leading_verb_reports_keyword() {
        // DELETE fails the form check too, but the verdict names the keyword
        assert_eq!(
            check("DELETE FROM users"),
            Err(ValidationError::BlockedKeyword("DELETE".into()))
        );
        assert_eq!(
            check("TRUNCATE TABLE users"),
            Err(ValidationError::BlockedKeyword("TRUNCATE".into()))
        );
    }
}
