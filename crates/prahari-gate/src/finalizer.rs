//! Query finalizer: guarantees a bounded result size on accepted queries.
//!
//! Only the outermost statement's `LIMIT` is authoritative; limits inside
//! subqueries or CTEs are left untouched. The rewrite is idempotent and
//! tolerates a trailing statement terminator and surrounding whitespace.

use crate::scanner::{scrub_literals, tokenize, Token};

/// Enforce `LIMIT <= max_rows` on the outermost statement.
///
/// - no top-level `LIMIT`: appends `LIMIT max_rows`
/// - top-level `LIMIT n` with `n > max_rows` (or `LIMIT ALL`): rewrites the
///   value down to `max_rows`, keeping any `OFFSET` clause
/// - `n <= max_rows`: left untouched
///
/// The returned text never carries a trailing `;`.
pub fn finalize(sql: &str, max_rows: u64) -> String {
    let mut base = sql.trim();
    while let Some(stripped) = base.strip_suffix(';') {
        base = stripped.trim_end();
    }
    if base.is_empty() {
        return String::new();
    }

    // Scan a literal-scrubbed copy so LIMIT inside a string cannot match;
    // offsets still index into `base`.
    let scrubbed = scrub_literals(base);
    let tokens = tokenize(&scrubbed);

    let mut depth: usize = 0;
    let mut limit_idx = None;
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Punct { ch: '(', .. } => depth += 1,
            Token::Punct { ch: ')', .. } => depth = depth.saturating_sub(1),
            Token::Word { text, .. } if depth == 0 && text.eq_ignore_ascii_case("limit") => {
                limit_idx = Some(idx);
            }
            _ => {}
        }
    }

    let value_token = limit_idx.and_then(|idx| tokens.get(idx + 1));
    match value_token {
        Some(Token::Word { text, start, end }) => {
            let rewrite = match text.parse::<u64>() {
                Ok(n) => n > max_rows,
                // LIMIT ALL means unbounded
                Err(_) => text.eq_ignore_ascii_case("all"),
            };
            if rewrite {
                format!("{}{}{}", &base[..*start], max_rows, &base[*end..])
            } else {
                base.to_string()
            }
        }
        _ => format!("{} LIMIT {}", base, max_rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_limit_when_missing() {
        assert_eq!(
            finalize("SELECT * FROM users", 200),
            "SELECT * FROM users LIMIT 200"
        );
    }

    #[test]
    fn test_strips_trailing_terminator() {
        assert_eq!(
            finalize("SELECT * FROM users;  ", 200),
            "SELECT * FROM users LIMIT 200"
        );
        assert_eq!(
            finalize("SELECT * FROM users LIMIT 50;", 200),
            "SELECT * FROM users LIMIT 50"
        );
    }

    #[test]
    fn test_rewrites_oversized_limit() {
        assert_eq!(
            finalize("SELECT * FROM users LIMIT 5000", 200),
            "SELECT * FROM users LIMIT 200"
        );
    }

    #[test]
    fn test_keeps_limit_within_cap() {
        assert_eq!(
            finalize("SELECT * FROM users LIMIT 50", 200),
            "SELECT * FROM users LIMIT 50"
        );
        assert_eq!(
            finalize("SELECT * FROM users LIMIT 200", 200),
            "SELECT * FROM users LIMIT 200"
        );
    }

    #[test]
    fn test_limit_all_is_rewritten() {
        assert_eq!(
            finalize("SELECT * FROM users LIMIT ALL", 200),
            "SELECT * FROM users LIMIT 200"
        );
    }

    #[test]
    fn test_offset_is_preserved() {
        assert_eq!(
            finalize("SELECT * FROM users LIMIT 5000 OFFSET 40", 200),
            "SELECT * FROM users LIMIT 200 OFFSET 40"
        );
    }

    #[test]
    fn test_nested_limit_untouched() {
        assert_eq!(
            finalize(
                "SELECT * FROM (SELECT * FROM checklist LIMIT 1000) recent",
                200
            ),
            "SELECT * FROM (SELECT * FROM checklist LIMIT 1000) recent LIMIT 200"
        );
    }

    #[test]
    fn test_cte_limit_untouched() {
        assert_eq!(
            finalize(
                "WITH top AS (SELECT * FROM users LIMIT 9999) SELECT * FROM top",
                200
            ),
            "WITH top AS (SELECT * FROM users LIMIT 9999) SELECT * FROM top LIMIT 200"
        );
    }

    #[test]
    fn test_limit_inside_literal_ignored() {
        assert_eq!(
            finalize("SELECT * FROM users WHERE note = 'LIMIT 9000'", 200),
            "SELECT * FROM users WHERE note = 'LIMIT 9000' LIMIT 200"
        );
    }

    #[test]
    fn test_idempotent() {
        for sql in [
            "SELECT * FROM users",
            "SELECT * FROM users LIMIT 5000",
            "SELECT * FROM users LIMIT 50",
            "SELECT * FROM users LIMIT 5000 OFFSET 40;",
        ] {
            let once = finalize(sql, 200);
            assert_eq!(finalize(&once, 200), once, "not idempotent for {sql}");
        }
    }
}
