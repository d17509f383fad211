//! Referenced-table extraction for the allow-list check.
//!
//! Extracts the identifiers that follow `FROM` and `JOIN`, descending into
//! subqueries, skipping derived tables, set-returning function calls, and
//! aliases, and stripping schema qualifiers. Names declared as CTEs in a
//! leading `WITH` clause are not real tables and are excluded from the
//! result.

use crate::scanner::{scrub_literals, tokenize, Token};
use prahari_commons::TableName;
use std::collections::BTreeSet;

/// Keywords that terminate a FROM-clause table list.
const BOUNDARY_KEYWORDS: &[&str] = &[
    "where", "join", "on", "group", "order", "limit", "offset", "union", "intersect", "except",
    "having", "inner", "left", "right", "full", "cross", "natural", "outer", "using", "window",
    "fetch", "for", "returning", "set", "values",
];

fn is_boundary(token: &Token<'_>) -> bool {
    BOUNDARY_KEYWORDS.iter().any(|kw| token.is_word(kw))
}

/// Extract the set of table names referenced by `FROM` and `JOIN` clauses.
pub fn extract_tables(sql: &str) -> BTreeSet<TableName> {
    let scrubbed = scrub_literals(sql);
    let tokens = tokenize(&scrubbed);
    let ctes = cte_names(&tokens);

    let mut tables = BTreeSet::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_word("from") {
            i = consume_table_list(&tokens, i + 1, &mut tables);
        } else if tokens[i].is_word("join") {
            i = consume_table_ref(&tokens, i + 1, &mut tables);
        } else {
            i += 1;
        }
    }

    tables.retain(|t| !ctes.contains(t));
    tables
}

/// Names bound by `<ident> AS (` — common-table-expression definitions.
fn cte_names(tokens: &[Token<'_>]) -> BTreeSet<TableName> {
    let mut names = BTreeSet::new();
    for window in tokens.windows(3) {
        if let Some(name) = window[0].word_text() {
            if window[1].is_word("as") && window[2].is_punct('(') {
                names.insert(TableName::new(name));
            }
        }
    }
    names
}

/// Consume one table reference starting at `i`, recording it if it is a real
/// table. Returns the index of the first unconsumed token.
fn consume_table_ref(
    tokens: &[Token<'_>],
    i: usize,
    out: &mut BTreeSet<TableName>,
) -> usize {
    let Some(token) = tokens.get(i) else {
        return i;
    };

    // Derived table: the subquery body is scanned by the main loop.
    if token.is_punct('(') {
        return i;
    }

    let Some(first) = token.word_text() else {
        return i + 1;
    };

    // Follow the dotted chain; only the last segment names the table.
    let mut last = first;
    let mut j = i + 1;
    while j + 1 < tokens.len() && tokens[j].is_punct('.') {
        match tokens[j + 1].word_text() {
            Some(next) => {
                last = next;
                j += 2;
            }
            None => break,
        }
    }

    // `FROM generate_series(...)` is a function call, not a table.
    if tokens.get(j).is_some_and(|t| t.is_punct('(')) {
        return j;
    }

    out.insert(TableName::new(last));
    j
}

/// Consume a comma-separated table list after `FROM`.
fn consume_table_list(
    tokens: &[Token<'_>],
    i: usize,
    out: &mut BTreeSet<TableName>,
) -> usize {
    let mut i = consume_table_ref(tokens, i, out);
    loop {
        i = skip_alias(tokens, i);
        if tokens.get(i).is_some_and(|t| t.is_punct(',')) {
            i = consume_table_ref(tokens, i + 1, out);
        } else {
            return i;
        }
    }
}

fn skip_alias(tokens: &[Token<'_>], i: usize) -> usize {
    let Some(token) = tokens.get(i) else {
        return i;
    };
    if token.is_word("as") {
        if tokens.get(i + 1).and_then(|t| t.word_text()).is_some() {
            return i + 2;
        }
        return i + 1;
    }
    if is_boundary(token) {
        return i;
    }
    if token.word_text().is_some() {
        return i + 1;
    }
    i
}
