//! Low-level text scanning shared by the gate checks.
//!
//! The scanners here are deliberately not a SQL parser. They do the minimum
//! structural work the gate needs: blanking string literals while preserving
//! byte offsets, a quote-aware statement-separator scan, and a flat token
//! stream for table extraction and LIMIT rewriting.

/// A token from [`tokenize`]. Offsets index into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Identifier, keyword, or numeric literal. For quoted identifiers the
    /// text excludes the quotes while the offsets span them.
    Word {
        text: &'a str,
        start: usize,
        end: usize,
    },
    /// One of `.` `,` `(` `)` `;`
    Punct { ch: char, pos: usize },
}

impl<'a> Token<'a> {
    pub(crate) fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word { text, .. } if text.eq_ignore_ascii_case(word))
    }

    pub(crate) fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct { ch, .. } if *ch == c)
    }

    pub(crate) fn word_text(&self) -> Option<&'a str> {
        match self {
            Token::Word { text, .. } => Some(text),
            Token::Punct { .. } => None,
        }
    }
}

/// Blank out single-quoted string literals, preserving byte length so token
/// offsets computed on the result index into the original text. The SQL `''`
/// escape inside a literal is handled.
pub(crate) fn scrub_literals(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            out.push(' ');
            i += 1;
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    out.push(' ');
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                        out.push(' ');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                // multi-byte chars inside the literal become one space each
                let ch = sql[i..].chars().next().unwrap_or('\0');
                for _ in 0..ch.len_utf8() {
                    out.push(' ');
                }
                i += ch.len_utf8();
            }
        } else {
            let ch = sql[i..].chars().next().unwrap_or('\0');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

/// Quote-aware detection of a second statement.
///
/// Tracks single- and double-quoted regions and reports true only when a
/// semicolon outside every literal is followed by further non-whitespace
/// content. A lone trailing terminator is legal; `';'` inside a literal never
/// triggers.
pub(crate) fn has_trailing_statement(sql: &str) -> bool {
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\'' if !in_double => {
                if in_single {
                    // '' escape stays inside the literal
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                    } else {
                        in_single = false;
                    }
                } else {
                    in_single = true;
                }
            }
            '"' if !in_single => in_double = !in_double,
            ';' if !in_single && !in_double => {
                return sql[pos + 1..].chars().any(|c| !c.is_whitespace());
            }
            _ => {}
        }
    }
    false
}

/// Case-insensitive word tokens for the blocked-keyword scan.
///
/// Words are maximal runs of alphanumerics, `_`, and `$`, so an identifier
/// like `status_update` is a single token and never matches `UPDATE`.
pub(crate) fn word_tokens(sql: &str) -> impl Iterator<Item = &str> {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .filter(|w| !w.is_empty())
}

/// Flat token stream over already-scrubbed text.
pub(crate) fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < sql.len() {
        let ch = sql[i..].chars().next().unwrap_or('\0');
        if ch.is_whitespace() {
            i += ch.len_utf8();
            continue;
        }
        match ch {
            '"' => {
                let start = i;
                i += 1;
                let inner_start = i;
                while i < sql.len() {
                    let c = sql[i..].chars().next().unwrap_or('\0');
                    if c == '"' {
                        break;
                    }
                    i += c.len_utf8();
                }
                let inner_end = i;
                if i < sql.len() {
                    i += 1; // closing quote
                }
                tokens.push(Token::Word {
                    text: &sql[inner_start..inner_end],
                    start,
                    end: i,
                });
            }
            '.' | ',' | '(' | ')' | ';' => {
                tokens.push(Token::Punct { ch, pos: i });
                i += 1;
            }
            _ if ch.is_ascii_alphanumeric() || ch == '_' => {
                let start = i;
                i += ch.len_utf8();
                while i < sql.len() {
                    let c = sql[i..].chars().next().unwrap_or('\0');
                    if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                        i += c.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word {
                    text: &sql[start..i],
                    start,
                    end: i,
                });
            }
            _ => {
                i += ch.len_utf8();
            }
        }
    }
    tokens
}
