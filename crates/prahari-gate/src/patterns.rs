//! Blocked structural patterns.
//!
//! Regex-level detectors for constructs a keyword scan cannot see: comment
//! markers used for truncation, output redirection, timing probes,
//! stored-procedure invocation, and escape-sequence obfuscation. The label is
//! what surfaces in the rejection, not the regex source.

use once_cell::sync::Lazy;
use regex::Regex;

/// A labeled structural detector.
#[derive(Debug, Clone)]
pub struct BlockedPattern {
    label: String,
    regex: Regex,
}

impl BlockedPattern {
    /// Compile a custom pattern.
    pub fn new<S: Into<String>>(label: S, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_match(&self, sql: &str) -> bool {
        self.regex.is_match(sql)
    }
}

static DEFAULT_PATTERNS: Lazy<Vec<BlockedPattern>> = Lazy::new(|| {
    let raw: &[(&str, &str)] = &[
        // Comment injection / truncation
        ("line comment", r"--"),
        ("block comment open", r"/\*"),
        ("block comment close", r"\*/"),
        // Output redirection
        ("INTO OUTFILE", r"(?i)\binto\s+outfile\b"),
        ("INTO DUMPFILE", r"(?i)\binto\s+dumpfile\b"),
        ("COPY ... TO", r"(?is)\bcopy\s+.+\s+to\b"),
        // Timing / side-channel probes
        ("pg_sleep()", r"(?i)\bpg_sleep\s*\("),
        ("sleep()", r"(?i)\bsleep\s*\("),
        ("benchmark()", r"(?i)\bbenchmark\s*\("),
        ("WAITFOR DELAY", r"(?i)\bwaitfor\s+delay\b"),
        // Stored-procedure invocation
        ("CALL procedure", r"(?i)\bcall\s+[a-z_][a-z0-9_.]*\s*\("),
        ("DBMS_/UTL_ package", r"(?i)\b(dbms|utl)_[a-z0-9_]+"),
        // Session manipulation
        ("SET ROLE/SESSION", r"(?i)\bset\s+(role|session)\b"),
        // Escape-sequence obfuscation
        ("hex escape", r"\\x[0-9a-fA-F]+"),
        ("chr()", r"(?i)\bchr\s*\("),
        ("char()", r"(?i)\bchar\s*\("),
        ("ascii()", r"(?i)\bascii\s*\("),
        // Boolean tautology probe
        ("1=1", r"\b1\s*=\s*1\b"),
    ];
    raw.iter()
        .map(|(label, pattern)| {
            BlockedPattern::new(*label, pattern).expect("default blocked pattern must compile")
        })
        .collect()
});

/// Clone the default pattern set for a [`crate::GateConfig`].
pub fn default_blocked_patterns() -> Vec<BlockedPattern> {
    DEFAULT_PATTERNS.clone()
}
