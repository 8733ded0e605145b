use crate::prompts::templates::REFUSAL_MESSAGE;
use crate::util::text::strip_code_fence;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::sync::LazyLock;

/// Returned in place of generated SQL that fails the read-only check.
pub const READ_ONLY_VIOLATION: &str = "Only SELECT queries are allowed.";

// Quoted literals, quoted identifiers and comments; their contents never count as keywords.
static OPAQUE_SPANS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)'(?:[^']|'')*'|"(?:[^"]|"")*"|`[^`]*`|--[^\n]*|/\*.*?\*/"#)
        .expect("valid opaque span pattern")
});

static MUTATING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|DROP|ALTER|CREATE|TRUNCATE|ATTACH|DETACH|PRAGMA|VACUUM|GRANT|REVOKE)\b")
        .expect("valid mutating keyword pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardViolation {
    Empty,
    NotReadOnly(String),
    MutatingKeyword(String),
    MultipleStatements,
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardViolation::Empty => write!(f, "empty query"),
            GuardViolation::NotReadOnly(keyword) => {
                write!(f, "query starts with '{}' instead of SELECT or WITH", keyword)
            }
            GuardViolation::MutatingKeyword(keyword) => {
                write!(f, "query contains mutating keyword '{}'", keyword)
            }
            GuardViolation::MultipleStatements => write!(f, "query contains more than one statement"),
        }
    }
}

impl Error for GuardViolation {}

/// Accepts a single read-only statement and returns it without any code fence.
///
/// The refusal sentence passes through unchanged.
pub fn check_read_only(sql: &str) -> Result<String, GuardViolation> {
    let sql = strip_code_fence(sql);

    if sql.is_empty() {
        return Err(GuardViolation::Empty);
    }
    if sql.trim_matches(['"', '`']) == REFUSAL_MESSAGE {
        return Ok(REFUSAL_MESSAGE.to_string());
    }

    let code = OPAQUE_SPANS.replace_all(sql, " ");
    let code = code.trim();

    let first_keyword: String = code
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();
    if first_keyword != "SELECT" && first_keyword != "WITH" {
        let shown = if first_keyword.is_empty() {
            code.chars().take(16).collect()
        } else {
            first_keyword
        };
        return Err(GuardViolation::NotReadOnly(shown));
    }

    if let Some(found) = MUTATING_KEYWORD.find(code) {
        return Err(GuardViolation::MutatingKeyword(
            found.as_str().to_ascii_uppercase(),
        ));
    }

    if code.trim_end_matches(|c: char| c == ';' || c.is_whitespace()).contains(';') {
        return Err(GuardViolation::MultipleStatements);
    }

    Ok(sql.to_string())
}
