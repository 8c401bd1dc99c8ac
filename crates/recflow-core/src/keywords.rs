//! Reserved-identifier tables and the key sanitizer used by flattening.
//!
//! Tables are plain data; the sanitizer does not know about any particular
//! language beyond the table it is handed.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Which built-in reserved-word table to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeywordTarget {
    #[default]
    Common,
    JavaScript,
    Python,
    Rust,
    Sql,
    None,
}

const JAVASCRIPT: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

const PYTHON: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RUST: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const SQL: &[&str] = &[
    "select", "from", "where", "group", "order", "by", "having", "limit", "offset", "join",
    "inner", "left", "right", "outer", "on", "as", "and", "or", "not", "null", "table",
    "insert", "update", "delete", "create", "drop", "index", "key", "primary", "default",
    "values", "union", "case", "when", "then", "else", "end", "user",
];

/// Words reserved in several mainstream targets; the default table.
const COMMON: &[&str] = &[
    "from", "class", "import", "return", "def", "function", "type", "default", "delete", "new",
    "in", "is", "if", "else", "for", "while", "switch", "case", "break", "continue", "let",
    "var", "const", "static", "yield", "async", "await", "true", "false", "null", "this",
    "self", "super", "with", "as", "try", "catch", "finally", "lambda", "global", "enum",
];

static TABLES: Lazy<[(KeywordTarget, HashSet<&'static str>); 5]> = Lazy::new(|| {
    [
        (KeywordTarget::Common, COMMON.iter().copied().collect()),
        (KeywordTarget::JavaScript, JAVASCRIPT.iter().copied().collect()),
        (KeywordTarget::Python, PYTHON.iter().copied().collect()),
        (KeywordTarget::Rust, RUST.iter().copied().collect()),
        (KeywordTarget::Sql, SQL.iter().copied().collect()),
    ]
});

pub const DEFAULT_SUFFIX: &str = "_field";

/// A reserved-word set plus the suffix appended to colliding keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    words: HashSet<String>,
    suffix: String,
    case_insensitive: bool,
}

impl KeywordTable {
    pub fn new(words: impl IntoIterator<Item = impl Into<String>>, suffix: impl Into<String>) -> Self {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            suffix: suffix.into(),
            case_insensitive: false,
        }
    }

    pub fn for_target(target: KeywordTarget) -> Self {
        let words: HashSet<String> = TABLES
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, set)| set.iter().map(|w| w.to_string()).collect())
            .unwrap_or_default();
        Self {
            words,
            suffix: DEFAULT_SUFFIX.to_string(),
            // SQL keywords are matched regardless of case.
            case_insensitive: target == KeywordTarget::Sql,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn is_reserved(&self, ident: &str) -> bool {
        if self.case_insensitive {
            self.words.contains(&ident.to_ascii_lowercase())
        } else {
            self.words.contains(ident)
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::for_target(KeywordTarget::Common)
    }
}

/// Turn an arbitrary key into a safe identifier for `table`'s target.
pub fn sanitize_identifier(key: &str, table: &KeywordTable) -> String {
    let mut out: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push('_');
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if table.is_reserved(&out) {
        out.push_str(table.suffix());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_reserved_words() {
        let t = KeywordTable::default();
        assert_eq!(sanitize_identifier("from", &t), "from_field");
        assert_eq!(sanitize_identifier("class", &t), "class_field");
        assert_eq!(sanitize_identifier("name", &t), "name");
    }

    #[test]
    fn replaces_unsafe_characters() {
        let t = KeywordTable::for_target(KeywordTarget::None);
        assert_eq!(sanitize_identifier("first name", &t), "first_name");
        assert_eq!(sanitize_identifier("2fa", &t), "_2fa");
        assert_eq!(sanitize_identifier("", &t), "_");
        assert_eq!(sanitize_identifier("from", &t), "from");
    }

    #[test]
    fn sql_table_is_case_insensitive() {
        let t = KeywordTable::for_target(KeywordTarget::Sql).with_suffix("_col");
        assert_eq!(sanitize_identifier("Select", &t), "Select_col");
    }

    #[test]
    fn custom_tables() {
        let t = KeywordTable::new(["id"], "_x");
        assert_eq!(sanitize_identifier("id", &t), "id_x");
        assert_eq!(sanitize_identifier("from", &t), "from");
    }
}
