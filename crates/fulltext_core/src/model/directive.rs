//! Boolean-mode search directives.
//!
//! # Responsibility
//! - Define the operator set understood by MySQL `IN BOOLEAN MODE`.
//! - Sanitize caller terms once, at insertion time.
//!
//! # Invariants
//! - A directive's sanitized term never contains `+ - > < ( ) ~ * " @`.
//! - Operator decoration is applied after sanitization, never before.
//!
//! # See also
//! - <https://dev.mysql.com/doc/refman/8.0/en/fulltext-boolean.html>

use once_cell::sync::Lazy;
use regex::Regex;

static BOOLEAN_OPERATOR_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[+\-><()~*"@]+"#).expect("boolean operator pattern should compile")
});

/// Strips boolean-mode operator characters from a caller term.
///
/// Every maximal run of `+ - > < ( ) ~ * " @` becomes one space and the
/// result is trimmed. Never fails; an empty result is caught later by
/// query validation.
pub fn sanitize_term(term: &str) -> String {
    BOOLEAN_OPERATOR_RUN
        .replace_all(term, " ")
        .trim()
        .to_string()
}

/// Per-term operator in a boolean-mode `AGAINST` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOperator {
    /// `+term`: every returned row must contain the term.
    Require,
    /// `-term`: no returned row may contain the term.
    Exclude,
    /// `term`: optional, rows containing it rank higher.
    Optional,
    /// `~term`: rows containing it rank lower but are not excluded.
    Demote,
    /// `>term`: increases the term's contribution to relevance.
    RankUp,
    /// `<term`: decreases the term's contribution to relevance.
    RankDown,
    /// `"some words"`: literal phrase match.
    Phrase,
    /// `+term*`: required prefix match.
    Wildcard,
}

impl SearchOperator {
    /// Text placed before the sanitized term.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Require | Self::Wildcard => "+",
            Self::Exclude => "-",
            Self::Optional => "",
            Self::Demote => "~",
            Self::RankUp => ">",
            Self::RankDown => "<",
            Self::Phrase => "\"",
        }
    }

    /// Text placed after the sanitized term.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Phrase => "\"",
            Self::Wildcard => "*",
            _ => "",
        }
    }
}

/// One operator/term contribution to a boolean-mode search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDirective {
    operator: SearchOperator,
    raw_term: String,
    term: String,
}

impl SearchDirective {
    /// Creates a directive, sanitizing `raw_term` immediately.
    pub fn new(operator: SearchOperator, raw_term: impl Into<String>) -> Self {
        let raw_term = raw_term.into();
        let term = sanitize_term(&raw_term);
        Self {
            operator,
            raw_term,
            term,
        }
    }

    pub fn operator(&self) -> SearchOperator {
        self.operator
    }

    /// Caller-supplied term, verbatim.
    pub fn raw_term(&self) -> &str {
        &self.raw_term
    }

    /// Sanitized term without operator decoration.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Whether sanitization left nothing to search for.
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    /// Renders `prefix + term + suffix`.
    pub fn render(&self) -> String {
        format!(
            "{}{}{}",
            self.operator.prefix(),
            self.term,
            self.operator.suffix()
        )
    }
}
