//! Boolean-mode fulltext search: query composition and execution.
//!
//! # Responsibility
//! - Compose injection-safe `MATCH ... AGAINST (... IN BOOLEAN MODE)` SQL.
//! - Run count and data statements and shape owned results.
//!
//! # See also
//! - [`query::SearchQuery`] for composition.
//! - [`executor::Search`] for execution.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod executor;
pub mod query;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Which statement of a search run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// `SELECT COUNT(*) ...` without LIMIT/OFFSET.
    Count,
    /// The row-returning statement.
    Data,
}

impl QueryPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Data => "data",
        }
    }
}

/// Reasons a search cannot be composed or executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValidationError {
    /// The executor has no query bound.
    MissingQuery,
    /// The query has no search directive at all.
    NoSearchConditions,
    /// A directive's term was empty after sanitization.
    EmptySearchTerm {
        /// Zero-based directive position in insertion order.
        position: usize,
        raw_term: String,
    },
}

impl Display for QueryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingQuery => write!(f, "must set a search query"),
            Self::NoSearchConditions => write!(f, "must specify at least one search condition"),
            Self::EmptySearchTerm { position, raw_term } => write!(
                f,
                "search term #{position} (`{raw_term}`) is empty after removing operator characters"
            ),
        }
    }
}

impl Error for QueryValidationError {}

/// Search-layer error for connection, validation and statement failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Connection establishment failed.
    Connection { code: Option<u16>, message: String },
    /// Query is missing or incomplete; raised before any database round-trip.
    Validation(QueryValidationError),
    /// The database rejected the count or data statement.
    Query {
        phase: QueryPhase,
        code: Option<u16>,
        message: String,
    },
    /// The database answered with something that cannot be interpreted.
    InvalidData(String),
    /// Connection settings could not be resolved.
    Config(String),
}

impl SearchError {
    /// Whether this is the "term empty after sanitization" validation case.
    pub fn is_empty_term(&self) -> bool {
        matches!(
            self,
            Self::Validation(QueryValidationError::EmptySearchTerm { .. })
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Native driver error code, if the failure came from the driver.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Connection { code, .. } | Self::Query { code, .. } => *code,
            _ => None,
        }
    }

    pub(crate) fn from_statement(phase: QueryPhase, err: DbError) -> Self {
        match err {
            DbError::Statement { code, message } | DbError::Connect { code, message } => {
                Self::Query {
                    phase,
                    code,
                    message,
                }
            }
            DbError::Config(message) => Self::Config(message),
        }
    }
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection {
                code: Some(code),
                message,
            } => write!(f, "failed to connect to MySQL (code {code}): {message}"),
            Self::Connection { code: None, message } => {
                write!(f, "failed to connect to MySQL: {message}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query {
                phase,
                code,
                message,
            } => {
                write!(f, "no valid result from database ({} query", phase.as_str())?;
                if let Some(code) = code {
                    write!(f, ", code {code}")?;
                }
                write!(f, "): {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid search result: {message}"),
            Self::Config(message) => write!(f, "invalid connection settings: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<QueryValidationError> for SearchError {
    fn from(value: QueryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for SearchError {
    /// Connection-time conversion; statement failures go through the
    /// phase-aware mapping inside the executor.
    fn from(value: DbError) -> Self {
        match value {
            DbError::Connect { code, message } => Self::Connection { code, message },
            DbError::Statement { code, message } => Self::Query {
                phase: QueryPhase::Data,
                code,
                message,
            },
            DbError::Config(message) => Self::Config(message),
        }
    }
}
