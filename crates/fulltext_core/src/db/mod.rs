//! Database driver seam.
//!
//! # Responsibility
//! - Define the two capabilities search execution needs from a driver:
//!   string escaping and row-returning statement execution.
//! - Keep query composition independent from any live connection.
//!
//! # Invariants
//! - A `SqlConnection` is used by one executor at a time (`&mut self`).
//! - Escaping never fails and never touches the network.

use crate::model::row::ResultRow;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod config;
#[cfg(feature = "mysql")]
pub mod mysql;

pub use config::ConnectionConfig;

pub type DbResult<T> = Result<T, DbError>;

/// Driver-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Connection could not be established.
    Connect {
        /// Server or client (`CR_*`) error code, when the driver provides one.
        code: Option<u16>,
        message: String,
    },
    /// A statement was rejected or failed mid-flight.
    Statement { code: Option<u16>, message: String },
    /// Connection settings could not be resolved.
    Config(String),
}

impl DbError {
    /// Native driver error code, if any.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Connect { code, .. } | Self::Statement { code, .. } => *code,
            Self::Config(_) => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect {
                code: Some(code),
                message,
            } => write!(f, "failed to connect to database (code {code}): {message}"),
            Self::Connect { code: None, message } => {
                write!(f, "failed to connect to database: {message}")
            }
            Self::Statement {
                code: Some(code),
                message,
            } => write!(f, "statement failed (code {code}): {message}"),
            Self::Statement { code: None, message } => write!(f, "statement failed: {message}"),
            Self::Config(message) => write!(f, "invalid connection settings: {message}"),
        }
    }
}

impl Error for DbError {}

/// String-escaping capability used while composing SQL literals.
///
/// Implemented for any `Fn(&str) -> String`, so plain functions such as
/// [`escape_mysql_string`] and test closures can stand in for a connection.
pub trait SqlEscape {
    fn escape(&self, value: &str) -> String;
}

impl<F> SqlEscape for F
where
    F: Fn(&str) -> String,
{
    fn escape(&self, value: &str) -> String {
        self(value)
    }
}

/// Blocking connection able to run one statement and return owned rows.
pub trait SqlConnection: SqlEscape {
    fn query_rows(&mut self, sql: &str) -> DbResult<Vec<ResultRow>>;
}

/// Escapes a string for a single-quoted MySQL literal.
///
/// Matches `mysql_real_escape_string` for UTF-8 connections with
/// `NO_BACKSLASH_ESCAPES` disabled. Live connections escape according to
/// their own session mode instead.
pub fn escape_mysql_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\x1a' => escaped.push_str("\\Z"),
            other => escaped.push(other),
        }
    }
    escaped
}
