//! Ranked boolean-mode fulltext search over MySQL tables.
//!
//! Build a [`SearchQuery`] from search directives, bind it to a [`Search`]
//! executor and run it; the executor reports matched rows plus the total
//! match count for pagination.

pub mod db;
pub mod logging;
pub mod model;
pub mod search;

pub use db::{escape_mysql_string, ConnectionConfig, DbError, DbResult, SqlConnection, SqlEscape};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::directive::{sanitize_term, SearchDirective, SearchOperator};
pub use model::row::{ResultRow, SqlValue};
pub use search::executor::{Search, SearchResultSet, SearchState};
pub use search::query::{SearchQuery, SortDirection, RELEVANCE_COLUMN};
pub use search::{QueryPhase, QueryValidationError, SearchError, SearchResult};

#[cfg(feature = "mysql")]
pub use db::mysql::MysqlConnection;
