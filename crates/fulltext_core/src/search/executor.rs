//! Two-phase search execution over an owned connection.
//!
//! # Responsibility
//! - Validate the bound query before any database round-trip.
//! - Run the count statement, then the data statement.
//! - Keep the last successful result for inspection.
//!
//! # Invariants
//! - The data statement is never sent when the count statement fails.
//! - A failed run leaves no result behind (no partial results).
//! - Every `execute` call queries the database again; nothing is cached.

use super::query::SearchQuery;
use super::{QueryPhase, QueryValidationError, SearchError, SearchResult};
use crate::db::SqlConnection;
use crate::model::row::ResultRow;
use log::{error, info, trace};
use serde::Serialize;
use std::time::Instant;

#[cfg(feature = "mysql")]
use crate::db::config::ConnectionConfig;
#[cfg(feature = "mysql")]
use crate::db::mysql::MysqlConnection;

/// Lifecycle of a [`Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No query bound yet.
    Unconfigured,
    /// A query is bound but has not produced a result.
    QueryBound,
    /// The bound query ran successfully; a result is available.
    Executed,
}

/// Rows and counts produced by one successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResultSet {
    /// Rows in SQL result order.
    pub rows: Vec<ResultRow>,
    /// Number of returned rows (`rows.len()`).
    pub matched_row_count: usize,
    /// Matching rows ignoring LIMIT/OFFSET, for pagination.
    pub total_row_count: u64,
}

/// Search executor owning one database connection.
pub struct Search<C: SqlConnection> {
    conn: C,
    query: Option<SearchQuery>,
    result: Option<SearchResultSet>,
}

impl<C: SqlConnection> Search<C> {
    /// Adopts an existing connection.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            query: None,
            result: None,
        }
    }

    /// Binds the query to run, replacing any previous query and result.
    pub fn set_query(&mut self, query: SearchQuery) {
        self.query = Some(query);
        self.result = None;
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn state(&self) -> SearchState {
        match (&self.query, &self.result) {
            (None, _) => SearchState::Unconfigured,
            (Some(_), None) => SearchState::QueryBound,
            (Some(_), Some(_)) => SearchState::Executed,
        }
    }

    /// Checks a query is bound and that it validates.
    pub fn validate(&self) -> SearchResult<()> {
        match &self.query {
            Some(query) => query.validate(),
            None => Err(QueryValidationError::MissingQuery.into()),
        }
    }

    /// Runs the bound query and returns the matched rows.
    ///
    /// The rows, matched count and total count stay available through
    /// [`Search::result`] until the next `execute` or `set_query`.
    ///
    /// # Errors
    /// - [`SearchError::Validation`] when no query is bound or it is invalid.
    ///   The connection is not touched in that case.
    /// - [`SearchError::Query`] when the count or the data statement fails.
    /// - [`SearchError::InvalidData`] when the count column cannot be read.
    pub fn execute(&mut self) -> SearchResult<&[ResultRow]> {
        self.result = None;
        let query = self
            .query
            .as_ref()
            .ok_or(QueryValidationError::MissingQuery)?;
        query.validate()?;

        let started_at = Instant::now();
        info!(
            "event=search_execute module=search status=start directives={} where_clauses={}",
            query.directives().len(),
            query.where_clauses().len()
        );

        let count_sql = query.compose_count_query(&self.conn);
        trace!("event=search_sql module=search phase=count sql={count_sql}");
        let count_rows = run_phase(&mut self.conn, QueryPhase::Count, &count_sql, started_at)?;
        let total_row_count = read_total_count(&count_rows)?;

        let data_sql = query.compose(&self.conn);
        trace!("event=search_sql module=search phase=data sql={data_sql}");
        let rows = run_phase(&mut self.conn, QueryPhase::Data, &data_sql, started_at)?;

        info!(
            "event=search_execute module=search status=ok matched_rows={} total_rows={} duration_ms={}",
            rows.len(),
            total_row_count,
            started_at.elapsed().as_millis()
        );

        let result = self.result.insert(SearchResultSet {
            matched_row_count: rows.len(),
            total_row_count,
            rows,
        });
        Ok(&result.rows)
    }

    /// Last successful result.
    pub fn result(&self) -> Option<&SearchResultSet> {
        self.result.as_ref()
    }

    /// Rows of the last successful run; empty before the first run.
    pub fn rows(&self) -> &[ResultRow] {
        self.result
            .as_ref()
            .map(|result| result.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn matched_row_count(&self) -> Option<usize> {
        self.result.as_ref().map(|result| result.matched_row_count)
    }

    pub fn total_row_count(&self) -> Option<u64> {
        self.result.as_ref().map(|result| result.total_row_count)
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Driver access, e.g. for session settings such as the charset.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }
}

#[cfg(feature = "mysql")]
impl Search<MysqlConnection> {
    /// Connects to MySQL with explicit settings.
    ///
    /// # Errors
    /// - [`SearchError::Connection`] with the driver's native error code.
    pub fn connect(config: &ConnectionConfig) -> SearchResult<Self> {
        let conn = MysqlConnection::connect(config)?;
        Ok(Self::new(conn))
    }

    /// Connects to MySQL with settings from the environment.
    ///
    /// See [`ConnectionConfig::from_env`] for the variables and `.env` handling.
    pub fn connect_from_env() -> SearchResult<Self> {
        let config = ConnectionConfig::from_env()?;
        Self::connect(&config)
    }
}

fn run_phase<C: SqlConnection>(
    conn: &mut C,
    phase: QueryPhase,
    sql: &str,
    started_at: Instant,
) -> SearchResult<Vec<ResultRow>> {
    conn.query_rows(sql).map_err(|err| {
        error!(
            "event=search_execute module=search status=error phase={} duration_ms={} error_code={} error={}",
            phase.as_str(),
            started_at.elapsed().as_millis(),
            err.code().map_or_else(|| "none".to_string(), |code| code.to_string()),
            err
        );
        SearchError::from_statement(phase, err)
    })
}

fn read_total_count(rows: &[ResultRow]) -> SearchResult<u64> {
    let value = rows
        .first()
        .and_then(|row| row.value_at(0))
        .ok_or_else(|| SearchError::InvalidData("count query returned no rows".to_string()))?;

    value
        .as_u64()
        .ok_or_else(|| SearchError::InvalidData(format!("count column is not a row count: {value:?}")))
}
