//! Boolean-mode search query builder and SQL composer.
//!
//! # Responsibility
//! - Accumulate search directives, raw predicates, ordering and pagination.
//! - Render the count and data statements for MySQL.
//!
//! # Invariants
//! - Terms are sanitized once, when a directive is added.
//! - Composition never mutates the builder; repeated calls render identical SQL.
//! - Search terms and the search field list pass through the injected escaper.
//! - `add_where` predicates are rendered verbatim; callers own their safety.

use super::{QueryValidationError, SearchResult};
use crate::db::SqlEscape;
use crate::model::directive::{SearchDirective, SearchOperator};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Ordering column that selects the computed `MATCH` score.
pub const RELEVANCE_COLUMN: &str = "relevance";

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unsupported sort direction `{other}`; expected asc|desc")),
        }
    }
}

/// Builder for one ranked boolean-mode fulltext search.
///
/// Setters consume and return the builder, so a configured query is a plain
/// value that can be cloned and reused without aliasing.
///
/// ```
/// use fulltext_core::{escape_mysql_string, SearchQuery};
///
/// let query = SearchQuery::new()
///     .set_table("testdata")
///     .set_search_fields("description")
///     .must_include("example")
///     .can_include("another")
///     .exclude("again");
///
/// assert_eq!(
///     query.compose_count_query(&escape_mysql_string),
///     "SELECT COUNT(*) FROM testdata WHERE MATCH(description) \
///      AGAINST ('+example another -again ' IN BOOLEAN MODE)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    table: String,
    search_fields: String,
    select_fields: Vec<String>,
    directives: Vec<SearchDirective>,
    where_clauses: Vec<String>,
    order_by: String,
    direction: SortDirection,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            table: String::new(),
            search_fields: String::new(),
            select_fields: vec!["*".to_string()],
            directives: Vec::new(),
            where_clauses: Vec::new(),
            order_by: RELEVANCE_COLUMN.to_string(),
            direction: SortDirection::Desc,
            limit: None,
            offset: None,
        }
    }
}

impl SearchQuery {
    /// Creates an empty query selecting `*`, ordered by relevance descending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table to search.
    pub fn set_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the `MATCH` column list, e.g. `"title, description"`.
    ///
    /// The columns must be covered by one FULLTEXT index.
    pub fn set_search_fields(mut self, fields: impl Into<String>) -> Self {
        self.search_fields = fields.into();
        self
    }

    /// Replaces the default `*` column list.
    pub fn set_select_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Every returned row must contain this word.
    pub fn must_include(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Require, term)
    }

    /// No returned row may contain this word.
    pub fn exclude(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Exclude, term)
    }

    /// Optional word; rows containing it rank higher.
    pub fn can_include(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Optional, term)
    }

    /// Rows containing this word rank lower but are still returned.
    pub fn prefer_without(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Demote, term)
    }

    /// Increases the word's contribution to relevance.
    pub fn rank_higher(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::RankUp, term)
    }

    /// Decreases the word's contribution to relevance.
    pub fn rank_lower(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::RankDown, term)
    }

    /// Matches the words literally, in the given order.
    pub fn must_contain_phrase(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Phrase, term)
    }

    /// Every returned row must contain a word starting with `term`.
    ///
    /// A `*` inside `term` is stripped; the trailing `*` is always added.
    pub fn must_include_wildcard(self, term: impl Into<String>) -> Self {
        self.push_directive(SearchOperator::Wildcard, term)
    }

    /// Appends a pre-built directive.
    pub fn add_directive(mut self, directive: SearchDirective) -> Self {
        self.directives.push(directive);
        self
    }

    /// ANDs a raw SQL predicate into the WHERE clause.
    ///
    /// The predicate is rendered verbatim and is **not** escaped. Never pass
    /// unchecked user input here.
    pub fn add_where(mut self, predicate: impl Into<String>) -> Self {
        self.where_clauses.push(predicate.into());
        self
    }

    /// Orders by `field` instead of relevance.
    ///
    /// Passing [`RELEVANCE_COLUMN`] restores relevance ordering.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = field.into();
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn push_directive(mut self, operator: SearchOperator, term: impl Into<String>) -> Self {
        self.directives.push(SearchDirective::new(operator, term));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn search_fields(&self) -> &str {
        &self.search_fields
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn directives(&self) -> &[SearchDirective] {
        &self.directives
    }

    pub fn where_clauses(&self) -> &[String] {
        &self.where_clauses
    }

    pub fn ordering(&self) -> (&str, SortDirection) {
        (&self.order_by, self.direction)
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether the data statement selects and orders by the `MATCH` score.
    pub fn orders_by_relevance(&self) -> bool {
        self.order_by == RELEVANCE_COLUMN
    }

    /// Checks the query has something to search for.
    ///
    /// # Errors
    /// - [`QueryValidationError::NoSearchConditions`] when no directive was added.
    /// - [`QueryValidationError::EmptySearchTerm`] for the first directive whose
    ///   term is empty after sanitization.
    pub fn validate(&self) -> SearchResult<()> {
        if self.directives.is_empty() {
            return Err(QueryValidationError::NoSearchConditions.into());
        }

        if let Some((position, directive)) = self
            .directives
            .iter()
            .enumerate()
            .find(|(_, directive)| directive.is_empty())
        {
            return Err(QueryValidationError::EmptySearchTerm {
                position,
                raw_term: directive.raw_term().to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Unescaped `AGAINST` string: each rendered directive followed by a space.
    pub fn boolean_terms(&self) -> String {
        self.directives
            .iter()
            .map(|directive| directive.render() + " ")
            .collect()
    }

    /// `MATCH(<fields>) AGAINST ('<terms>' IN BOOLEAN MODE)`.
    pub fn compose_match_expression(&self, escaper: &dyn SqlEscape) -> String {
        format!(
            "MATCH({}) AGAINST ('{}' IN BOOLEAN MODE)",
            escaper.escape(&self.search_fields),
            escaper.escape(&self.boolean_terms())
        )
    }

    /// Row-count statement, ignoring ordering and pagination.
    pub fn compose_count_query(&self, escaper: &dyn SqlEscape) -> String {
        let match_expression = self.compose_match_expression(escaper);
        let mut sql = format!("SELECT COUNT(*) FROM {} WHERE {match_expression}", self.table);
        self.push_where_clauses(&mut sql);
        sql
    }

    /// Data statement with ordering and pagination.
    pub fn compose(&self, escaper: &dyn SqlEscape) -> String {
        let match_expression = self.compose_match_expression(escaper);

        let mut columns = if self.select_fields.is_empty() {
            "*".to_string()
        } else {
            self.select_fields.join(", ")
        };
        if self.orders_by_relevance() {
            columns.push_str(&format!(", {match_expression} AS {RELEVANCE_COLUMN}"));
        }

        let mut sql = format!(
            "SELECT {columns} FROM {} WHERE {match_expression}",
            self.table
        );
        self.push_where_clauses(&mut sql);
        sql.push_str(&format!(" ORDER BY {} {}", self.order_by, self.direction));

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // MySQL only accepts OFFSET after LIMIT; this is its documented
            // "all remaining rows" bound.
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {offset}", u64::MAX));
            }
            (None, None) => {}
        }

        sql
    }

    fn push_where_clauses(&self, sql: &mut String) {
        for predicate in &self.where_clauses {
            sql.push_str(" AND ");
            sql.push_str(predicate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchQuery, SortDirection};

    fn identity(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn sort_direction_parses_case_insensitively() {
        assert_eq!("ASC".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert_eq!(" desc ".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn boolean_terms_keep_insertion_order_and_trailing_space() {
        let query = SearchQuery::new()
            .rank_lower("low")
            .must_include_wildcard("pre")
            .rank_higher("high");
        assert_eq!(query.boolean_terms(), "<low +pre* >high ");
    }

    #[test]
    fn empty_select_list_falls_back_to_star() {
        let query = SearchQuery::new()
            .set_table("t")
            .set_search_fields("c")
            .set_select_fields(Vec::<String>::new())
            .can_include("x")
            .order_by("id", SortDirection::Asc);
        assert_eq!(
            query.compose(&identity),
            "SELECT * FROM t WHERE MATCH(c) AGAINST ('x ' IN BOOLEAN MODE) ORDER BY id ASC"
        );
    }

    #[test]
    fn offset_without_limit_uses_unbounded_limit() {
        let query = SearchQuery::new()
            .set_table("t")
            .set_search_fields("c")
            .can_include("x")
            .order_by("id", SortDirection::Desc)
            .offset(20);
        assert!(query
            .compose(&identity)
            .ends_with(" ORDER BY id DESC LIMIT 18446744073709551615 OFFSET 20"));
    }
}
