use fulltext_core::{
    escape_mysql_string, sanitize_term, QueryValidationError, SearchError, SearchOperator,
    SearchQuery, SortDirection,
};
use std::cell::Cell;

const EXAMPLE_MATCH: &str =
    "MATCH(description) AGAINST ('+example another -again ' IN BOOLEAN MODE)";

fn example_query() -> SearchQuery {
    SearchQuery::new()
        .set_table("testdata")
        .set_search_fields("description")
        .must_include("example")
        .can_include("another")
        .exclude("again")
}

#[test]
fn directives_render_in_insertion_order() {
    assert_eq!(example_query().boolean_terms(), "+example another -again ");
}

#[test]
fn compose_renders_relevance_select_and_order() {
    let sql = example_query().compose(&escape_mysql_string);

    assert_eq!(
        sql,
        format!(
            "SELECT *, {EXAMPLE_MATCH} AS relevance FROM testdata WHERE {EXAMPLE_MATCH} ORDER BY relevance DESC"
        )
    );
}

#[test]
fn compose_count_query_has_no_columns_order_or_pagination() {
    let sql = example_query()
        .limit(10)
        .offset(30)
        .compose_count_query(&escape_mysql_string);

    assert_eq!(
        sql,
        format!("SELECT COUNT(*) FROM testdata WHERE {EXAMPLE_MATCH}")
    );
}

#[test]
fn compose_is_idempotent() {
    let query = example_query().limit(5);

    let first = query.compose(&escape_mysql_string);
    let second = query.compose(&escape_mysql_string);

    assert_eq!(first, second);
    assert_eq!(first.matches(" AS relevance").count(), 1);
    assert_eq!(query.select_fields(), ["*"]);
}

#[test]
fn custom_order_drops_relevance_column() {
    let sql = example_query()
        .set_select_fields(["id", "title"])
        .order_by("title", SortDirection::Asc)
        .compose(&escape_mysql_string);

    assert_eq!(
        sql,
        format!("SELECT id, title FROM testdata WHERE {EXAMPLE_MATCH} ORDER BY title ASC")
    );
}

#[test]
fn relevance_can_be_sorted_ascending() {
    let sql = example_query()
        .order_by("relevance", SortDirection::Asc)
        .compose(&escape_mysql_string);

    assert!(sql.starts_with(&format!("SELECT *, {EXAMPLE_MATCH} AS relevance FROM")));
    assert!(sql.ends_with("ORDER BY relevance ASC"));
}

#[test]
fn where_clauses_are_anded_verbatim_in_both_statements() {
    let query = example_query()
        .add_where("published = 1")
        .add_where("category_id IN (3, 4)");

    let count_sql = query.compose_count_query(&escape_mysql_string);
    let data_sql = query.compose(&escape_mysql_string);

    let expected_where =
        format!("WHERE {EXAMPLE_MATCH} AND published = 1 AND category_id IN (3, 4)");
    assert!(count_sql.ends_with(&expected_where));
    assert!(data_sql.contains(&format!("{expected_where} ORDER BY relevance DESC")));
}

#[test]
fn limit_and_offset_are_rendered_after_order() {
    let sql = example_query().limit(10).offset(20).compose(&escape_mysql_string);
    assert!(sql.ends_with("ORDER BY relevance DESC LIMIT 10 OFFSET 20"));

    let sql = example_query().limit(0).compose(&escape_mysql_string);
    assert!(sql.ends_with("ORDER BY relevance DESC LIMIT 0"));
}

#[test]
fn terms_and_fields_go_through_the_escaper() {
    let calls = Cell::new(0_usize);
    let tagging = |value: &str| {
        calls.set(calls.get() + 1);
        format!("<{value}>")
    };

    let query = SearchQuery::new()
        .set_table("docs")
        .set_search_fields("title, body")
        .must_include("rust");

    assert_eq!(
        query.compose_match_expression(&tagging),
        "MATCH(<title, body>) AGAINST ('<+rust >' IN BOOLEAN MODE)"
    );
    assert_eq!(calls.get(), 2);
}

#[test]
fn quotes_in_terms_cannot_break_out_of_the_literal() {
    let sql = SearchQuery::new()
        .set_table("docs")
        .set_search_fields("body")
        .can_include("o'brien\\")
        .compose_count_query(&escape_mysql_string);

    assert_eq!(
        sql,
        "SELECT COUNT(*) FROM docs WHERE MATCH(body) AGAINST ('o\\'brien\\\\ ' IN BOOLEAN MODE)"
    );
}

#[test]
fn every_directive_kind_renders_its_operator() {
    let query = SearchQuery::new()
        .must_include("a")
        .exclude("b")
        .can_include("c")
        .prefer_without("d")
        .rank_higher("e")
        .rank_lower("f")
        .must_contain_phrase("some words")
        .must_include_wildcard("pre");

    assert_eq!(
        query.boolean_terms(),
        "+a -b c ~d >e <f \"some words\" +pre* "
    );
    let operators: Vec<_> = query.directives().iter().map(|d| d.operator()).collect();
    assert_eq!(
        operators,
        [
            SearchOperator::Require,
            SearchOperator::Exclude,
            SearchOperator::Optional,
            SearchOperator::Demote,
            SearchOperator::RankUp,
            SearchOperator::RankDown,
            SearchOperator::Phrase,
            SearchOperator::Wildcard,
        ]
    );
}

#[test]
fn terms_are_sanitized_before_decoration() {
    let query = SearchQuery::new()
        .must_include("+(nested)")
        .must_include_wildcard("exa**")
        .must_contain_phrase("\"quoted phrase\"");

    assert_eq!(query.boolean_terms(), "+nested +exa* \"quoted phrase\" ");
    assert_eq!(query.directives()[0].raw_term(), "+(nested)");
}

#[test]
fn sanitize_term_is_pure_and_idempotent() {
    for input in ["c++->rust", "@mention", "a~b*c", "(x)", "  spaced  "] {
        let once = sanitize_term(input);
        assert_eq!(sanitize_term(input), once);
        assert_eq!(sanitize_term(&once), once);
        assert!(!once.contains(['+', '-', '>', '<', '(', ')', '~', '*', '"', '@']));
    }
    assert_eq!(sanitize_term("c++->rust"), "c rust");
    assert_eq!(sanitize_term("c++ -> rust"), "c    rust");
}

#[test]
fn validate_rejects_query_without_directives() {
    let err = SearchQuery::new()
        .set_table("testdata")
        .set_search_fields("description")
        .validate()
        .unwrap_err();

    assert_eq!(
        err,
        SearchError::Validation(QueryValidationError::NoSearchConditions)
    );
    assert!(!err.is_empty_term());
}

#[test]
fn validate_reports_empty_terms_distinctly() {
    let err = SearchQuery::new().must_include("   ").validate().unwrap_err();
    assert!(err.is_empty_term());

    let err = SearchQuery::new()
        .must_include("fine")
        .exclude("+-*")
        .validate()
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::Validation(QueryValidationError::EmptySearchTerm {
            position: 1,
            raw_term: "+-*".to_string(),
        })
    );
}

#[test]
fn validate_accepts_a_single_term() {
    SearchQuery::new().must_include("example").validate().unwrap();
}

#[test]
fn builder_values_are_independent_after_clone() {
    let base = example_query();
    let narrowed = base.clone().add_where("published = 1").limit(3);

    assert!(base.where_clauses().is_empty());
    assert_eq!(base.limit_value(), None);
    assert_eq!(narrowed.where_clauses(), ["published = 1"]);
    assert_eq!(narrowed.limit_value(), Some(3));
}
