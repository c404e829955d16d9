//! Command-line front end for boolean-mode fulltext searches.
//!
//! # Responsibility
//! - Map flags onto a `SearchQuery`.
//! - Either print the composed SQL (`--print-sql`) or run it against MySQL.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fulltext_core::{
    default_log_level, escape_mysql_string, init_logging, init_stderr_logging, ConnectionConfig,
    Search, SearchQuery, SortDirection,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fulltext")]
#[command(about = "Ranked boolean-mode fulltext search against a MySQL table")]
struct Args {
    /// Table to search.
    #[arg(long)]
    table: String,

    /// Columns covered by the FULLTEXT index (e.g. "title, description").
    #[arg(long)]
    fields: String,

    /// Word every row must contain.
    #[arg(long = "must", value_name = "TERM")]
    must_include: Vec<String>,

    /// Optional word that ranks rows higher.
    #[arg(long = "can", value_name = "TERM")]
    can_include: Vec<String>,

    /// Word no row may contain.
    #[arg(long, value_name = "TERM")]
    exclude: Vec<String>,

    /// Word that ranks rows lower without excluding them.
    #[arg(long, value_name = "TERM")]
    prefer_without: Vec<String>,

    /// Word with increased relevance contribution.
    #[arg(long, value_name = "TERM")]
    rank_higher: Vec<String>,

    /// Word with decreased relevance contribution.
    #[arg(long, value_name = "TERM")]
    rank_lower: Vec<String>,

    /// Literal phrase.
    #[arg(long, value_name = "PHRASE")]
    phrase: Vec<String>,

    /// Required word prefix (matches "exa" as "exa*").
    #[arg(long, value_name = "PREFIX")]
    wildcard: Vec<String>,

    /// Raw SQL predicate ANDed into the WHERE clause. Not escaped.
    #[arg(long = "where", value_name = "PREDICATE")]
    where_clauses: Vec<String>,

    /// Comma-separated output columns.
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// Order column; "relevance" orders by match score.
    #[arg(long, default_value = "relevance")]
    order_by: String,

    /// Sort direction (asc|desc).
    #[arg(long, default_value = "desc")]
    direction: SortDirection,

    #[arg(long)]
    limit: Option<u64>,

    #[arg(long)]
    offset: Option<u64>,

    /// Print the count and data statements instead of running them.
    #[arg(long)]
    print_sql: bool,

    #[arg(long, env = "DATABASE_HOST")]
    host: Option<String>,

    #[arg(long, env = "DATABASE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "DATABASE_USERNAME")]
    user: Option<String>,

    #[arg(long, env = "DATABASE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "DATABASE_NAME")]
    database: Option<String>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr otherwise.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn search_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new()
            .set_table(self.table.as_str())
            .set_search_fields(self.fields.as_str());

        if !self.select.is_empty() {
            query = query.set_select_fields(self.select.iter().map(|field| field.trim()));
        }

        for term in &self.must_include {
            query = query.must_include(term.as_str());
        }
        for term in &self.can_include {
            query = query.can_include(term.as_str());
        }
        for term in &self.exclude {
            query = query.exclude(term.as_str());
        }
        for term in &self.prefer_without {
            query = query.prefer_without(term.as_str());
        }
        for term in &self.rank_higher {
            query = query.rank_higher(term.as_str());
        }
        for term in &self.rank_lower {
            query = query.rank_lower(term.as_str());
        }
        for term in &self.phrase {
            query = query.must_contain_phrase(term.as_str());
        }
        for term in &self.wildcard {
            query = query.must_include_wildcard(term.as_str());
        }
        for predicate in &self.where_clauses {
            query = query.add_where(predicate.as_str());
        }

        query = query.order_by(self.order_by.as_str(), self.direction);
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        query
    }

    /// Explicit flags win; with none given, settings come from the environment.
    fn connection_config(&self) -> Result<ConnectionConfig> {
        match (&self.host, &self.user, &self.database) {
            (None, None, None) if self.password.is_none() => {
                ConnectionConfig::from_env().context("resolving connection settings")
            }
            (Some(host), Some(user), Some(database)) => {
                let config = ConnectionConfig::new(
                    host.as_str(),
                    user.as_str(),
                    self.password.clone().unwrap_or_default(),
                    database.as_str(),
                );
                Ok(match self.port {
                    Some(port) => config.with_port(port),
                    None => config,
                })
            }
            _ => bail!("--host, --user and --database must be given together"),
        }
    }
}

fn init_cli_logging(args: &Args) -> Result<()> {
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    match &args.log_dir {
        Some(dir) => init_logging(level, dir)?,
        None => init_stderr_logging(level)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_cli_logging(&args)?;

    let query = args.search_query();
    query.validate()?;

    if args.print_sql {
        println!("{};", query.compose_count_query(&escape_mysql_string));
        println!("{};", query.compose(&escape_mysql_string));
        return Ok(());
    }

    let config = args.connection_config()?;
    info!(
        "event=cli_search module=cli status=start host={} database={}",
        config.host, config.database
    );

    let mut search = Search::connect(&config)?;
    search.set_query(query);
    search.execute()?;

    let matched = search.matched_row_count().unwrap_or_default();
    if matched > 0 {
        println!(
            "There are {matched} rows that match your search ({} total).",
            search.total_row_count().unwrap_or_default()
        );
        for row in search.rows() {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        println!("No results.");
    }

    Ok(())
}
