//! Search token compiler.
//!
//! Users search with a flat list of tokens:
//!
//! - free text (`tatort`) matches sender, topic, title or description
//! - keyword filters (`sender:ARD`, `thema:Krimi`, `datum:>=1.1.24`)
//! - connectives `und`/`and`, `oder`/`or` and the grouping tokens `(` `)`
//!
//! [`compile`] turns the list into a single `SELECT` over the record table.
//! Without an explicit connective, a keyword filter joins with `and` and free
//! text joins with `or`. A list starting with `select` is passed through
//! untouched.

mod date;
mod error;

use std::fmt;

use tracing::debug;

use crate::db::RECORDS_TABLE;

pub use error::QueryError;

/// Columns searched by a free-text token.
pub const FREE_TEXT_COLUMNS: [&str; 4] = ["sender", "topic", "title", "description"];

const RAW_QUERY_PREFIX: &str = "select";
const KEY_SEPARATOR: char = ':';

/// A complete query string ready to run against the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery(String);

impl CompiledQuery {
    /// The SQL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the query and returns the SQL text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Open,
    Close,
    And,
    Or,
}

impl Operator {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "(" => Some(Self::Open),
            ")" => Some(Self::Close),
            "und" | "and" => Some(Self::And),
            "oder" | "or" => Some(Self::Or),
            _ => None,
        }
    }

    fn is_connective(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Open => "(",
            Self::Close => ")",
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

/// Accumulated clause plus the one-slot operator buffer.
///
/// A connective arriving while another connective is pending replaces it. A
/// grouping token on either side flushes the pending operator first, so no
/// parenthesis is ever lost.
#[derive(Debug, Default)]
struct ClauseBuilder {
    clause: String,
    pending: Option<Operator>,
    /// The clause ends in a predicate or `)`, so the next term needs a connective.
    needs_connective: bool,
}

impl ClauseBuilder {
    fn push_operator(&mut self, operator: Operator) {
        match self.pending {
            Some(pending) if pending.is_connective() && operator.is_connective() => {}
            Some(pending) => self.flush(pending, Operator::And),
            None => {}
        }
        self.pending = Some(operator);
    }

    fn push_predicate(&mut self, predicate: &str, default: Operator) {
        if let Some(pending) = self.pending.take() {
            self.flush(pending, default);
        }
        if self.needs_connective {
            self.clause.push_str(default.as_sql());
        }
        self.clause.push_str(predicate);
        self.needs_connective = true;
    }

    /// Writes `operator` into the clause. A connective with nothing to join
    /// on its left is dropped.
    fn flush(&mut self, operator: Operator, default: Operator) {
        match operator {
            Operator::Open => {
                if self.needs_connective {
                    self.clause.push_str(default.as_sql());
                }
                self.clause.push_str(Operator::Open.as_sql());
                self.needs_connective = false;
            }
            Operator::Close => {
                self.clause.push_str(Operator::Close.as_sql());
                self.needs_connective = true;
            }
            Operator::And | Operator::Or => {
                if self.needs_connective {
                    self.clause.push_str(operator.as_sql());
                    self.needs_connective = false;
                }
            }
        }
    }

    fn finish(mut self) -> String {
        if let Some(operator) = self.pending.take() {
            self.flush(operator, Operator::And);
        }
        self.clause
    }
}

/// Compiles search tokens into a query over the record table.
///
/// # Errors
///
/// Returns [`QueryError::InvalidDate`] when a date filter value is not a
/// `day.month.year` date.
///
/// # Example
///
/// ```
/// use mtv_core::query::compile;
///
/// let query = compile(&["sender:ARD", "und", "datum:01.01.23-31.01.23"]).unwrap();
/// assert_eq!(
///     query.as_str(),
///     "SELECT * FROM records WHERE (sender like '%ARD%') and \
///      (date >= '2023-01-01' and date <= '2023-01-31')"
/// );
/// ```
pub fn compile<S: AsRef<str>>(tokens: &[S]) -> Result<CompiledQuery, QueryError> {
    let Some(first) = tokens.first() else {
        return Ok(CompiledQuery(format!("SELECT * FROM {RECORDS_TABLE}")));
    };
    if first
        .as_ref()
        .get(..RAW_QUERY_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(RAW_QUERY_PREFIX))
    {
        let raw = tokens.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
        debug!(query = %raw, "passing raw query through");
        return Ok(CompiledQuery(raw));
    }

    let mut builder = ClauseBuilder::default();
    for token in tokens.iter().map(AsRef::as_ref) {
        if let Some(operator) = Operator::parse(token) {
            builder.push_operator(operator);
        } else if let Some((key, value)) = token.split_once(KEY_SEPARATOR) {
            let predicate = keyword_predicate(token, key, value)?;
            builder.push_predicate(&predicate, Operator::And);
        } else {
            builder.push_predicate(&free_text_predicate(token), Operator::Or);
        }
    }

    let sql = format!("SELECT * FROM {RECORDS_TABLE} WHERE {}", builder.finish());
    debug!(query = %sql, "compiled search");
    Ok(CompiledQuery(sql))
}

/// Maps a filter key to its column; unknown keys are used as given.
fn column_for_key(key: &str) -> &str {
    match key.to_lowercase().as_str() {
        "sender" => "sender",
        "thema" | "topic" => "topic",
        "titel" | "title" => "title",
        "datum" | "date" => "date",
        "zeit" | "time" => "time",
        "dauer" | "duration" => "duration",
        "groesse" | "größe" | "size" => "size",
        "beschreibung" | "description" => "description",
        "website" => "website",
        "url" => "url",
        "geo" => "geo",
        "neu" | "new" => "is_new",
        _ => key,
    }
}

fn keyword_predicate(token: &str, key: &str, value: &str) -> Result<String, QueryError> {
    let column = column_for_key(key);
    if column == "date" {
        date::date_predicate(token, column, value)
    } else {
        Ok(format!("({column} like '%{}%')", escape_literal(value)))
    }
}

fn free_text_predicate(token: &str) -> String {
    let text = escape_literal(token);
    let alternatives = FREE_TEXT_COLUMNS
        .iter()
        .map(|column| format!("{column} like '%{text}%'"))
        .collect::<Vec<_>>()
        .join(" or ");
    format!("({alternatives})")
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
