//! Query matching for Tabula.
//!
//! A search string is tokenized (see [`crate::tokenizer`]) and every token
//! becomes a matcher. A row is visible when all matchers accept it:
//!
//! - `text` - a global token, matched against every column of the row
//! - `key:value` - a scoped token, matched only against columns whose
//!   display name contains `key`
//!
//! All comparisons are case-insensitive substring tests. A `+` inside a
//! token stands for a space, so `index+times+ten:20` addresses the column
//! labelled "Index times ten".

use crate::tokenizer::tokenize;
use crate::types::{cell, Column, Row};
use std::sync::Arc;

/// A classified query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    /// Matched against every column
    Global(String),

    /// Matched only against columns whose name contains `key`
    Scoped { key: String, value: String },
}

impl QueryToken {
    /// Classify a raw token. The first `:` splits a scoped token.
    pub fn parse(token: &str) -> Self {
        match token.split_once(':') {
            Some((key, value)) => QueryToken::Scoped {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => QueryToken::Global(token.to_string()),
        }
    }

    fn matcher(&self) -> Arc<dyn Matcher> {
        match self {
            QueryToken::Global(text) => Arc::new(GlobalMatcher::new(text)),
            QueryToken::Scoped { key, value } => Arc::new(ScopedMatcher::new(key, value)),
        }
    }
}

/// A compiled search query ready for matching.
///
/// Queries are compiled once per search-string change and reused for every
/// row of the dataset.
#[derive(Clone, Default)]
pub struct SearchQuery {
    tokens: Vec<QueryToken>,
    matchers: Vec<Arc<dyn Matcher>>,
}

impl std::fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQuery")
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl SearchQuery {
    /// Tokenize and compile a raw search string.
    ///
    /// # Example
    /// ```
    /// use tabula_core::SearchQuery;
    /// let query = SearchQuery::parse("index:5 true");
    /// assert_eq!(query.tokens().len(), 2);
    /// ```
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(tokenize(raw).iter().map(|t| QueryToken::parse(t)))
    }

    /// Compile already classified tokens.
    pub fn from_tokens(tokens: impl IntoIterator<Item = QueryToken>) -> Self {
        let tokens: Vec<QueryToken> = tokens.into_iter().collect();
        let matchers = tokens.iter().map(QueryToken::matcher).collect();
        SearchQuery { tokens, matchers }
    }

    /// The classified tokens, in input order
    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    /// Check whether a row satisfies every token (logical AND).
    pub fn matches(&self, row: &Row, columns: &[Column]) -> bool {
        self.matchers.iter().all(|m| m.matches(row, columns))
    }

    /// Check if this query would match everything (no tokens)
    pub fn matches_all(&self) -> bool {
        self.matchers.iter().all(|m| m.matches_all())
    }
}

/// Evaluate a single raw token against a row.
pub fn token_matches(token: &str, row: &Row, columns: &[Column]) -> bool {
    QueryToken::parse(token).matcher().matches(row, columns)
}

/// Turn token text into the lower-cased needle it stands for.
fn decode(text: &str) -> String {
    text.replace('+', " ").to_lowercase()
}

// === Matcher Implementations ===

/// Trait for token matching implementations.
trait Matcher: Send + Sync {
    /// Check if the given row matches, considering only `columns`.
    fn matches(&self, row: &Row, columns: &[Column]) -> bool;

    /// Returns true if this matcher matches everything
    fn matches_all(&self) -> bool {
        false
    }
}

/// Case-insensitive substring match against any column.
struct GlobalMatcher {
    needle_lower: String,
}

impl GlobalMatcher {
    fn new(text: &str) -> Self {
        GlobalMatcher {
            needle_lower: decode(text),
        }
    }
}

impl Matcher for GlobalMatcher {
    fn matches(&self, row: &Row, columns: &[Column]) -> bool {
        columns.iter().any(|c| {
            cell(row, &c.prop).map_or(false, |v| v.contains_lower(&self.needle_lower))
        })
    }
}

/// Case-insensitive substring match restricted to columns by name.
struct ScopedMatcher {
    key_lower: String,
    value_lower: String,
}

impl ScopedMatcher {
    fn new(key: &str, value: &str) -> Self {
        ScopedMatcher {
            key_lower: decode(key),
            value_lower: decode(value),
        }
    }
}

impl Matcher for ScopedMatcher {
    fn matches(&self, row: &Row, columns: &[Column]) -> bool {
        let mut candidates = columns
            .iter()
            .filter(|c| c.name_lower().contains(&self.key_lower))
            .peekable();

        if candidates.peek().is_none() {
            return false;
        }
        if self.value_lower.is_empty() {
            return true;
        }

        candidates.any(|c| cell(row, &c.prop).map_or(false, |v| v.contains_lower(&self.value_lower)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("a", "Index"),
            Column::new("b", "Index times ten"),
            Column::new("c", "Odd?"),
        ]
    }

    fn make_row(i: i32) -> Row {
        let mut row = Row::new();
        row.insert("a".to_string(), CellValue::from(i));
        row.insert("b".to_string(), CellValue::from(i * 10));
        row.insert("c".to_string(), CellValue::from(i % 2 == 1));
        row
    }

    fn matching(query: &str, rows: &[Row], columns: &[Column]) -> Vec<Row> {
        let query = SearchQuery::parse(query);
        rows.iter()
            .filter(|r| query.matches(r, columns))
            .cloned()
            .collect()
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(QueryToken::parse("5"), QueryToken::Global("5".to_string()));
        assert_eq!(
            QueryToken::parse("index:5:6"),
            QueryToken::Scoped {
                key: "index".to_string(),
                value: "5:6".to_string()
            }
        );
        assert_eq!(
            QueryToken::parse("index:"),
            QueryToken::Scoped {
                key: "index".to_string(),
                value: String::new()
            }
        );
    }

    #[test]
    fn test_global_number() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        assert_eq!(matching("5", &rows, &columns()), vec![make_row(5)]);
        assert_eq!(matching("9", &rows, &columns()), vec![make_row(9)]);
    }

    #[test]
    fn test_global_boolean() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        let odd: Vec<Row> = (0..10).filter(|i| i % 2 == 1).map(make_row).collect();
        assert_eq!(matching("true", &rows, &columns()), odd);
        assert_eq!(matching("TRUE", &rows, &columns()), odd);
    }

    #[test]
    fn test_multiple_tokens_conjunction() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        assert_eq!(matching("2 20 false", &rows, &columns()), vec![make_row(2)]);
        assert_eq!(matching("false 2", &rows, &columns()), vec![make_row(2)]);
    }

    #[test]
    fn test_scoped_by_column_name() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        assert_eq!(matching("index:5", &rows, &columns()), vec![make_row(5)]);
        assert_eq!(matching("times:50", &rows, &columns()), vec![make_row(5)]);
        assert_eq!(
            matching("times:50 index:5", &rows, &columns()),
            vec![make_row(5)]
        );

        let rows: Vec<Row> = (0..100).map(make_row).collect();
        assert_eq!(
            matching("index:1 odd:true times:110", &rows, &columns()),
            vec![make_row(11)]
        );
    }

    #[test]
    fn test_scoped_with_spaces_in_name() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        assert_eq!(
            matching("'Index times ten':20", &rows, &columns()),
            vec![make_row(2)]
        );
        assert_eq!(
            matching("index+times+ten:20", &rows, &columns()),
            vec![make_row(2)]
        );
    }

    #[test]
    fn test_scoped_unknown_column_matches_nothing() {
        let rows: Vec<Row> = (0..3).map(make_row).collect();
        assert!(matching("nope:1", &rows, &columns()).is_empty());
        assert!(matching("nope:", &rows, &columns()).is_empty());
    }

    #[test]
    fn test_scoped_empty_value_matches_everything() {
        let rows: Vec<Row> = (0..3).map(make_row).collect();
        assert_eq!(matching("index:", &rows, &columns()), rows);
        assert_eq!(matching("'Ind:'", &rows, &columns()), rows);
    }

    #[test]
    fn test_incomplete_column_name_as_global() {
        let rows: Vec<Row> = (0..3).map(make_row).collect();
        assert!(matching("inde", &rows, &columns()).is_empty());
        assert!(matching("'Index times ten'", &rows, &columns()).is_empty());
        assert!(matching("index times te", &rows, &columns()).is_empty());
    }

    #[test]
    fn test_array_cells() {
        let columns = vec![Column::new("a", "Index"), Column::new("b", "ArrayColumn")];
        let mut foo = Row::new();
        foo.insert("a".to_string(), CellValue::from(1));
        foo.insert("b".to_string(), CellValue::from(vec!["foo", "bar"]));
        let mut baz = Row::new();
        baz.insert("a".to_string(), CellValue::from(2));
        baz.insert("b".to_string(), CellValue::from(vec!["baz", "bazinga"]));
        let rows = vec![foo.clone(), baz.clone()];

        assert_eq!(matching("bar", &rows, &columns), vec![foo.clone()]);
        assert_eq!(
            matching("arraycolumn:bar arraycolumn:foo", &rows, &columns),
            vec![foo]
        );
        assert_eq!(
            matching("arraycolumn:baz arraycolumn:inga", &rows, &columns),
            vec![baz]
        );
    }

    #[test]
    fn test_numeric_array_cells() {
        let columns = vec![Column::new("a", "Index"), Column::new("b", "ArrayColumn")];
        let mut first = Row::new();
        first.insert("a".to_string(), CellValue::from(1));
        first.insert("b".to_string(), CellValue::from(vec![1, 2]));
        let mut second = Row::new();
        second.insert("a".to_string(), CellValue::from(2));
        second.insert("b".to_string(), CellValue::from(vec![3, 4]));
        let rows = vec![first.clone(), second];

        assert_eq!(
            matching("arraycolumn:1 arraycolumn:2", &rows, &columns),
            vec![first]
        );
    }

    #[test]
    fn test_hidden_columns_not_consulted() {
        let rows: Vec<Row> = (0..10).map(make_row).collect();
        let visible = vec![Column::new("a", "Index")];
        assert!(matching("true", &rows, &visible).is_empty());
        assert!(matching("odd:true", &rows, &visible).is_empty());
    }

    #[test]
    fn test_null_cells_never_match() {
        let mut row = Row::new();
        row.insert("a".to_string(), CellValue::Null);
        assert!(!token_matches("null", &row, &[Column::new("a", "Index")]));
        assert!(!token_matches("index:x", &row, &[Column::new("a", "Index")]));
    }

    #[test]
    fn test_token_matches() {
        let row = make_row(5);
        assert!(token_matches("5", &row, &columns()));
        assert!(token_matches("odd?:TRUE", &row, &columns()));
        assert!(!token_matches("odd?:false", &row, &columns()));
    }

    #[test]
    fn test_empty_query_matches_all() {
        let query = SearchQuery::parse("  ,, ");
        assert!(query.matches_all());
        assert!(query.matches(&make_row(1), &columns()));
        assert!(!SearchQuery::parse("x").matches_all());
    }
}
