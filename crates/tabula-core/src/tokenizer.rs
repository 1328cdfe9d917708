//! Search string tokenizer.
//!
//! Turns the free text typed into a table's search box into an ordered list
//! of tokens:
//!
//! - commas are deleted everywhere, they never separate tokens on their own
//! - a quoted span (`'...'` or `"..."`) keeps its inner whitespace, each
//!   whitespace character becoming a literal `+`
//! - the rest is split on runs of whitespace
//!
//! A quoted span is rewritten in place, so text glued to it stays part of the
//! same token: `'Index times ten':20` yields `Index+times+ten:20`.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn quoted_span() -> &'static Regex {
    static QUOTED_SPAN: OnceLock<Regex> = OnceLock::new();
    QUOTED_SPAN.get_or_init(|| Regex::new(r#"['"][^'"]+['"]"#).expect("static pattern"))
}

/// Split a raw search string into tokens.
///
/// # Example
/// ```
/// use tabula_core::tokenizer::tokenize;
/// assert_eq!(tokenize("a,, b,,  c"), vec!["a", "b", "c"]);
/// ```
pub fn tokenize(raw: &str) -> Vec<String> {
    let without_commas: String = raw.chars().filter(|&c| c != ',').collect();

    let joined = quoted_span().replace_all(&without_commas, |caps: &Captures| {
        let span = &caps[0];
        // Both delimiters are single-byte ASCII quotes
        span[1..span.len() - 1]
            .chars()
            .map(|c| if c.is_whitespace() { '+' } else { c })
            .collect::<String>()
    });

    joined.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(tokenize("a b c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_commas_are_deleted() {
        assert_eq!(tokenize("a,, b,,  c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("a,,,, b,,,     c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("a,b"), vec!["ab"]);
    }

    #[test]
    fn test_plus_is_ordinary() {
        assert_eq!(tokenize("a+b c"), vec!["a+b", "c"]);
        assert_eq!(tokenize("a,,,+++b,,,     c"), vec!["a+++b", "c"]);
    }

    #[test]
    fn test_quoted_spans() {
        assert_eq!(
            tokenize(r#""a b c"   "d e  f", "g, h i""#),
            vec!["a+b+c", "d+e++f", "g+h+i"]
        );
    }

    #[test]
    fn test_quoted_span_fuses_with_adjacent_text() {
        assert_eq!(tokenize("'Index times ten':20"), vec!["Index+times+ten:20"]);
        assert_eq!(tokenize("'Ind:'"), vec!["Ind:"]);
    }

    #[test]
    fn test_unmatched_and_empty_quotes() {
        assert_eq!(tokenize("it's"), vec!["it's"]);
        assert_eq!(tokenize("'' x"), vec!["''", "x"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ,, ,").is_empty());
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(tokenize("Odd?:true"), vec!["Odd?:true"]);
    }
}
