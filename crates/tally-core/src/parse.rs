//! Splitting message content into a count token and trailing chatter.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s:]+").expect("static regex"));

/// Split content on runs of whitespace or `:`.
///
/// Empty leading and trailing pieces are kept, so `" 5"` yields two tokens
/// and empty content yields a single empty token.
pub fn tokenize(content: &str) -> Vec<&str> {
    SEPARATORS.split(content).collect()
}

/// First token with thousands separators removed.
pub fn count_token(content: &str) -> String {
    let first = SEPARATORS.split(content).next().unwrap_or_default();
    first.replace(',', "")
}

/// Whether `token` is one or more ASCII digits.
pub fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Parsed leading count of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountToken {
    /// Digits that fit in an `i64`.
    Value(i64),
    /// Digits too large to ever be the next count.
    Overflow,
    /// Not a number at all.
    Malformed,
}

/// Classify the leading count of `content`.
pub fn leading_count(content: &str) -> CountToken {
    let token = count_token(content);
    if !is_number(&token) {
        return CountToken::Malformed;
    }
    match token.parse::<i64>() {
        Ok(n) => CountToken::Value(n),
        Err(_) => CountToken::Overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces_colons_and_newlines() {
        assert_eq!(tokenize("5"), vec!["5"]);
        assert_eq!(tokenize("5 nice"), vec!["5", "nice"]);
        assert_eq!(tokenize("<@1>: 17"), vec!["<@1>", "17"]);
        assert_eq!(tokenize("12\n\nyes"), vec!["12", "yes"]);
    }

    #[test]
    fn keeps_empty_edge_tokens() {
        assert_eq!(tokenize(""), vec![""]);
        assert_eq!(tokenize(" 5"), vec!["", "5"]);
        assert_eq!(tokenize("5 "), vec!["5", ""]);
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(count_token("1,000"), "1000");
        assert_eq!(count_token("1,000 woo"), "1000");
        assert_eq!(leading_count("12,345"), CountToken::Value(12345));
    }

    #[test]
    fn classifies_tokens() {
        assert_eq!(leading_count("42"), CountToken::Value(42));
        assert_eq!(leading_count("4two"), CountToken::Malformed);
        assert_eq!(leading_count("-3"), CountToken::Malformed);
        assert_eq!(leading_count(""), CountToken::Malformed);
        assert_eq!(leading_count("99999999999999999999999"), CountToken::Overflow);
    }
}
