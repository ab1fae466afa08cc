//! Exclusion list parser
//!
//! Turns the raw `excludedWindows` text into a [`PatternSet`]. The grammar is
//! a comma separated list where every token takes one of three shapes:
//!
//! - `[Name]` exact match on the inner text
//! - `{part}` substring match on the inner text
//! - `name` exact match on the bare word (no brackets or braces anywhere)
//!
//! Matching is case-insensitive, so every stored pattern is lower-cased.
//! Anything else is a syntax error, and one error anywhere makes the whole
//! list unusable.

use std::collections::HashSet;

use thiserror::Error;

/// Diagnostic produced while parsing an exclusion list.
///
/// The `Display` text is what ends up in the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Consecutive commas detected (empty tokens due to ',,').")]
    ConsecutiveCommas,

    #[error("Trailing comma detected (empty token at the end).")]
    TrailingComma,

    #[error("Empty exact token \"{0}\"")]
    EmptyExact(String),

    #[error("Empty contains token \"{0}\"")]
    EmptyContains(String),

    #[error("Malformed token: \"{0}\"")]
    Malformed(String),
}

/// Compiled exclusion patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    /// Lower-cased names that must equal the window identity
    pub exact: HashSet<String>,
    /// Lower-cased fragments searched for inside the window identity, in
    /// configuration order (duplicates kept)
    pub contains: Vec<String>,
}

impl PatternSet {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.contains.is_empty()
    }
}

/// Output of [`parse`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub patterns: PatternSet,
    pub errors: Vec<PatternError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Patterns safe to match against: the parsed set when there were no
    /// errors, otherwise an empty set (never a partially built one).
    pub fn usable(self) -> PatternSet {
        if self.is_ok() {
            self.patterns
        } else {
            PatternSet::default()
        }
    }

    fn failed(error: PatternError) -> Self {
        Self {
            patterns: PatternSet::default(),
            errors: vec![error],
        }
    }
}

/// Which bracketed form an empty token was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Exact,
    Contains,
}

/// A single classified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Lower-cased exact pattern (bracketed or bare)
    Exact(String),
    /// Lower-cased substring pattern
    Contains(String),
    /// Bracketed or braced token whose inner text trims to nothing
    Empty { form: Form, raw: String },
    /// Anything that fits none of the three shapes
    Malformed(String),
}

impl Token {
    /// Classify one trimmed, non-empty token.
    ///
    /// Shapes are tried in order: bracketed, braced, bare.
    pub fn classify(token: &str) -> Self {
        if let Some(inner) = enclosed(token, '[', ']') {
            return Self::from_inner(Form::Exact, token, inner);
        }
        if let Some(inner) = enclosed(token, '{', '}') {
            return Self::from_inner(Form::Contains, token, inner);
        }
        if !token.contains(is_delimiter) {
            return Self::Exact(token.to_lowercase());
        }
        Self::Malformed(token.to_string())
    }

    fn from_inner(form: Form, token: &str, inner: &str) -> Self {
        let inner = inner.trim();
        if inner.is_empty() {
            return Self::Empty {
                form,
                raw: token.to_string(),
            };
        }
        let pattern = inner.to_lowercase();
        match form {
            Form::Exact => Self::Exact(pattern),
            Form::Contains => Self::Contains(pattern),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '[' | ']' | '{' | '}')
}

/// Inner text of `open ... close` when the token is exactly one such pair
/// around at least one character that is neither `open` nor `close`.
fn enclosed(token: &str, open: char, close: char) -> Option<&str> {
    let inner = token.strip_prefix(open)?.strip_suffix(close)?;
    if inner.is_empty() || inner.contains([open, close]) {
        return None;
    }
    Some(inner)
}

/// A comma followed by optional whitespace and another comma
fn has_consecutive_commas(raw: &str) -> bool {
    let mut after_comma = false;
    for c in raw.chars() {
        if c == ',' {
            if after_comma {
                return true;
            }
            after_comma = true;
        } else if !c.is_whitespace() {
            after_comma = false;
        }
    }
    false
}

fn has_trailing_comma(raw: &str) -> bool {
    raw.trim_end().ends_with(',')
}

/// Parse an exclusion list.
///
/// Structural problems (`,,` or a trailing comma) reject the string before
/// any token is looked at. Token problems are collected for every token so
/// the log names all of them at once.
pub fn parse(raw: &str) -> ParseResult {
    if raw.is_empty() {
        return ParseResult::default();
    }
    if has_consecutive_commas(raw) {
        return ParseResult::failed(PatternError::ConsecutiveCommas);
    }
    if has_trailing_comma(raw) {
        return ParseResult::failed(PatternError::TrailingComma);
    }

    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Token::classify)
        .fold(ParseResult::default(), |mut result, token| {
            match token {
                Token::Exact(pattern) => {
                    result.patterns.exact.insert(pattern);
                }
                Token::Contains(pattern) => result.patterns.contains.push(pattern),
                Token::Empty {
                    form: Form::Exact,
                    raw,
                } => result.errors.push(PatternError::EmptyExact(raw)),
                Token::Empty {
                    form: Form::Contains,
                    raw,
                } => result.errors.push(PatternError::EmptyContains(raw)),
                Token::Malformed(raw) => result.errors.push(PatternError::Malformed(raw)),
            }
            result
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_mixed_shapes() {
        let result = parse("[Firefox],{term},konsole");

        assert!(result.is_ok());
        assert_eq!(result.patterns.exact, exact(&["firefox", "konsole"]));
        assert_eq!(result.patterns.contains, vec!["term".to_string()]);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse(""), ParseResult::default());
    }

    #[test]
    fn test_parse_whitespace_only_is_empty() {
        let result = parse("   ");
        assert!(result.is_ok());
        assert!(result.patterns.is_empty());
    }

    #[test]
    fn test_consecutive_commas_short_circuit() {
        let result = parse("foo,,bar");
        assert_eq!(result.errors, vec![PatternError::ConsecutiveCommas]);
        assert!(result.patterns.is_empty());
        assert_eq!(
            result.errors[0].to_string(),
            "Consecutive commas detected (empty tokens due to ',,')."
        );
    }

    #[test]
    fn test_consecutive_commas_with_whitespace_between() {
        let result = parse("foo, \t ,bar");
        assert_eq!(result.errors, vec![PatternError::ConsecutiveCommas]);
    }

    #[test]
    fn test_consecutive_commas_checked_before_trailing() {
        // Both problems present, only the first class is reported
        let result = parse("a,,b,");
        assert_eq!(result.errors, vec![PatternError::ConsecutiveCommas]);
    }

    #[test]
    fn test_trailing_comma() {
        let result = parse("foo,bar,");
        assert_eq!(result.errors, vec![PatternError::TrailingComma]);
        assert!(result.patterns.is_empty());

        let result = parse("foo,bar,   ");
        assert_eq!(result.errors, vec![PatternError::TrailingComma]);
        assert_eq!(
            result.errors[0].to_string(),
            "Trailing comma detected (empty token at the end)."
        );
    }

    #[test]
    fn test_structural_error_skips_token_errors() {
        // a[b is malformed, but the trailing comma rejects the string first
        let result = parse("a[b,");
        assert_eq!(result.errors, vec![PatternError::TrailingComma]);
    }

    #[test]
    fn test_leading_comma_is_dropped() {
        let result = parse(",foo");
        assert!(result.is_ok());
        assert_eq!(result.patterns.exact, exact(&["foo"]));
    }

    #[test]
    fn test_empty_exact_token() {
        let result = parse("[ ]");
        assert_eq!(result.errors, vec![PatternError::EmptyExact("[ ]".into())]);
        assert_eq!(result.errors[0].to_string(), "Empty exact token \"[ ]\"");
        assert!(result.clone().usable().is_empty());
    }

    #[test]
    fn test_empty_contains_token() {
        let result = parse("{  }");
        assert_eq!(
            result.errors,
            vec![PatternError::EmptyContains("{  }".into())]
        );
        assert_eq!(result.errors[0].to_string(), "Empty contains token \"{  }\"");
    }

    #[test]
    fn test_malformed_token() {
        let result = parse("a[b");
        assert_eq!(result.errors, vec![PatternError::Malformed("a[b".into())]);
        assert_eq!(result.errors[0].to_string(), "Malformed token: \"a[b\"");
        assert!(result.usable().is_empty());
    }

    #[test]
    fn test_malformed_shapes() {
        for token in ["[]", "{}", "[a", "a]", "{a", "[a}", "{a]", "[a][b]", "[[a]]", "{{a}}", "a{b}"] {
            let result = parse(token);
            assert_eq!(
                result.errors,
                vec![PatternError::Malformed(token.to_string())],
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_bracket_inside_braces_and_vice_versa() {
        let result = parse("[{x}],{[y]}");
        assert!(result.is_ok());
        assert_eq!(result.patterns.exact, exact(&["{x}"]));
        assert_eq!(result.patterns.contains, vec!["[y]".to_string()]);
    }

    #[test]
    fn test_all_tokens_evaluated_after_error() {
        let result = parse("a[b, [ ], good, {x, {}");
        assert_eq!(
            result.errors,
            vec![
                PatternError::Malformed("a[b".into()),
                PatternError::EmptyExact("[ ]".into()),
                PatternError::Malformed("{x".into()),
                PatternError::Malformed("{}".into()),
            ]
        );
        // good was parsed, but the list as a whole is unusable
        assert!(result.patterns.exact.contains("good"));
        assert!(result.usable().is_empty());
    }

    #[test]
    fn test_tokens_are_trimmed_and_lowercased() {
        let result = parse("  [ Google Chrome ] ,{ Term }, KONSOLE ");
        assert!(result.is_ok());
        assert_eq!(result.patterns.exact, exact(&["google chrome", "konsole"]));
        assert_eq!(result.patterns.contains, vec!["term".to_string()]);
    }

    #[test]
    fn test_duplicates() {
        let result = parse("foo,[FOO],{bar},{Bar}");
        assert_eq!(result.patterns.exact.len(), 1);
        assert_eq!(
            result.patterns.contains,
            vec!["bar".to_string(), "bar".to_string()]
        );
    }

    #[test]
    fn test_bare_word_with_spaces() {
        let result = parse("visual studio code");
        assert_eq!(result.patterns.exact, exact(&["visual studio code"]));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = "[Firefox],{term},konsole,{x},{x}";
        assert_eq!(parse(raw), parse(raw));
    }

    #[test]
    fn test_classify() {
        assert_eq!(Token::classify("[A]"), Token::Exact("a".into()));
        assert_eq!(Token::classify("{B}"), Token::Contains("b".into()));
        assert_eq!(Token::classify("C"), Token::Exact("c".into()));
        assert_eq!(
            Token::classify("[ ]"),
            Token::Empty {
                form: Form::Exact,
                raw: "[ ]".into()
            }
        );
        assert_eq!(Token::classify("a}"), Token::Malformed("a}".into()));
    }
}
