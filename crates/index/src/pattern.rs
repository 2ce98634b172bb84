//! SQL-style wildcard patterns
//!
//! `%` matches any run of characters, `_` matches exactly one, and `\`
//! escapes the next character. Patterns compile to anchored regular
//! expressions with every regex metacharacter escaped, so user input
//! can never smuggle regex syntax into a match.

use regex::Regex;

/// Compile a wildcard pattern into an anchored regex.
///
/// The caller is expected to lowercase the pattern first; the text
/// index stores lowercased strings, so matching stays case-insensitive
/// without re-folding stored values per query.
pub fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => {
                // Escaped wildcard or literal; a trailing backslash
                // matches itself.
                let literal = chars.next().unwrap_or('\\');
                source.push_str(&regex::escape(&literal.to_string()));
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    Regex::new(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_matches_any_run() {
        let re = like_to_regex("al%").unwrap();
        assert!(re.is_match("alice"));
        assert!(re.is_match("al"));
        assert!(!re.is_match("bal"));
    }

    #[test]
    fn test_underscore_matches_one() {
        let re = like_to_regex("b_b").unwrap();
        assert!(re.is_match("bob"));
        assert!(!re.is_match("bb"));
        assert!(!re.is_match("boob"));
    }

    #[test]
    fn test_match_is_anchored() {
        let re = like_to_regex("ice").unwrap();
        assert!(!re.is_match("alice"));
        assert!(re.is_match("ice"));
    }

    #[test]
    fn test_escape_disarms_wildcards() {
        let re = like_to_regex(r"100\%").unwrap();
        assert!(re.is_match("100%"));
        assert!(!re.is_match("1000"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let re = like_to_regex("a.b+c").unwrap();
        assert!(re.is_match("a.b+c"));
        assert!(!re.is_match("axb+c"));
    }
}
