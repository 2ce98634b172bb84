//! Lexer for the filter language
//!
//! Produces a flat token stream with character positions for error
//! reporting. Word tokens absorb dots (paths, decimal numbers) and
//! hyphens between alphanumeric runs, so UUID-like bare literals such
//! as `550e8400-e29b-41d4` lex as a single token. `{...}` JSON filter
//! literals are captured raw, string-aware, and handed to serde_json
//! by the parser.

use shale_core::{Error, Result};

/// One lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `==` or its alias `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `&`, introducing a field reference
    Amp,
    /// Bare identifier-like run: path, keyword, number, or bare literal
    Word(String),
    /// Double-quoted string with backslash escapes
    Quoted(String),
    /// Raw balanced `{...}` JSON object literal
    Json(String),
}

/// A token plus the character offset where it started
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Character offset in the input
    pub pos: usize,
}

fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Split input into tokens
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let pos = i;
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                } else {
                    i += 1;
                }
                Token::Eq
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Ne
                } else {
                    return Err(Error::parse(pos, "unexpected character '!'"));
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Ge
                } else {
                    i += 1;
                    Token::Gt
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Le
                } else {
                    i += 1;
                    Token::Lt
                }
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '&' => {
                i += 1;
                Token::Amp
            }
            '"' => {
                let (text, next) = scan_quoted(&chars, i)?;
                i = next;
                Token::Quoted(text)
            }
            '{' => {
                let (raw, next) = scan_json(&chars, i)?;
                i = next;
                Token::Json(raw)
            }
            c if is_word_start(c) => {
                let (word, next) = scan_word(&chars, i);
                i = next;
                Token::Word(word)
            }
            other => {
                return Err(Error::parse(pos, format!("unexpected character '{}'", other)));
            }
        };
        tokens.push(Spanned { token, pos });
    }

    Ok(tokens)
}

fn scan_word(chars: &[char], start: usize) -> (String, usize) {
    let mut word = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if is_word_char(c) {
            word.push(c);
            i += 1;
        } else if c == '-'
            && i > start
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric())
        {
            // Embedded hyphen between alphanumeric runs stays in the word.
            word.push(c);
            i += 1;
        } else {
            break;
        }
    }
    (word, i)
}

fn scan_quoted(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some(&escaped) => {
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    i += 2;
                }
                None => return Err(Error::parse(start, "unterminated string literal")),
            },
            '"' => return Ok((text, i + 1)),
            other => {
                text.push(other);
                i += 1;
            }
        }
    }
    Err(Error::parse(start, "unterminated string literal"))
}

fn scan_json(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let raw: String = chars[start..=i].iter().collect();
                        return Ok((raw, i + 1));
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    Err(Error::parse(start, "unterminated JSON literal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== = != > >= < <= + - * / & ( )"),
            vec![
                Token::Eq,
                Token::Eq,
                Token::Ne,
                Token::Gt,
                Token::Ge,
                Token::Lt,
                Token::Le,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Amp,
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_words_absorb_dots() {
        assert_eq!(
            kinds("address.city age 3.14"),
            vec![
                Token::Word("address.city".into()),
                Token::Word("age".into()),
                Token::Word("3.14".into()),
            ]
        );
    }

    #[test]
    fn test_embedded_hyphens_stay_in_word() {
        assert_eq!(
            kinds("550e8400-e29b-41d4"),
            vec![Token::Word("550e8400-e29b-41d4".into())]
        );
    }

    #[test]
    fn test_standalone_minus_is_an_operator() {
        assert_eq!(
            kinds("age - 5"),
            vec![
                Token::Word("age".into()),
                Token::Minus,
                Token::Word("5".into()),
            ]
        );
        assert_eq!(
            kinds("-5"),
            vec![Token::Minus, Token::Word("5".into())]
        );
    }

    #[test]
    fn test_quoted_strings_with_escapes() {
        assert_eq!(
            kinds(r#""New \"Belgrade\"" "tab\there""#),
            vec![
                Token::Quoted(r#"New "Belgrade""#.into()),
                Token::Quoted("tab\there".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_a_parse_error() {
        let err = tokenize(r#"name == "oops"#).unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_json_literal_is_captured_raw() {
        let tokens = kinds(r#"{"city": "a}b", "n": {"x": 1}}"#);
        assert_eq!(
            tokens,
            vec![Token::Json(r#"{"city": "a}b", "n": {"x": 1}}"#.into())]
        );
    }

    #[test]
    fn test_unterminated_json_is_a_parse_error() {
        let err = tokenize(r#"{"city": "#).unwrap_err();
        assert!(err.to_string().contains("unterminated JSON"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("age # 5").unwrap_err();
        assert!(err.to_string().contains("unexpected character"));
    }
}
