//! Recursive-descent parser for filters and value expressions
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr       = andExpr ( "or"  andExpr )*
//! andExpr    = notExpr ( "and" notExpr )*
//! notExpr    = "not" primary | primary
//! primary    = "(" expr ")" | jsonFilter | path op valueExpr
//! valueExpr  = mulExpr ( ("+"|"-") mulExpr )*
//! mulExpr    = unary  ( ("*"|"/") unary )*
//! unary      = "-" unary | term
//! term       = "(" valueExpr ")" | "&" path | quoted | bare
//! ```
//!
//! A bare term that parses as a number is a number literal, `true` and
//! `false` are booleans, and anything else is a string literal. A
//! `{...}` filter desugars to an `and` chain of equality comparisons.

use crate::ast::{ArithOp, CompareOp, Filter, ValueExpr};
use crate::token::{tokenize, Spanned, Token};
use shale_core::{Error, Result, Value};

const RESERVED: [&str; 5] = ["and", "or", "not", "true", "false"];

/// Parse a complete filter expression
pub fn parse(input: &str) -> Result<Filter> {
    let mut parser = Parser::new(input)?;
    let filter = parser.parse_or()?;
    parser.expect_end()?;
    Ok(filter)
}

/// Parse a standalone value expression (the transform surface)
pub fn parse_value_expression(input: &str) -> Result<ValueExpr> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_add()?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
            input_len: input.chars().count(),
        })
    }

    // ========================================================================
    // Filters
    // ========================================================================

    fn parse_or(&mut self) -> Result<Filter> {
        let mut left = self.parse_and()?;
        while self.eat_word("or") {
            let right = self.parse_and()?;
            left = Filter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Filter> {
        let mut left = self.parse_not()?;
        while self.eat_word("and") {
            let right = self.parse_not()?;
            left = Filter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Filter> {
        if self.eat_word("not") {
            let inner = self.parse_primary()?;
            return Ok(Filter::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Filter> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "expected ')'")?;
                Ok(inner)
            }
            Some(Token::Json(_)) => {
                let Spanned { token, pos } = self.take();
                let Token::Json(raw) = token else { unreachable!() };
                desugar_json(&raw, pos)
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Filter> {
        let at = self.here();
        let path = match self.peek() {
            Some(Token::Word(w)) if !RESERVED.contains(&w.as_str()) => {
                let w = w.clone();
                self.advance();
                w
            }
            _ => return Err(Error::parse(at, "expected a field path")),
        };

        let at = self.here();
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::Word(w)) if w == "contains" => CompareOp::Contains,
            Some(Token::Word(w)) if w == "like" => CompareOp::Like,
            _ => return Err(Error::parse(at, "expected a comparison operator")),
        };
        self.advance();

        let rhs = self.parse_add()?;
        Ok(Filter::Compare { path, op, rhs })
    }

    // ========================================================================
    // Value expressions
    // ========================================================================

    fn parse_add(&mut self) -> Result<ValueExpr> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = ValueExpr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<ValueExpr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = ValueExpr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ValueExpr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(ValueExpr::Neg(Box::new(inner)));
        }
        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<ValueExpr> {
        let at = self.here();
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_add()?;
                self.expect(Token::RParen, "expected ')'")?;
                Ok(inner)
            }
            Some(Token::Amp) => {
                self.advance();
                let at = self.here();
                match self.peek() {
                    Some(Token::Word(w)) => {
                        let path = w.clone();
                        self.advance();
                        Ok(ValueExpr::Field(path))
                    }
                    _ => Err(Error::parse(at, "expected a field path after '&'")),
                }
            }
            Some(Token::Quoted(s)) => {
                let literal = ValueExpr::Literal(Value::String(s.clone()));
                self.advance();
                Ok(literal)
            }
            Some(Token::Word(w)) => {
                let word = w.clone();
                self.advance();
                Ok(ValueExpr::Literal(bare_literal(&word, at)?))
            }
            _ => Err(Error::parse(at, "expected a value")),
        }
    }

    // ========================================================================
    // Token plumbing
    // ========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.pos)
            .unwrap_or(self.input_len)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn take(&mut self) -> Spanned {
        let spanned = self.tokens[self.pos].clone();
        self.pos += 1;
        spanned
    }

    fn eat_word(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == keyword) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, token: Token, message: &str) -> Result<()> {
        if self.peek() == Some(&token) {
            self.advance();
            return Ok(());
        }
        Err(Error::parse(self.here(), message))
    }

    fn expect_end(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(extra) => Err(Error::parse(
                extra.pos,
                "unexpected trailing input after expression",
            )),
        }
    }
}

/// Interpret a bare word: number if it parses, boolean for true/false,
/// reserved words rejected, otherwise a string literal.
fn bare_literal(word: &str, at: usize) -> Result<Value> {
    match word {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "and" | "or" | "not" => {
            return Err(Error::parse(at, format!("expected a value, found '{}'", word)))
        }
        _ => {}
    }
    if let Ok(i) = word.parse::<i64>() {
        return Ok(Value::I64(i));
    }
    if let Ok(f) = word.parse::<f64>() {
        return Ok(Value::F64(f));
    }
    Ok(Value::String(word.to_string()))
}

/// `{"k1": v1, "k2": v2}` becomes `(k1 == v1) and (k2 == v2)`
fn desugar_json(raw: &str, pos: usize) -> Result<Filter> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| Error::parse(pos, format!("invalid JSON filter: {}", e)))?;

    let mut comparisons = object.into_iter().map(|(path, value)| Filter::Compare {
        path,
        op: CompareOp::Eq,
        rhs: ValueExpr::Literal(Value::from(value)),
    });
    let first = comparisons
        .next()
        .ok_or_else(|| Error::parse(pos, "empty JSON filter"))?;
    Ok(comparisons.fold(first, |acc, next| Filter::And(Box::new(acc), Box::new(next))))
}
