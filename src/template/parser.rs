//! Recursive-descent parser for template expressions
//!
//! Parses the fixed, sandboxed grammar used inside `{{ }}` blocks:
//! - `payload.groupCode == 'BROKER'`
//! - `payload.message.strip() in payload.murexIds`
//! - `a == 'x' and not (b > 5 or c != null)`
//!
//! The grammar is deliberately closed: context paths, literals,
//! comparisons, membership tests, boolean connectives and a short
//! whitelist of string methods. Nothing else evaluates.

use super::ast::{CompareOp, Expression, Literal, Method, PathSegment};
use crate::error::GateError;

/// Parse an expression string into an AST
pub fn parse(input: &str) -> Result<Expression, GateError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(GateError::config(format!(
            "unexpected trailing input in expression '{input}'"
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Sym(&'static str),
}

fn tokenize(input: &str) -> Result<Vec<Token>, GateError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end == chars.len() {
                    return Err(GateError::config(format!(
                        "unterminated string literal in '{input}'"
                    )));
                }
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            '(' | ')' | '[' | ']' | '.' => {
                tokens.push(Token::Sym(match c {
                    '(' => "(",
                    ')' => ")",
                    '[' => "[",
                    ']' => "]",
                    _ => ".",
                }));
                i += 1;
            }
            '=' | '!' | '>' | '<' => {
                let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
                let sym = match two.as_str() {
                    "==" => Some("=="),
                    "!=" => Some("!="),
                    ">=" => Some(">="),
                    "<=" => Some("<="),
                    _ => None,
                };
                if let Some(sym) = sym {
                    tokens.push(Token::Sym(sym));
                    i += 2;
                } else if c == '>' || c == '<' {
                    tokens.push(Token::Sym(if c == '>' { ">" } else { "<" }));
                    i += 1;
                } else {
                    return Err(GateError::config(format!(
                        "unexpected character '{c}' in expression '{input}'"
                    )));
                }
            }
            _ if c.is_ascii_digit() || (c == '-' && next_is_digit(&chars, i)) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                let n = raw
                    .parse::<f64>()
                    .map_err(|_| GateError::config(format!("invalid number literal '{raw}'")))?;
                tokens.push(Token::Num(n));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => {
                return Err(GateError::config(format!(
                    "unexpected character '{c}' in expression '{input}'"
                )))
            }
        }
    }
    Ok(tokens)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_sym(&mut self, sym: &str) -> bool {
        if matches!(self.peek(), Some(Token::Sym(s)) if *s == sym) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == word)
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek_ident(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expression, GateError> {
        let mut left = self.and_expr()?;
        while self.eat_ident("or") {
            let right = self.and_expr()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expression, GateError> {
        let mut left = self.unary()?;
        while self.eat_ident("and") {
            let right = self.unary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, GateError> {
        // `not` followed by `in` belongs to the comparison level
        if self.peek_ident("not") && !matches!(self.tokens.get(self.pos + 1), Some(Token::Ident(w)) if w == "in")
        {
            self.pos += 1;
            let inner = self.unary()?;
            return Ok(Expression::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expression, GateError> {
        let left = self.operand()?;
        let op = if self.eat_sym("==") {
            CompareOp::Eq
        } else if self.eat_sym("!=") {
            CompareOp::NotEq
        } else if self.eat_sym(">=") {
            CompareOp::Gte
        } else if self.eat_sym("<=") {
            CompareOp::Lte
        } else if self.eat_sym(">") {
            CompareOp::Gt
        } else if self.eat_sym("<") {
            CompareOp::Lt
        } else if self.eat_ident("in") {
            CompareOp::In
        } else if self.peek_ident("not") {
            self.pos += 1;
            if !self.eat_ident("in") {
                return Err(GateError::config("expected 'in' after 'not'".to_string()));
            }
            CompareOp::NotIn
        } else {
            return Ok(left);
        };
        let right = self.operand()?;
        Ok(Expression::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn operand(&mut self) -> Result<Expression, GateError> {
        match self.bump() {
            Some(Token::Str(s)) => Ok(Expression::Literal(Literal::String(s))),
            Some(Token::Num(n)) => Ok(Expression::Literal(Literal::Number(n))),
            Some(Token::Sym("(")) => {
                let inner = self.or_expr()?;
                if !self.eat_sym(")") {
                    return Err(GateError::config("expected ')'".to_string()));
                }
                Ok(inner)
            }
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Expression::Literal(Literal::Boolean(true))),
                "false" => Ok(Expression::Literal(Literal::Boolean(false))),
                "null" | "none" => Ok(Expression::Literal(Literal::Null)),
                _ => self.path(word),
            },
            other => Err(GateError::config(format!(
                "unexpected token {other:?} in expression"
            ))),
        }
    }

    fn path(&mut self, root: String) -> Result<Expression, GateError> {
        let mut segments = vec![PathSegment::Member(root)];
        loop {
            if self.eat_sym(".") {
                let name = match self.bump() {
                    Some(Token::Ident(name)) => name,
                    other => {
                        return Err(GateError::config(format!(
                            "expected member name after '.', got {other:?}"
                        )))
                    }
                };
                if self.eat_sym("(") {
                    if !self.eat_sym(")") {
                        return Err(GateError::config(format!(
                            "method '{name}' takes no arguments"
                        )));
                    }
                    let method = Method::from_name(&name).ok_or_else(|| {
                        GateError::config(format!("method '{name}' is not allowed"))
                    })?;
                    segments.push(PathSegment::Method(method));
                } else {
                    segments.push(PathSegment::Member(name));
                }
            } else if self.eat_sym("[") {
                let literal = match self.bump() {
                    Some(Token::Str(s)) => Literal::String(s),
                    Some(Token::Num(n)) => Literal::Number(n),
                    other => {
                        return Err(GateError::config(format!(
                            "expected string or number index, got {other:?}"
                        )))
                    }
                };
                if !self.eat_sym("]") {
                    return Err(GateError::config("expected ']'".to_string()));
                }
                segments.push(PathSegment::Index(literal));
            } else {
                break;
            }
        }
        Ok(Expression::Path(segments))
    }
}
