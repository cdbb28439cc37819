//! Exact evaluation of small arithmetic expressions.
//!
//! Used to bring textually different answers (`"(10 - 4) * (13 - 9)"`, `"24"`,
//! `"24.0"`) to a single comparable value.

use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(Value),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '-' | '\u{2212}' => tokens.push(Token::Minus),
            '*' | '\u{d7}' => tokens.push(Token::Star),
            '/' | '\u{f7}' => tokens.push(Token::Slash),
            '(' | '[' => tokens.push(Token::LParen),
            ')' | ']' => tokens.push(Token::RParen),
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i + 1 < chars.len() && (chars[i + 1].is_ascii_digit() || chars[i + 1] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..=i].iter().collect();
                tokens.push(Token::Num(Value::parse(&literal).ok()?));
            }
            _ => return None,
        }
        i += 1;
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Option<Value> {
        let mut acc = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = match op {
                Token::Plus => acc.checked_add(rhs)?,
                _ => acc.checked_sub(rhs)?,
            };
        }
        Some(acc)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Option<Value> {
        let mut acc = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            acc = match op {
                Token::Star => acc.checked_mul(rhs)?,
                _ => acc.checked_div(rhs)?,
            };
        }
        Some(acc)
    }

    // factor := ('-' | '+') factor | '(' expr ')' | number
    fn factor(&mut self) -> Option<Value> {
        match self.next()? {
            Token::Minus => Value::integer(0).checked_sub(self.factor()?),
            Token::Plus => self.factor(),
            Token::LParen => {
                let inner = self.expr()?;
                match self.next()? {
                    Token::RParen => Some(inner),
                    _ => None,
                }
            }
            Token::Num(v) => Some(v),
            _ => None,
        }
    }
}

/// Evaluate `+ - * /` with parentheses and unary signs exactly.
///
/// Returns `None` for anything that is not a complete, well-formed expression
/// or that divides by zero.
pub fn evaluate_expression(text: &str) -> Option<Value> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return None;
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return None;
    }
    Some(value)
}
