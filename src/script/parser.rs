//! Line parser for rectbind scripts
//!
//! ```text
//! r = Rectangle(2, 4, 6, 8)    # construct
//! area = r.getArea()           # call and keep the result
//! r.move(1, -1)                # call for effect
//! print(r.getLength(), area)   # print space-separated values
//! del r
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

fn err<T>(message: impl Into<String>) -> Result<T, ParseError> {
    Err(ParseError(message.into()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    Literal(Value),
    Variable(String),
    /// `Class(args)`
    Construct { class: String, args: Vec<Expr> },
    /// `target.method(args)`
    MethodCall {
        target: String,
        method: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Empty,
    Assign { name: String, value: Expr },
    Expr(Expr),
    Print(Vec<Expr>),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(i64),
    LParen,
    RParen,
    Comma,
    Dot,
    Assign,
    Minus,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' | '.' | '=' | '-' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '.' => Token::Dot,
                    '=' => Token::Assign,
                    _ => Token::Minus,
                });
            }
            c if c.is_ascii_digit() => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let digits = &input[start..end];
                match digits.parse::<i64>() {
                    Ok(n) => tokens.push(Token::Int(n)),
                    Err(_) => return err(format!("integer literal out of range: {}", digits)),
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Ident(input[start..end].to_string()));
            }
            other => return err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

enum StatementKind {
    Delete,
    Print,
    Assign,
    Expr,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => err(format!("expected {}, found {}", what, describe(&t))),
            None => err(format!("expected {}, found end of line", what)),
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(t) => err(format!("expected {}, found {}", what, describe(&t))),
            None => err(format!("expected {}, found end of line", what)),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn finish(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => err(format!("unexpected {} after statement", describe(t))),
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        if self.at_end() {
            return Ok(Statement::Empty);
        }

        let kind = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(kw)), _) if kw == "del" => StatementKind::Delete,
            (Some(Token::Ident(kw)), Some(Token::LParen)) if kw == "print" => StatementKind::Print,
            (Some(Token::Ident(_)), Some(Token::Assign)) => StatementKind::Assign,
            _ => StatementKind::Expr,
        };

        let statement = match kind {
            StatementKind::Delete => {
                self.next();
                Statement::Delete(self.ident("variable name after 'del'")?)
            }
            StatementKind::Print => {
                self.next();
                Statement::Print(self.arguments()?)
            }
            StatementKind::Assign => {
                let name = self.ident("variable name")?;
                self.next();
                if self.at_end() {
                    return err("expected expression after '='");
                }
                Statement::Assign {
                    name,
                    value: self.expr()?,
                }
            }
            StatementKind::Expr => match self.expr()? {
                call @ (Expr::Construct { .. } | Expr::MethodCall { .. }) => Statement::Expr(call),
                _ => return err("only calls can be used as statements"),
            },
        };

        self.finish()?;
        Ok(statement)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::from(n))),
            Some(Token::Minus) => match self.next() {
                Some(Token::Int(n)) => Ok(Expr::Literal(Value::from(-n))),
                _ => err("expected integer after '-'"),
            },
            Some(Token::Ident(name)) => match self.peek() {
                Some(Token::LParen) => Ok(Expr::Construct {
                    class: name,
                    args: self.arguments()?,
                }),
                Some(Token::Dot) => {
                    self.next();
                    let method = self.ident("method name after '.'")?;
                    Ok(Expr::MethodCall {
                        target: name,
                        method,
                        args: self.arguments()?,
                    })
                }
                _ => Ok(Expr::Variable(name)),
            },
            Some(t) => err(format!("expected expression, found {}", describe(&t))),
            None => err("expected expression, found end of line"),
        }
    }

    /// `( expr, ... )`, allowing a trailing comma
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        loop {
            if self.peek() == Some(&Token::RParen) {
                self.next();
                return Ok(args);
            }
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                Some(t) => return err(format!("expected ',' or ')', found {}", describe(&t))),
                None => return err("unclosed '('"),
            }
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("'{}'", name),
        Token::Int(n) => format!("'{}'", n),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Assign => "'='".to_string(),
        Token::Minus => "'-'".to_string(),
    }
}

/// Parse one line of script. Everything after `#` is a comment.
pub fn parse_statement(line: &str) -> Result<Statement, ParseError> {
    let code = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let mut parser = Parser {
        tokens: tokenize(code)?,
        pos: 0,
    };
    parser.statement()
}
