//! Tokenizer and recursive-descent parser for guard expressions.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! or      := and ( "||" and )*
//! and     := compare ( "&&" compare )*
//! compare := unary ( ( "==" | "!=" | "<" | "<=" | ">" | ">=" ) unary )?
//! unary   := ( "!" | "-" ) unary | primary
//! primary := literal | path | call | "(" or ")"
//! path    := ident ( "." ident )*
//! call    := ident "(" ( or ( "," or )* )? ")"
//! ```

use serde_json::Value;

use crate::errors::GuardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// Parsed guard expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Dot,
    Comma,
    LParen,
    RParen,
    Not,
    Minus,
    And,
    Or,
    Op(BinaryOp),
}

struct Lexer<'a> {
    expr: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(expr: &'a str) -> Self {
        Self {
            expr,
            chars: expr.char_indices().collect(),
            pos: 0,
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> GuardError {
        GuardError::Parse {
            expr: self.expr.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.expr.len())
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, GuardError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.offset();
            match c {
                c if c.is_whitespace() => {
                    self.pos += 1;
                }
                '.' => {
                    self.pos += 1;
                    tokens.push((start, Token::Dot));
                }
                ',' => {
                    self.pos += 1;
                    tokens.push((start, Token::Comma));
                }
                '(' => {
                    self.pos += 1;
                    tokens.push((start, Token::LParen));
                }
                ')' => {
                    self.pos += 1;
                    tokens.push((start, Token::RParen));
                }
                '-' => {
                    self.pos += 1;
                    tokens.push((start, Token::Minus));
                }
                '!' => {
                    self.pos += 1;
                    if self.peek() == Some('=') {
                        self.pos += 1;
                        tokens.push((start, Token::Op(BinaryOp::Ne)));
                    } else {
                        tokens.push((start, Token::Not));
                    }
                }
                '=' if self.peek_next() == Some('=') => {
                    self.pos += 2;
                    tokens.push((start, Token::Op(BinaryOp::Eq)));
                }
                '<' | '>' => {
                    self.pos += 1;
                    let eq = self.peek() == Some('=');
                    if eq {
                        self.pos += 1;
                    }
                    let op = match (c, eq) {
                        ('<', false) => BinaryOp::Lt,
                        ('<', true) => BinaryOp::Le,
                        ('>', false) => BinaryOp::Gt,
                        _ => BinaryOp::Ge,
                    };
                    tokens.push((start, Token::Op(op)));
                }
                '&' if self.peek_next() == Some('&') => {
                    self.pos += 2;
                    tokens.push((start, Token::And));
                }
                '|' if self.peek_next() == Some('|') => {
                    self.pos += 2;
                    tokens.push((start, Token::Or));
                }
                '"' | '\'' => {
                    let text = self.string(c)?;
                    tokens.push((start, Token::Str(text)));
                }
                c if c.is_ascii_digit() => {
                    let token = self.number()?;
                    tokens.push((start, token));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(c) = self.peek() {
                        if c.is_alphanumeric() || c == '_' {
                            ident.push(c);
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                    tokens.push((start, Token::Ident(ident)));
                }
                other => return Err(self.error(start, format!("unexpected character '{}'", other))),
            }
        }

        Ok(tokens)
    }

    fn string(&mut self, quote: char) -> Result<String, GuardError> {
        let start = self.offset();
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(start, "unterminated string")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(text);
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(c) => text.push(c),
                        None => return Err(self.error(start, "unterminated string")),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn number(&mut self) -> Result<Token, GuardError> {
        let start = self.offset();
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !is_float && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                text.push(c);
            } else {
                break;
            }
            self.pos += 1;
        }
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|e| self.error(start, e.to_string()))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|e| self.error(start, e.to_string()))
        }
    }
}

/// Parse a guard expression.
pub fn parse(expr: &str) -> Result<Expr, GuardError> {
    let tokens = Lexer::new(expr).tokenize()?;
    let mut parser = Parser {
        expr,
        tokens,
        pos: 0,
    };
    let ast = parser.or()?;
    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(parser.error(*offset, format!("unexpected trailing {:?}", token)));
    }
    Ok(ast)
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, offset: usize, message: impl Into<String>) -> GuardError {
        GuardError::Parse {
            expr: self.expr.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.expr.len())
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, wanted: Token, what: &str) -> Result<(), GuardError> {
        let offset = self.offset();
        match self.advance() {
            Some(token) if token == wanted => Ok(()),
            Some(token) => Err(self.error(offset, format!("expected {}, found {:?}", what, token))),
            None => Err(self.error(offset, format!("expected {}, found end of input", what))),
        }
    }

    fn or(&mut self) -> Result<Expr, GuardError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, GuardError> {
        let mut lhs = self.compare()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.compare()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn compare(&mut self) -> Result<Expr, GuardError> {
        let lhs = self.unary()?;
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.unary()?;
            return Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, GuardError> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.unary()?)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, GuardError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Int(n)) => Ok(Expr::Literal(Value::from(n))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::from(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::LParen) => {
                let inner = self.or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(ident)) => {
                match ident.as_str() {
                    "true" => return Ok(Expr::Literal(Value::Bool(true))),
                    "false" => return Ok(Expr::Literal(Value::Bool(false))),
                    "null" => return Ok(Expr::Literal(Value::Null)),
                    _ => {}
                }

                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    return Ok(Expr::Call(ident, args));
                }

                let mut segments = vec![ident];
                while self.peek() == Some(&Token::Dot) {
                    self.pos += 1;
                    let offset = self.offset();
                    match self.advance() {
                        Some(Token::Ident(next)) => segments.push(next),
                        _ => return Err(self.error(offset, "expected field name after '.'")),
                    }
                }
                Ok(Expr::Path(segments))
            }
            Some(token) => Err(self.error(offset, format!("unexpected {:?}", token))),
            None => Err(self.error(offset, "unexpected end of input")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, GuardError> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.or()?);
            let offset = self.offset();
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(self.error(offset, "expected ',' or ')' in argument list")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Expr {
        Expr::Path(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_dotted_path() {
        assert_eq!(
            parse("troops.infantry.state.isAvailable").unwrap(),
            path(&["troops", "infantry", "state", "isAvailable"])
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse("a || b && c").unwrap();
        assert_eq!(
            ast,
            Expr::Or(
                Box::new(path(&["a"])),
                Box::new(Expr::And(Box::new(path(&["b"])), Box::new(path(&["c"]))))
            )
        );
    }

    #[test]
    fn test_comparison_and_literals() {
        let ast = parse("gems >= 1.5 && name != 'bob'").unwrap();
        match ast {
            Expr::And(lhs, rhs) => {
                assert_eq!(
                    *lhs,
                    Expr::Compare(
                        BinaryOp::Ge,
                        Box::new(path(&["gems"])),
                        Box::new(Expr::Literal(Value::from(1.5)))
                    )
                );
                assert!(matches!(*rhs, Expr::Compare(BinaryOp::Ne, _, _)));
            }
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_function_call_with_args() {
        let ast = parse("isMin(a.b, 3, -2)").unwrap();
        match ast {
            Expr::Call(name, args) => {
                assert_eq!(name, "isMin");
                assert_eq!(args.len(), 3);
                assert!(matches!(args[2], Expr::Neg(_)));
            }
            other => panic!("Expected Call, got {:?}", other),
        }
        assert_eq!(parse("f()").unwrap(), Expr::Call("f".to_string(), vec![]));
    }

    #[test]
    fn test_not_and_parens() {
        let ast = parse("!(a && b)").unwrap();
        assert!(matches!(ast, Expr::Not(_)));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse(r#""say \"hi\"""#).unwrap(),
            Expr::Literal(Value::String("say \"hi\"".to_string()))
        );
    }

    #[test]
    fn test_parse_errors_report_offset() {
        match parse("a && ") {
            Err(GuardError::Parse { offset, .. }) => assert_eq!(offset, 5),
            other => panic!("Expected parse error, got {:?}", other),
        }
        assert!(parse("a b").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("'open").is_err());
        assert!(parse("a = b").is_err());
        assert!(parse("a.").is_err());
        assert!(parse("f(a b)").is_err());
    }
}
