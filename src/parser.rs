//! Parsing the indentation-structured surface syntax back into programs.
//!
//! The lexer turns leading whitespace into INDENT/DEDENT tokens against a
//! stack of indentation prefixes, then tokenizes the rest of each line; the
//! parser is a plain recursive descent over that token stream. Rendering a
//! program and re-parsing it yields a structurally equal AST, which is what
//! lets sketches be written in the same syntax the synthesizer prints.

use thiserror::Error;

use crate::ast::{Aexp, Cmd, GateKind, Pgm};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {0}: inconsistent indentation")]
    BadIndentation(usize),
    #[error("line {0}: unexpected character `{1}`")]
    UnexpectedChar(usize, char),
    #[error("line {0}: expected {1}")]
    Expected(usize, String),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("line {0}: unknown gate `{1}`")]
    UnknownGate(usize, String),
    #[error("line {0}: gate `{1}` takes {2} arguments, got {3}")]
    GateArity(usize, String, usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Newline,
    Indent,
    Dedent,
    Def,
    For,
    In,
    Range,
    LParen,
    RParen,
    Colon,
    Comma,
    Plus,
    Minus,
    Star,
    DoubleSlash,
    Hole,
    Id(String),
    Int(i64),
}

impl Token {
    fn describe(&self) -> &'static str {
        match self {
            Token::Newline => "end of line",
            Token::Indent => "an indented block",
            Token::Dedent => "the end of a block",
            Token::Def => "`def`",
            Token::For => "`for`",
            Token::In => "`in`",
            Token::Range => "`range`",
            Token::LParen => "`(`",
            Token::RParen => "`)`",
            Token::Colon => "`:`",
            Token::Comma => "`,`",
            Token::Plus => "`+`",
            Token::Minus => "`-`",
            Token::Star => "`*`",
            Token::DoubleSlash => "`//`",
            Token::Hole => "`_`",
            Token::Id(_) => "an identifier",
            Token::Int(_) => "an integer",
        }
    }
}

fn lex(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut indents: Vec<String> = vec![String::new()];
    let mut last_line = 1;

    for (idx, raw_line) in source.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw_line.trim_end();
        if line.trim_start().is_empty() {
            continue;
        }
        last_line = lineno;

        let ws: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let current = indents.last().expect("indent stack is never empty");
        if ws != *current {
            if ws.starts_with(current.as_str()) {
                indents.push(ws.clone());
                tokens.push((Token::Indent, lineno));
            } else {
                while ws != *indents.last().expect("indent stack is never empty") {
                    indents.pop();
                    if indents.is_empty() {
                        return Err(ParseError::BadIndentation(lineno));
                    }
                    tokens.push((Token::Dedent, lineno));
                }
            }
        }

        lex_line(&line[ws.len()..], lineno, &mut tokens)?;
        tokens.push((Token::Newline, lineno));
    }

    while indents.len() > 1 {
        indents.pop();
        tokens.push((Token::Dedent, last_line));
    }
    Ok(tokens)
}

fn lex_line(
    body: &str,
    lineno: usize,
    out: &mut Vec<(Token, usize)>,
) -> Result<(), ParseError> {
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        let token = match c {
            ' ' | '\t' => continue,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => {
                if chars.next_if_eq(&'/').is_none() {
                    return Err(ParseError::UnexpectedChar(lineno, '/'));
                }
                Token::DoubleSlash
            }
            '_' => Token::Hole,
            c if c.is_ascii_digit() => {
                let mut value = (c as u8 - b'0') as i64;
                while let Some(d) = chars.next_if(|c| c.is_ascii_digit()) {
                    value = value * 10 + (d as u8 - b'0') as i64;
                }
                Token::Int(value)
            }
            c if c.is_ascii_alphabetic() => {
                let mut name = String::from(c);
                while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric()) {
                    name.push(c);
                }
                match name.as_str() {
                    "def" => Token::Def,
                    "for" => Token::For,
                    "in" => Token::In,
                    "range" => Token::Range,
                    _ => Token::Id(name),
                }
            }
            other => return Err(ParseError::UnexpectedChar(lineno, other)),
        };
        out.push((token, lineno));
    }
    Ok(())
}

/// Parse a whole program.
pub fn parse(source: &str) -> Result<Pgm, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let pgm = parser.pgm()?;
    if let Some((token, lineno)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::Expected(
            *lineno,
            format!("end of input, found {}", token.describe()),
        ));
    }
    Ok(pgm)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|(_, lineno)| *lineno)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, want: &Token) -> Result<(), ParseError> {
        match self.advance() {
            Some(token) if token == *want => Ok(()),
            Some(token) => Err(ParseError::Expected(
                self.line(),
                format!("{}, found {}", want.describe(), token.describe()),
            )),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn expect_id(&mut self, what: &str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token::Id(name)) => Ok(name),
            Some(token) => Err(ParseError::Expected(
                self.line(),
                format!("{what}, found {}", token.describe()),
            )),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn pgm(&mut self) -> Result<Pgm, ParseError> {
        self.expect(&Token::Def)?;
        let _name = self.expect_id("a function name")?;
        self.expect(&Token::LParen)?;
        let param = self.expect_id("a parameter name")?;
        self.expect(&Token::RParen)?;
        self.expect(&Token::Colon)?;
        self.expect(&Token::Newline)?;
        self.expect(&Token::Indent)?;
        let body = self.cmd_seq()?;
        self.expect(&Token::Dedent)?;
        Ok(Pgm::new(param, body))
    }

    fn cmd_seq(&mut self) -> Result<Cmd, ParseError> {
        let first = self.cmd()?;
        if matches!(self.peek(), Some(Token::Dedent) | None) {
            Ok(first)
        } else {
            let rest = self.cmd_seq()?;
            Ok(Cmd::seq(first, rest))
        }
    }

    fn cmd(&mut self) -> Result<Cmd, ParseError> {
        match self.peek() {
            Some(Token::Hole) => {
                self.advance();
                self.expect(&Token::Newline)?;
                Ok(Cmd::Hole)
            }
            Some(Token::For) => {
                self.advance();
                let var = self.expect_id("a loop variable")?;
                self.expect(&Token::In)?;
                self.expect(&Token::Range)?;
                self.expect(&Token::LParen)?;
                let start = self.aexp()?;
                self.expect(&Token::Comma)?;
                let end = self.aexp()?;
                self.expect(&Token::RParen)?;
                self.expect(&Token::Colon)?;
                self.expect(&Token::Newline)?;
                self.expect(&Token::Indent)?;
                let body = self.cmd_seq()?;
                self.expect(&Token::Dedent)?;
                Ok(Cmd::for_loop(var, start, end, body))
            }
            Some(Token::Id(_)) => {
                let line = self.line();
                let name = self.expect_id("a gate name")?;
                let Some(kind) = GateKind::from_name(&name) else {
                    return Err(ParseError::UnknownGate(line, name));
                };
                self.expect(&Token::LParen)?;
                let mut args = vec![self.aexp()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    args.push(self.aexp()?);
                }
                self.expect(&Token::RParen)?;
                self.expect(&Token::Newline)?;
                let Some(gate) = kind.instantiate(&args) else {
                    return Err(ParseError::GateArity(
                        line,
                        name,
                        kind.arity(),
                        args.len(),
                    ));
                };
                Ok(Cmd::Gate(gate))
            }
            Some(token) => Err(ParseError::Expected(
                self.line(),
                format!("a command, found {}", token.describe()),
            )),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn aexp(&mut self) -> Result<Aexp, ParseError> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    left = Aexp::add(left, self.term()?);
                }
                Some(Token::Minus) => {
                    self.advance();
                    left = Aexp::sub(left, self.term()?);
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<Aexp, ParseError> {
        let mut left = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    left = Aexp::mul(left, self.factor()?);
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    left = Aexp::div(left, self.factor()?);
                }
                _ => return Ok(left),
            }
        }
    }

    fn factor(&mut self) -> Result<Aexp, ParseError> {
        match self.advance() {
            Some(Token::Hole) => Ok(Aexp::Hole),
            Some(Token::Int(value)) => Ok(Aexp::Int(value)),
            Some(Token::Id(name)) => Ok(Aexp::Var(name)),
            Some(Token::LParen) => {
                let inner = self.aexp()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(ParseError::Expected(
                self.line(),
                format!("an expression, found {}", token.describe()),
            )),
            None => Err(ParseError::UnexpectedEof),
        }
    }
}
