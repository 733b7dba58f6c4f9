use crate::error::HostParseError;

use super::Section;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f32),
    // Punctuation
    LParen,
    RParen,
    Comma,
    Semi,
    Dot,
    Question,
    Colon,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    // Sentinel
    Eof,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    col: usize,
    section: Section,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str, section: Section) -> Self {
        Self { src, pos: 0, line: 1, col: 1, section }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, HostParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (line, col) = (self.line, self.col);
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(TokenWithPos { token, line, col });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn err(&self, message: impl Into<String>) -> HostParseError {
        HostParseError::Syntax {
            section: self.section,
            line: self.line,
            col: self.col,
            message: message.into(),
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            if self.rest().starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if self.rest().starts_with("/*") {
                self.advance();
                self.advance();
                while !self.rest().is_empty() && !self.rest().starts_with("*/") {
                    self.advance();
                }
                // An unterminated comment simply runs to the end.
                self.advance();
                self.advance();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consumes `=` after a one-character operator if present.
    fn with_assign(&mut self, plain: Token, assigned: Token) -> Token {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            assigned
        } else {
            plain
        }
    }

    fn next_token(&mut self) -> Result<Token, HostParseError> {
        let Some(ch) = self.peek() else { return Ok(Token::Eof) };

        match ch {
            '(' => Ok(self.single(Token::LParen)),
            ')' => Ok(self.single(Token::RParen)),
            ',' => Ok(self.single(Token::Comma)),
            ';' => Ok(self.single(Token::Semi)),
            '?' => Ok(self.single(Token::Question)),
            ':' => Ok(self.single(Token::Colon)),
            '+' => Ok(self.with_assign(Token::Plus, Token::PlusAssign)),
            '-' => Ok(self.with_assign(Token::Minus, Token::MinusAssign)),
            '*' => Ok(self.with_assign(Token::Star, Token::StarAssign)),
            '/' => Ok(self.with_assign(Token::Slash, Token::SlashAssign)),
            '<' => Ok(self.with_assign(Token::Lt, Token::Le)),
            '>' => Ok(self.with_assign(Token::Gt, Token::Ge)),
            '=' => Ok(self.with_assign(Token::Assign, Token::EqEq)),
            '!' if self.peek_second() == Some('=') => {
                self.advance();
                self.advance();
                Ok(Token::NotEq)
            }
            '.' if matches!(self.peek_second(), Some(c) if c.is_ascii_digit()) => self.lex_number(),
            '.' => Ok(self.single(Token::Dot)),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_ident()),
            other => Err(self.err(format!("unexpected character {other:?}"))),
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// `12`, `1.5`, `.5`, `2.`, `1e-4`, with an optional `f`/`h` suffix.
    fn lex_number(&mut self) -> Result<Token, HostParseError> {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some('.') {
            self.advance();
            self.eat_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            self.eat_digits();
        }
        let src = self.src;
        let text = &src[start..self.pos];
        if matches!(self.peek(), Some('f' | 'F' | 'h' | 'H')) {
            self.advance();
        }
        text.parse::<f32>()
            .map(Token::Number)
            .map_err(|_| self.err(format!("invalid number {text:?}")))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        Token::Ident(self.src[start..self.pos].to_string())
    }
}
