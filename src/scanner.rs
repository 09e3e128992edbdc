//! Module `scanner` implements a one‑pass, pull‑based lexer for the Quill language.
//!
//! It transforms a source string into a sequence of [`Token`]s, skipping whitespace
//! and `//` comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields one `Token` per `.next()`.  Lexical failures do **not** stop the
//!   scan: an unexpected character becomes an `UNKNOWN` token carrying that
//!   character, an unterminated string becomes an `UNKNOWN` token with empty
//!   text.  The consumer decides how to report them.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `/`.
//! - Two‑character operators, matched greedily: `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"`, multi‑line, no escape processing.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comment skipping uses `memchr` to jump straight to the next newline.
//!
//! # Example
//!
//! ```rust
//! use quill::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! let kinds: Vec<&str> = scanner.map(|t| t.token_type.name()).collect();
//! assert_eq!(kinds, ["PRINT", "NUMBER", "SEMICOLON", "EOF"]);
//! ```

use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

/// Reserved words, matched on the raw identifier bytes.
static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fn"     => TokenType::FN,
    b"if"     => TokenType::IF,
    b"let"    => TokenType::LET,
    b"nil"    => TokenType::NIL,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"while"  => TokenType::WHILE,
};

/// Pull‑based lexer: each call to `next` scans just far enough to produce
/// one [`Token`].
pub struct Scanner<'a> {
    src: &'a str,
    /// Byte offset where the lexeme being scanned begins.
    start: usize,
    /// Byte offset of the next unread byte.
    curr: usize,
    line: usize,
    /// Set once `EOF` has been handed out.
    finished: bool,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            finished: false,
        }
    }

    /// Current line counter.  After the scan finishes this is the last line.
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn remaining(&self) -> &'a [u8] {
        &self.bytes()[self.curr..]
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Consume one byte.  Callers check [`is_at_end`] first.
    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.remaining().get(offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    /// `matched` if the next byte is `=` (which is consumed), else `single`.
    #[inline(always)]
    fn with_equals(&mut self, matched: TokenType, single: TokenType) -> TokenType {
        if self.peek() == b'=' {
            self.curr += 1;
            matched
        } else {
            single
        }
    }

    /// Recognise the lexeme starting at `self.start`.  Returns `None` for
    /// whitespace and comments.
    fn scan_token(&mut self) -> Option<TokenType> {
        let b = self.bump();

        if let Some(tt) = punctuator(b) {
            return Some(tt);
        }

        match b {
            b'!' => Some(self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG)),
            b'=' => Some(self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL)),
            b'<' => Some(self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS)),
            b'>' => Some(self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER)),

            b' ' | b'\r' | b'\t' => None,

            b'\n' => {
                self.line += 1;
                None
            }

            b'/' if self.peek() == b'/' => {
                // Stop on the newline itself so the line counter still sees it.
                self.curr = match memchr(b'\n', self.remaining()) {
                    Some(pos) => self.curr + pos,
                    None => self.src.len(),
                };
                None
            }

            b'/' => Some(TokenType::SLASH),

            b'"' => Some(self.scan_string()),

            b'0'..=b'9' => Some(self.scan_number()),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Some(self.scan_identifier()),

            _ => {
                // Take the whole scalar so the lexeme is a valid `&str`.
                while !self.src.is_char_boundary(self.curr) {
                    self.curr += 1;
                }

                debug!(
                    "Unexpected character {:?} on line {}",
                    &self.src[self.start..self.curr],
                    self.line
                );

                Some(TokenType::UNKNOWN)
            }
        }
    }

    /// Double‑quoted string; `self.start` is on the opening quote.  Newlines
    /// are allowed and counted.  Running out of input yields `UNKNOWN` with
    /// an empty lexeme.
    fn scan_string(&mut self) -> TokenType {
        let Some(len) = memchr(b'"', self.remaining()) else {
            self.line += memchr::memchr_iter(b'\n', self.remaining()).count();
            self.curr = self.src.len();
            self.start = self.curr;

            debug!("Unterminated string ending on line {}", self.line);
            return TokenType::UNKNOWN;
        };

        let body: &'a str = &self.src[self.curr..self.curr + len];

        self.line += memchr::memchr_iter(b'\n', body.as_bytes()).count();
        self.curr += len + 1;

        TokenType::STRING(body.to_owned())
    }

    /// `123` or `3.14`.  A trailing `.` without digits is left for the next
    /// token.
    fn scan_number(&mut self) -> TokenType {
        self.skip_digits();

        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            self.skip_digits();
        }

        // only ASCII digits and at most one dot reach here
        let value: f64 = self.src[self.start..self.curr].parse().unwrap_or(0.0);

        TokenType::NUMBER(value)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }
    }

    /// Identifier or reserved word, looked up in [`KEYWORDS`].
    fn scan_identifier(&mut self) -> TokenType {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.bytes()[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

/// Tokens that are always exactly one byte long.
fn punctuator(b: u8) -> Option<TokenType> {
    let tt = match b {
        b'(' => TokenType::LEFT_PAREN,
        b')' => TokenType::RIGHT_PAREN,
        b'{' => TokenType::LEFT_BRACE,
        b'}' => TokenType::RIGHT_BRACE,
        b',' => TokenType::COMMA,
        b'.' => TokenType::DOT,
        b'-' => TokenType::MINUS,
        b'+' => TokenType::PLUS,
        b';' => TokenType::SEMICOLON,
        b'*' => TokenType::STAR,
        _ => return None,
    };

    Some(tt)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            if let Some(tt) = self.scan_token() {
                let lexeme: &str = &self.src[self.start..self.curr];

                return Some(Token::new(tt, lexeme, self.line));
            }
        }

        self.finished = true;
        info!("Scanner reached end of input on line {}", self.line);

        Some(Token::new(TokenType::EOF, "", self.line))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
