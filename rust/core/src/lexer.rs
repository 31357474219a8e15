// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exchange file lexer
//!
//! A small state machine over the input text:
//!
//! - **Preamble**: everything before `ISO-10303-21;` is discarded, bounded
//!   by the header scan limit.
//! - **Standard**: header section and `DATA` parameter lists, one token per
//!   literal, keyword or punctuation mark.
//! - **DataBody**: inside a DATA section. With [`LexMode::RawCapture`] the
//!   parameter text of every entity instance is captured as one balanced
//!   [`TokenKind::Raw`] token, or as [`TokenKind::UnclosedRaw`] when a `;`
//!   arrives before the parentheses balance.
//!
//! Literal recognizers are nom combinators; terminator searches use memchr.

use crate::binary::Binary;
use crate::error::{Error, Result};
use crate::options::{LexMode, ParseOptions};
use crate::schema::SchemaRegistry;
use nom::{
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1, one_of, satisfy},
    combinator::{opt, recognize},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use std::borrow::Cow;
use std::fmt;

/// Opening marker of the exchange structure
pub const PART21_START_MARKER: &str = "ISO-10303-21;";

const PART21_END_KEYWORD: &str = "END-ISO-10303-21";

/// How a keyword token was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass<'a> {
    /// Not in the active schema's table
    Standard,
    /// Found in the active schema, with its token type
    Schema(&'a str),
    /// `!` prefixed keyword
    UserDefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword<'a> {
    pub name: Cow<'a, str>,
    pub class: KeywordClass<'a>,
}

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    /// `ISO-10303-21;`
    Part21Start,
    /// `END-ISO-10303-21;`
    Part21End,
    /// `HEADER;`
    HeaderSec,
    /// `ENDSEC;`
    EndSec,
    /// `DATA`, followed by `;` or a parameter list
    Data,
    Integer(i64),
    Real(f64),
    /// String contents with `''` unescaped
    String(Cow<'a, str>),
    Binary(Binary),
    /// Enumeration name without the dots
    Enumeration(Cow<'a, str>),
    /// `#123`
    EntityInstanceName(u64),
    Keyword(Keyword<'a>),
    LParen,
    RParen,
    Comma,
    Semicolon,
    Equals,
    Asterisk,
    Dollar,
    /// Balanced parameter text including the outer parentheses
    Raw(&'a str),
    /// Parameter text cut off by a `;` before its parentheses balanced
    UnclosedRaw(&'a str),
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Part21Start => f.write_str("'ISO-10303-21;'"),
            TokenKind::Part21End => f.write_str("'END-ISO-10303-21;'"),
            TokenKind::HeaderSec => f.write_str("'HEADER;'"),
            TokenKind::EndSec => f.write_str("'ENDSEC;'"),
            TokenKind::Data => f.write_str("'DATA'"),
            TokenKind::Integer(i) => write!(f, "integer {}", i),
            TokenKind::Real(r) => write!(f, "real {}", r),
            TokenKind::String(_) => f.write_str("string"),
            TokenKind::Binary(_) => f.write_str("binary"),
            TokenKind::Enumeration(e) => write!(f, "enumeration .{}.", e),
            TokenKind::EntityInstanceName(id) => write!(f, "#{}", id),
            TokenKind::Keyword(k) => write!(f, "keyword {}", k.name),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Equals => f.write_str("'='"),
            TokenKind::Asterisk => f.write_str("'*'"),
            TokenKind::Dollar => f.write_str("'$'"),
            TokenKind::Raw(_) => f.write_str("parameter list"),
            TokenKind::UnclosedRaw(_) => f.write_str("unbalanced parameter list"),
        }
    }
}

/// Token with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// 1-based line of the first character
    pub line: usize,
    /// Byte offset of the first character
    pub offset: usize,
    /// Byte offset just past the last character
    pub end: usize,
}

/// Lexer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Preamble,
    Standard,
    DataBody,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Equals,
    EntityKeyword,
    Other,
}

/// Stateful exchange file lexer
pub struct Lexer<'a> {
    text: &'a str,
    registry: &'a SchemaRegistry,
    mode: LexMode,
    compatibility_mode: bool,
    header_scan_limit: usize,
    pos: usize,
    line: usize,
    state: LexState,
    last: Last,
    /// Between `DATA` and the `;` that opens the section body
    data_pending: bool,
    depth: usize,
    scratch: String,
}

impl<'a> Lexer<'a> {
    /// Create a lexer resolving keywords against `registry`
    pub fn new(text: &'a str, registry: &'a SchemaRegistry, options: &ParseOptions) -> Self {
        Self {
            text,
            registry,
            mode: options.lex_mode,
            compatibility_mode: options.compatibility_mode,
            header_scan_limit: options.header_scan_limit,
            pos: 0,
            line: 1,
            state: LexState::Preamble,
            last: Last::Other,
            data_pending: false,
            depth: 0,
            scratch: String::new(),
        }
    }

    /// Override the DATA section tokenization
    pub fn with_mode(mut self, mode: LexMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    pub fn mode(&self) -> LexMode {
        self.mode
    }

    #[inline]
    pub fn state(&self) -> LexState {
        self.state
    }

    /// Current 1-based line
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Rewind to the start of the input
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.state = LexState::Preamble;
        self.last = Last::Other;
        self.data_pending = false;
        self.depth = 0;
    }

    /// Tokenize the remaining input
    pub fn tokenize(&mut self) -> Result<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Next token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        match self.state {
            LexState::Preamble => return self.scan_preamble(),
            LexState::Finished => return Ok(None),
            LexState::Standard | LexState::DataBody => {}
        }

        self.skip_trivia()?;

        let bytes = self.text.as_bytes();
        if self.pos >= bytes.len() {
            return Ok(None);
        }

        let start = self.pos;
        let line = self.line;

        let kind = match bytes[start] {
            b'(' if self.captures_raw() => self.capture_raw()?,
            b'(' => {
                self.pos += 1;
                if self.data_pending {
                    self.depth += 1;
                }
                TokenKind::LParen
            }
            b')' => {
                self.pos += 1;
                if self.data_pending {
                    self.depth = self.depth.saturating_sub(1);
                }
                TokenKind::RParen
            }
            b',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            b';' => {
                self.pos += 1;
                if self.data_pending && self.depth == 0 {
                    self.data_pending = false;
                    self.state = LexState::DataBody;
                }
                TokenKind::Semicolon
            }
            b'=' => {
                self.pos += 1;
                TokenKind::Equals
            }
            b'*' => {
                self.pos += 1;
                TokenKind::Asterisk
            }
            b'$' => {
                self.pos += 1;
                TokenKind::Dollar
            }
            b'#' => self.entity_instance_name()?,
            b'\'' => self.string()?,
            b'"' => self.binary()?,
            b'.' => self.enumeration()?,
            b'+' | b'-' | b'0'..=b'9' => self.number()?,
            b'!' => self.user_keyword()?,
            b if b.is_ascii_alphabetic() || b == b'_' => self.keyword()?,
            _ => {
                return Err(Error::scan(line, "unexpected character", &self.text[start..]));
            }
        };

        self.last = match (&kind, self.last) {
            (TokenKind::Equals, _) => Last::Equals,
            (TokenKind::Keyword(_), Last::Equals) => Last::EntityKeyword,
            _ => Last::Other,
        };

        Ok(Some(Token {
            kind,
            line,
            offset: start,
            end: self.pos,
        }))
    }

    /// Discard everything up to and including the opening marker
    fn scan_preamble(&mut self) -> Result<Option<Token<'a>>> {
        let bytes = self.text.as_bytes();
        let region_end = bytes.len().min(self.header_scan_limit);
        let marker = PART21_START_MARKER.as_bytes();
        let mut pos = self.pos;

        while pos < region_end {
            let rest = &bytes[pos..region_end];
            let found = self.find_marker(rest);
            let comment = memchr::memmem::find(rest, b"/*");

            match (found, comment) {
                (Some(m), Some(c)) if c < m => pos = self.comment_end(pos + c)?,
                (None, Some(c)) => pos = self.comment_end(pos + c)?,
                (Some(m), _) => {
                    let start = pos + m;
                    let end = start + marker.len();
                    let line = self.line + count_newlines(&bytes[self.pos..start]);
                    self.line = line;
                    self.pos = end;
                    self.state = LexState::Standard;
                    self.last = Last::Other;
                    return Ok(Some(Token {
                        kind: TokenKind::Part21Start,
                        line,
                        offset: start,
                        end,
                    }));
                }
                (None, None) => break,
            }
        }

        if bytes.len() > self.header_scan_limit {
            let line = self.line + count_newlines(&bytes[self.pos..region_end]);
            return Err(Error::scan(
                line,
                format!(
                    "'{}' not found within the first {} bytes",
                    PART21_START_MARKER, self.header_scan_limit
                ),
                &self.text[self.pos..],
            ));
        }

        self.line += count_newlines(&bytes[self.pos..]);
        self.pos = bytes.len();
        self.state = LexState::Finished;
        Ok(None)
    }

    /// First opening marker in `haystack`, any case in compatibility mode
    fn find_marker(&self, haystack: &[u8]) -> Option<usize> {
        let marker = PART21_START_MARKER.as_bytes();
        if !self.compatibility_mode {
            return memchr::memmem::find(haystack, marker);
        }
        memchr::memchr2_iter(b'I', b'i', haystack).find(|&at| {
            haystack
                .get(at..at + marker.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(marker))
        })
    }

    /// Offset just past the comment opening at `start`, counting its lines
    fn comment_end(&mut self, start: usize) -> Result<usize> {
        let bytes = self.text.as_bytes();
        match memchr::memmem::find(&bytes[start + 2..], b"*/") {
            Some(offset) => Ok(start + 2 + offset + 2),
            None => {
                let line = self.line + count_newlines(&bytes[self.pos..start]);
                Err(Error::scan(line, "unterminated comment", &self.text[start..]))
            }
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<()> {
        let bytes = self.text.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                if bytes[self.pos] == b'\n' {
                    self.line += 1;
                }
                self.pos += 1;
            }

            if bytes[self.pos..].starts_with(b"/*") {
                let end = self.comment_end(self.pos)?;
                self.line += count_newlines(&bytes[self.pos..end]);
                self.pos = end;
                continue;
            }

            return Ok(());
        }
    }

    #[inline]
    fn captures_raw(&self) -> bool {
        self.mode == LexMode::RawCapture
            && self.state == LexState::DataBody
            && matches!(self.last, Last::Equals | Last::EntityKeyword)
    }

    /// Capture a balanced parameter list as one token
    ///
    /// A `;` outside literals ends the statement: the text before it comes
    /// back as [`TokenKind::UnclosedRaw`] and the `;` stays in the input.
    fn capture_raw(&mut self) -> Result<TokenKind<'a>> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let len = bytes.len();
        let mut depth = 0usize;
        let mut i = start;

        while i < len {
            match bytes[i] {
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        self.line += count_newlines(&bytes[start..i]);
                        self.pos = i;
                        return Ok(TokenKind::Raw(&self.text[start..i]));
                    }
                }
                b'\'' => {
                    i = string_end(bytes, i + 1).ok_or_else(|| {
                        Error::scan(
                            self.line + count_newlines(&bytes[start..i]),
                            "unterminated string",
                            &self.text[i..],
                        )
                    })?;
                }
                b'"' => {
                    i = memchr::memchr(b'"', &bytes[i + 1..])
                        .map(|offset| i + 1 + offset + 1)
                        .ok_or_else(|| {
                            Error::scan(
                                self.line + count_newlines(&bytes[start..i]),
                                "unterminated binary literal",
                                &self.text[i..],
                            )
                        })?;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = memchr::memmem::find(&bytes[i + 2..], b"*/")
                        .map(|offset| i + 2 + offset + 2)
                        .ok_or_else(|| {
                            Error::scan(
                                self.line + count_newlines(&bytes[start..i]),
                                "unterminated comment",
                                &self.text[i..],
                            )
                        })?;
                }
                b';' => {
                    self.line += count_newlines(&bytes[start..i]);
                    self.pos = i;
                    return Ok(TokenKind::UnclosedRaw(&self.text[start..i]));
                }
                b'#' => {
                    let digits = i + 1 + bytes[i + 1..]
                        .iter()
                        .take_while(|b| b.is_ascii_digit())
                        .count();
                    if digits > i + 1 && lexical_core::parse::<u64>(&bytes[i + 1..digits]).is_err() {
                        return Err(Error::scan(
                            self.line + count_newlines(&bytes[start..i]),
                            "entity instance name out of range",
                            &self.text[i..],
                        ));
                    }
                    i = digits;
                }
                _ => i += 1,
            }
        }

        Err(Error::scan(
            self.line,
            "unterminated parameter list",
            &self.text[start..],
        ))
    }

    fn entity_instance_name(&mut self) -> Result<TokenKind<'a>> {
        let rest = &self.text[self.pos..];
        let (remaining, digits) = preceded(char('#'), digit1)(rest)
            .map_err(|_: nom::Err<nom::error::Error<&str>>| {
                Error::scan(self.line, "malformed entity instance name", rest)
            })?;
        let id = lexical_core::parse::<u64>(digits.as_bytes())
            .map_err(|_| Error::scan(self.line, "entity instance name out of range", rest))?;
        self.advance_to(remaining);
        Ok(TokenKind::EntityInstanceName(id))
    }

    fn string(&mut self) -> Result<TokenKind<'a>> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let end = string_end(bytes, start + 1)
            .ok_or_else(|| Error::scan(self.line, "unterminated string", &self.text[start..]))?;

        let content = &self.text[start + 1..end - 1];
        self.line += count_newlines(content.as_bytes());
        self.pos = end;

        if memchr::memchr(b'\'', content.as_bytes()).is_some() {
            Ok(TokenKind::String(Cow::Owned(content.replace("''", "'"))))
        } else {
            Ok(TokenKind::String(Cow::Borrowed(content)))
        }
    }

    fn binary(&mut self) -> Result<TokenKind<'a>> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let close = memchr::memchr(b'"', &bytes[start + 1..]).ok_or_else(|| {
            Error::scan(self.line, "unterminated binary literal", &self.text[start..])
        })?;
        let content = &self.text[start + 1..start + 1 + close];
        self.line += count_newlines(content.as_bytes());
        self.pos = start + close + 2;
        Ok(TokenKind::Binary(Binary::decode(content)))
    }

    fn enumeration(&mut self) -> Result<TokenKind<'a>> {
        let rest = &self.text[self.pos..];
        let (remaining, name) = enumeration_literal(rest)
            .map_err(|_| Error::scan(self.line, "malformed enumeration", rest))?;
        let name = self.fold_case(name, "enumeration", rest)?;
        self.advance_to(remaining);
        Ok(TokenKind::Enumeration(name))
    }

    fn number(&mut self) -> Result<TokenKind<'a>> {
        let rest = &self.text[self.pos..];
        let (remaining, parts) = numeric_literal(rest)
            .map_err(|_| Error::scan(self.line, "unexpected character", rest))?;

        let kind = match parts.fraction {
            Some(fraction) => {
                self.scratch.clear();
                self.scratch.push_str(parts.digits);
                self.scratch.push('.');
                if fraction.is_empty() {
                    self.scratch.push('0');
                } else {
                    self.scratch.push_str(fraction);
                }
                if let Some((negative, exponent)) = parts.exponent {
                    self.scratch.push('e');
                    if negative {
                        self.scratch.push('-');
                    }
                    self.scratch.push_str(exponent);
                }
                let value: f64 = fast_float::parse(self.scratch.as_str())
                    .map_err(|_| Error::scan(self.line, "malformed real", rest))?;
                TokenKind::Real(if parts.negative { -value } else { value })
            }
            None => {
                let magnitude = lexical_core::parse::<u64>(parts.digits.as_bytes())
                    .map_err(|_| Error::scan(self.line, "integer out of range", rest))?;
                let value = match (parts.negative, magnitude) {
                    (false, m) if m <= i64::MAX as u64 => m as i64,
                    (true, m) if m <= i64::MAX as u64 + 1 => (m as i64).wrapping_neg(),
                    _ => return Err(Error::scan(self.line, "integer out of range", rest)),
                };
                TokenKind::Integer(value)
            }
        };

        self.advance_to(remaining);
        Ok(kind)
    }

    fn user_keyword(&mut self) -> Result<TokenKind<'a>> {
        let rest = &self.text[self.pos..];
        let (remaining, name) = recognize(preceded(char('!'), identifier))(rest)
            .map_err(|_: nom::Err<nom::error::Error<&str>>| {
                Error::scan(self.line, "malformed user-defined keyword", rest)
            })?;
        self.advance_to(remaining);
        Ok(TokenKind::Keyword(Keyword {
            name: Cow::Borrowed(name),
            class: KeywordClass::UserDefined,
        }))
    }

    fn keyword(&mut self) -> Result<TokenKind<'a>> {
        let rest = &self.text[self.pos..];

        if self.matches_end_keyword(rest) {
            self.pos += PART21_END_KEYWORD.len();
            self.skip_trivia()?;
            if self.text.as_bytes().get(self.pos) != Some(&b';') {
                return Err(Error::scan(
                    self.line,
                    format!("expected ';' after {}", PART21_END_KEYWORD),
                    &self.text[self.pos..],
                ));
            }
            self.pos += 1;
            self.state = LexState::Finished;
            return Ok(TokenKind::Part21End);
        }

        let (remaining, name) = identifier(rest)
            .map_err(|_| Error::scan(self.line, "malformed keyword", rest))?;
        let name = self.fold_case(name, "keyword", rest)?;
        self.advance_to(remaining);

        match name.as_ref() {
            "HEADER" | "ENDSEC" => {
                self.skip_trivia()?;
                if self.text.as_bytes().get(self.pos) == Some(&b';') {
                    self.pos += 1;
                    if name == "HEADER" {
                        return Ok(TokenKind::HeaderSec);
                    }
                    if self.state == LexState::DataBody {
                        self.state = LexState::Standard;
                    }
                    return Ok(TokenKind::EndSec);
                }
            }
            "DATA" if self.state == LexState::Standard => {
                self.skip_trivia()?;
                if matches!(self.text.as_bytes().get(self.pos), Some(b'(') | Some(b';')) {
                    self.data_pending = true;
                    self.depth = 0;
                    return Ok(TokenKind::Data);
                }
            }
            _ => {}
        }

        let class = match self.registry.lookup(&name) {
            Some(token_type) => KeywordClass::Schema(token_type),
            None => KeywordClass::Standard,
        };
        Ok(TokenKind::Keyword(Keyword { name, class }))
    }

    fn matches_end_keyword(&self, rest: &str) -> bool {
        match rest.get(..PART21_END_KEYWORD.len()) {
            Some(head) if self.compatibility_mode => head.eq_ignore_ascii_case(PART21_END_KEYWORD),
            Some(head) => head == PART21_END_KEYWORD,
            None => false,
        }
    }

    /// Enforce upper-case, folding in compatibility mode
    fn fold_case(&self, name: &'a str, what: &str, rest: &str) -> Result<Cow<'a, str>> {
        if !name.bytes().any(|b| b.is_ascii_lowercase()) {
            return Ok(Cow::Borrowed(name));
        }
        if self.compatibility_mode {
            return Ok(Cow::Owned(name.to_ascii_uppercase()));
        }
        Err(Error::scan(
            self.line,
            format!("{} '{}' must be upper-case", what, name),
            rest,
        ))
    }

    #[inline]
    fn advance_to(&mut self, remaining: &str) {
        self.pos = self.text.len() - remaining.len();
    }
}

/// Offset just past the quote closing a string whose contents start at `i`
pub(crate) fn string_end(bytes: &[u8], mut i: usize) -> Option<usize> {
    let len = bytes.len();
    while i < len {
        let offset = memchr::memchr(b'\'', &bytes[i..])?;
        i += offset + 1;
        // '' is an escaped quote
        if i < len && bytes[i] == b'\'' {
            i += 1;
        } else {
            return Some(i);
        }
    }
    None
}

#[inline]
fn count_newlines(bytes: &[u8]) -> usize {
    memchr::memchr_iter(b'\n', bytes).count()
}

/// Keyword: letter or underscore, then letters, digits, underscores
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Enumeration: `.NAME.`
fn enumeration_literal(input: &str) -> IResult<&str, &str> {
    delimited(char('.'), identifier, char('.'))(input)
}

struct NumericParts<'a> {
    negative: bool,
    digits: &'a str,
    fraction: Option<&'a str>,
    exponent: Option<(bool, &'a str)>,
}

/// Sign run, accepted leniently (`+-5` is -5)
fn signs(input: &str) -> IResult<&str, &str> {
    take_while(|c| c == '+' || c == '-')(input)
}

fn is_negative(signs: &str) -> bool {
    signs.bytes().filter(|&b| b == b'-').count() % 2 == 1
}

/// `[+-]* digits ('.' digits* (E [+-]* digits)?)?`
fn numeric_literal(input: &str) -> IResult<&str, NumericParts<'_>> {
    let (rest, (sign, digits, tail)) = tuple((
        signs,
        digit1,
        opt(pair(
            preceded(char('.'), digit0),
            opt(preceded(one_of("eE"), pair(signs, digit1))),
        )),
    ))(input)?;

    let (fraction, exponent) = match tail {
        Some((fraction, exponent)) => (
            Some(fraction),
            exponent.map(|(sign, digits)| (is_negative(sign), digits)),
        ),
        None => (None, None),
    };

    Ok((
        rest,
        NumericParts {
            negative: is_negative(sign),
            digits,
            fraction,
            exponent,
        },
    ))
}
