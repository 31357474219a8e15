// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exchange file parser
//!
//! A recursive-descent reading of the exchange structure:
//!
//! ```text
//! exchange_file   := PART21_START header_section data_section+ PART21_END
//! header_section  := HEADER_SEC header_entity{3,} ENDSEC
//! data_section    := DATA ('(' parameter_list ')')? ';' entity_instance* ENDSEC
//! entity_instance := '#'N '=' (keyword '(' parameter_list? ')' | '(' (keyword '(' parameter_list? ')')+ ')') ';'
//! ```
//!
//! One grammar drives two sets of reduction actions: tree mode builds a
//! [`Model`], index mode writes rows into an [`IndexSink`]. A malformed
//! entity instance is skipped up to its terminating `;` when resync is
//! enabled; everything outside instance bodies is fatal.

use crate::error::{Error, ResyncWarning, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::model::{
    ComplexEntity, EntityInstance, EntityKind, Header, HeaderEntity, Model, Parameter, Section,
    SimpleEntity, TypedParameter,
};
use crate::options::{LexMode, ParseOptions};
use crate::schema::{KeywordSet, SchemaRegistry};
use crate::sink::{
    DataEntityRow, HeaderEntityRow, IndexReport, IndexSink, SectionKind, SectionRow,
    HEADER_SECTION_ID,
};
use crate::xref::extract_xrefs;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::time::Instant;

/// Deepest list or typed-parameter nesting accepted inside one parameter list
pub const MAX_PARAMETER_NESTING: usize = 256;

/// Tree-mode result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parsed {
    pub model: Model,
    /// Skipped malformed instances, in source order
    pub warnings: Vec<ResyncWarning>,
}

impl Parsed {
    /// True when no instance had to be skipped
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Exchange file parser
///
/// Owns the schema registry and the ref-id table. Every parse starts from a
/// [`reset`](Parser::reset), so one instance can be reused across files.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
    registry: SchemaRegistry,
    /// Defined ref ids and the line of their definition
    defined: FxHashMap<u64, usize>,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            registry: SchemaRegistry::new(),
            defined: FxHashMap::default(),
        }
    }

    /// Create a parser with a pre-populated keyword registry
    pub fn with_registry(options: ParseOptions, registry: SchemaRegistry) -> Self {
        Self {
            options,
            registry,
            defined: FxHashMap::default(),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    pub fn register_schema(&mut self, name: impl Into<String>, keywords: KeywordSet) -> Result<()> {
        self.registry.register_schema(name, keywords)?;
        Ok(())
    }

    pub fn activate_schema(&mut self, name: &str) -> Result<()> {
        self.registry.activate_schema(name)?;
        Ok(())
    }

    /// Forget every ref id seen so far
    pub fn reset(&mut self) {
        self.defined.clear();
    }

    /// Parse `text` into an in-memory model (always fine-grained lexing)
    pub fn parse(&mut self, text: &str) -> Result<Parsed> {
        self.reset();
        let started = Instant::now();
        tracing::debug!(bytes = text.len(), "Parsing exchange file");

        let mut grammar = Grammar::new(
            text,
            &self.registry,
            &self.options,
            LexMode::Tokens,
            &mut self.defined,
        );
        let mut reducer = TreeReducer::default();
        grammar.exchange_file(&mut reducer)?;
        let warnings = grammar.warnings;
        let model = reducer.finish();

        tracing::debug!(
            sections = model.sections.len(),
            entities = model.len(),
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Parsed exchange file"
        );

        Ok(Parsed { model, warnings })
    }

    /// Parse `text` straight into `sink`, committing once the file is accepted
    pub fn parse_into<S: IndexSink + ?Sized>(&mut self, text: &str, sink: &mut S) -> Result<IndexReport> {
        self.reset();
        let started = Instant::now();
        tracing::debug!(
            bytes = text.len(),
            lex_mode = ?self.options.lex_mode,
            "Indexing exchange file"
        );

        let mut grammar = Grammar::new(
            text,
            &self.registry,
            &self.options,
            self.options.lex_mode,
            &mut self.defined,
        );
        let mut reducer = IndexReducer {
            sink: &mut *sink,
            section_id: HEADER_SECTION_ID,
            extract_xrefs: self.options.extract_xrefs,
            report: IndexReport::default(),
        };
        grammar.exchange_file(&mut reducer)?;

        let line = grammar.lexer.line();
        let mut report = reducer.report;
        report.warnings = grammar.warnings;
        sink.commit().map_err(|source| Error::Sink { line, source })?;

        tracing::debug!(
            sections = report.sections,
            entities = report.entities,
            xrefs = report.xrefs,
            warnings = report.warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexed exchange file"
        );

        Ok(report)
    }
}

/// Grammar failure signal
enum Fault {
    /// Propagates unchanged
    Fatal(Error),
    /// Malformed input; recoverable inside an entity instance body
    Syntax { line: usize, message: String },
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Fault::Fatal(err)
    }
}

impl Fault {
    fn into_structural(self) -> Error {
        match self {
            Fault::Fatal(err) => err,
            Fault::Syntax { line, message } => Error::Structural { line, message },
        }
    }
}

type Step<T> = std::result::Result<T, Fault>;

/// Parsed parameters of an instance (fine-grained lexing only)
enum Body {
    Simple(Vec<Parameter>),
    Complex(Vec<TypedParameter>),
}

/// A reduced entity instance
struct Reduced<'a> {
    id: u64,
    line: usize,
    kind: EntityKind,
    type_name: Option<Cow<'a, str>>,
    /// Parameter text, parentheses included
    raw: &'a str,
    offset: usize,
    body: Option<Body>,
}

impl Reduced<'_> {
    fn into_instance(self) -> Option<EntityInstance> {
        let Reduced {
            id,
            line,
            type_name,
            body,
            ..
        } = self;
        match body? {
            Body::Simple(parameters) => Some(EntityInstance::Simple(SimpleEntity {
                id,
                type_name: type_name?.into_owned(),
                parameters,
                line,
            })),
            Body::Complex(parts) => Some(EntityInstance::Complex(ComplexEntity { id, parts, line })),
        }
    }
}

/// Reduction actions for one output mode
trait Reducer<'a> {
    fn begin_header(&mut self, line: usize) -> Result<()>;

    fn header_entity(&mut self, entity: HeaderEntity, raw: &'a str) -> Result<()>;

    fn begin_section(
        &mut self,
        id: u32,
        parameters: Option<(Vec<Parameter>, &'a str)>,
        line: usize,
    ) -> Result<()>;

    fn entity(&mut self, entity: Reduced<'a>) -> Result<()>;
}

#[derive(Default)]
struct TreeReducer {
    header: Vec<HeaderEntity>,
    sections: Vec<Section>,
}

impl TreeReducer {
    fn finish(self) -> Model {
        let mut entities = self.header.into_iter();
        let header = Header {
            file_description: entities.next().unwrap_or_default(),
            file_name: entities.next().unwrap_or_default(),
            file_schema: entities.next().unwrap_or_default(),
            extra: entities.collect(),
        };
        Model {
            header,
            sections: self.sections,
        }
    }
}

impl<'a> Reducer<'a> for TreeReducer {
    fn begin_header(&mut self, _line: usize) -> Result<()> {
        Ok(())
    }

    fn header_entity(&mut self, entity: HeaderEntity, _raw: &'a str) -> Result<()> {
        self.header.push(entity);
        Ok(())
    }

    fn begin_section(
        &mut self,
        _id: u32,
        parameters: Option<(Vec<Parameter>, &'a str)>,
        line: usize,
    ) -> Result<()> {
        self.sections.push(Section {
            parameters: parameters.map(|(parameters, _)| parameters),
            entities: Vec::new(),
            line,
        });
        Ok(())
    }

    fn entity(&mut self, entity: Reduced<'a>) -> Result<()> {
        let line = entity.line;
        let instance = entity
            .into_instance()
            .ok_or_else(|| Error::structural(line, "unparsed parameter text in tree mode"))?;
        match self.sections.last_mut() {
            Some(section) => {
                section.entities.push(instance);
                Ok(())
            }
            None => Err(Error::structural(line, "entity instance outside a DATA section")),
        }
    }
}

struct IndexReducer<'s, S: IndexSink + ?Sized> {
    sink: &'s mut S,
    section_id: u32,
    extract_xrefs: bool,
    report: IndexReport,
}

impl<'a, S: IndexSink + ?Sized> Reducer<'a> for IndexReducer<'_, S> {
    fn begin_header(&mut self, line: usize) -> Result<()> {
        self.sink
            .insert_section(SectionRow {
                id: HEADER_SECTION_ID,
                kind: SectionKind::Header,
                raw_parameters: None,
                line,
            })
            .map_err(|source| Error::Sink { line, source })?;
        self.report.sections += 1;
        Ok(())
    }

    fn header_entity(&mut self, entity: HeaderEntity, raw: &'a str) -> Result<()> {
        let line = entity.line;
        self.sink
            .insert_header_entity(HeaderEntityRow {
                section_id: HEADER_SECTION_ID,
                type_name: &entity.type_name,
                raw,
                line,
            })
            .map_err(|source| Error::Sink { line, source })?;
        self.report.header_entities += 1;
        Ok(())
    }

    fn begin_section(
        &mut self,
        id: u32,
        parameters: Option<(Vec<Parameter>, &'a str)>,
        line: usize,
    ) -> Result<()> {
        self.section_id = id;
        self.sink
            .insert_section(SectionRow {
                id,
                kind: SectionKind::Data,
                raw_parameters: parameters.map(|(_, raw)| raw),
                line,
            })
            .map_err(|source| Error::Sink { line, source })?;
        self.report.sections += 1;
        Ok(())
    }

    fn entity(&mut self, entity: Reduced<'a>) -> Result<()> {
        let line = entity.line;
        self.sink
            .insert_data_entity(DataEntityRow {
                section_id: self.section_id,
                id: entity.id,
                type_name: entity.type_name.as_deref(),
                raw: entity.raw,
                offset: entity.offset,
                line,
                kind: entity.kind,
            })
            .map_err(|source| Error::Sink { line, source })?;
        self.report.entities += 1;

        if self.extract_xrefs {
            for xref in extract_xrefs(entity.id, entity.raw, entity.kind) {
                self.sink
                    .insert_xref(xref)
                    .map_err(|source| Error::Sink { line, source })?;
                self.report.xrefs += 1;
            }
        }
        Ok(())
    }
}

/// Token-level grammar state for one parse
struct Grammar<'a, 'p> {
    lexer: Lexer<'a>,
    peeked: Option<Token<'a>>,
    options: &'p ParseOptions,
    defined: &'p mut FxHashMap<u64, usize>,
    /// Instance being reduced, and whether its id was registered
    pending: Option<(u64, bool)>,
    /// Open nested parameter lists
    nesting: usize,
    warnings: Vec<ResyncWarning>,
}

impl<'a, 'p> Grammar<'a, 'p> {
    fn new(
        text: &'a str,
        registry: &'a SchemaRegistry,
        options: &'p ParseOptions,
        mode: LexMode,
        defined: &'p mut FxHashMap<u64, usize>,
    ) -> Self {
        Self {
            lexer: Lexer::new(text, registry, options).with_mode(mode),
            peeked: None,
            options,
            defined,
            pending: None,
            nesting: 0,
            warnings: Vec::new(),
        }
    }

    fn next(&mut self) -> Result<Option<Token<'a>>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn peek_kind(&mut self) -> Result<Option<&TokenKind<'a>>> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref().map(|token| &token.kind))
    }

    fn line(&self) -> usize {
        self.peeked
            .as_ref()
            .map(|token| token.line)
            .unwrap_or_else(|| self.lexer.line())
    }

    /// Put `token` back and describe the mismatch
    fn reject(&mut self, expected: &str, token: Option<Token<'a>>) -> Fault {
        let (line, found) = match &token {
            Some(token) => (token.line, token.kind.to_string()),
            None => (self.lexer.line(), "end of input".to_string()),
        };
        self.peeked = token;
        Fault::Syntax {
            line,
            message: format!("expected {}, found {}", expected, found),
        }
    }

    fn expect(&mut self, expected: &str, accept: fn(&TokenKind<'a>) -> bool) -> Step<Token<'a>> {
        match self.next()? {
            Some(token) if accept(&token.kind) => Ok(token),
            other => Err(self.reject(expected, other)),
        }
    }

    fn expect_structural(&mut self, expected: &str, accept: fn(&TokenKind<'a>) -> bool) -> Result<Token<'a>> {
        self.expect(expected, accept).map_err(Fault::into_structural)
    }

    fn raw_between(&self, open: usize, close: usize) -> &'a str {
        &self.lexer.text()[open..close]
    }

    /// Returns `false` for input without exchange structure (when allowed)
    fn exchange_file<R: Reducer<'a>>(&mut self, reducer: &mut R) -> Result<bool> {
        match self.next()? {
            Some(Token {
                kind: TokenKind::Part21Start,
                ..
            }) => {}
            None if self.options.allow_empty => return Ok(false),
            _ => {
                return Err(Error::structural(
                    self.lexer.line(),
                    "missing 'ISO-10303-21;' marker",
                ))
            }
        }

        self.header_section(reducer)?;

        let mut sections = 0u32;
        while matches!(self.peek_kind()?, Some(TokenKind::Data)) {
            sections += 1;
            self.data_section(sections, reducer)?;
        }
        if sections == 0 {
            let found = self.next()?;
            return Err(self.reject("DATA section", found).into_structural());
        }

        self.expect_structural("'END-ISO-10303-21;'", |k| matches!(k, TokenKind::Part21End))?;
        Ok(true)
    }

    fn header_section<R: Reducer<'a>>(&mut self, reducer: &mut R) -> Result<()> {
        let start = self.expect_structural("'HEADER;'", |k| matches!(k, TokenKind::HeaderSec))?;
        reducer.begin_header(start.line)?;

        let mut count = 0usize;
        while matches!(self.peek_kind()?, Some(TokenKind::Keyword(_))) {
            let (entity, raw) = self.header_entity().map_err(Fault::into_structural)?;
            reducer.header_entity(entity, raw)?;
            count += 1;
        }

        if count < 3 {
            return Err(Error::structural(
                self.line(),
                format!(
                    "header section needs file description, file name and file schema entities, found {}",
                    count
                ),
            ));
        }

        self.expect_structural("'ENDSEC;'", |k| matches!(k, TokenKind::EndSec))?;
        Ok(())
    }

    fn header_entity(&mut self) -> Step<(HeaderEntity, &'a str)> {
        let (type_name, line) = match self.next()? {
            Some(Token {
                kind: TokenKind::Keyword(keyword),
                line,
                ..
            }) => (keyword.name.into_owned(), line),
            other => return Err(self.reject("header entity keyword", other)),
        };

        let open = self.expect("'('", |k| matches!(k, TokenKind::LParen))?;
        let (parameters, close) = self.parameters_until_close()?;
        self.expect("';'", |k| matches!(k, TokenKind::Semicolon))?;

        let entity = HeaderEntity {
            type_name,
            parameters,
            line,
        };
        Ok((entity, self.raw_between(open.offset, close.end)))
    }

    fn data_section<R: Reducer<'a>>(&mut self, id: u32, reducer: &mut R) -> Result<()> {
        let start = self.expect_structural("DATA", |k| matches!(k, TokenKind::Data))?;

        let parameters = if matches!(self.peek_kind()?, Some(TokenKind::LParen)) {
            let open = self.expect_structural("'('", |k| matches!(k, TokenKind::LParen))?;
            let (parameters, close) = self
                .parameters_until_close()
                .map_err(Fault::into_structural)?;
            Some((parameters, self.raw_between(open.offset, close.end)))
        } else {
            None
        };
        self.expect_structural("';' after DATA", |k| matches!(k, TokenKind::Semicolon))?;
        reducer.begin_section(id, parameters, start.line)?;

        loop {
            match self.peek_kind()? {
                Some(TokenKind::EndSec) => {
                    self.next()?;
                    return Ok(());
                }
                None
                | Some(TokenKind::Part21End)
                | Some(TokenKind::Data)
                | Some(TokenKind::HeaderSec) => {
                    let found = self.next()?;
                    return Err(self.reject("'ENDSEC;'", found).into_structural());
                }
                Some(_) => {}
            }

            let first_line = self.line();
            match self.entity_instance() {
                Ok(reduced) => reducer.entity(reduced)?,
                Err(Fault::Fatal(err)) => return Err(err),
                Err(Fault::Syntax { line, message }) => self.resync(first_line, line, message)?,
            }
        }
    }

    fn entity_instance(&mut self) -> Step<Reduced<'a>> {
        self.pending = None;

        let (id, line) = match self.next()? {
            Some(Token {
                kind: TokenKind::EntityInstanceName(id),
                line,
                ..
            }) => (id, line),
            other => return Err(self.reject("entity instance name", other)),
        };
        self.pending = Some((id, false));

        self.expect("'='", |k| matches!(k, TokenKind::Equals))?;

        // Registered before the body so that later definitions see it
        if let Some(&first_line) = self.defined.get(&id) {
            return Err(Fault::Fatal(Error::DuplicateReference {
                id,
                first_line,
                line,
            }));
        }
        self.defined.insert(id, line);
        self.pending = Some((id, true));

        let token = match self.next()? {
            Some(token) => token,
            None => return Err(self.reject("keyword or '('", None)),
        };
        let reduced = match token.kind {
            TokenKind::Keyword(keyword) => self.simple_body(id, line, keyword.name)?,
            TokenKind::LParen => self.complex_body(id, line, token.offset)?,
            TokenKind::Raw(raw) => Reduced {
                id,
                line,
                kind: EntityKind::Complex,
                type_name: None,
                raw,
                offset: token.offset,
                body: None,
            },
            TokenKind::UnclosedRaw(_) => return Err(self.reject("balanced parameter list", Some(token))),
            _ => return Err(self.reject("keyword or '('", Some(token))),
        };

        self.expect("';'", |k| matches!(k, TokenKind::Semicolon))?;
        self.pending = None;
        Ok(reduced)
    }

    fn simple_body(&mut self, id: u64, line: usize, type_name: Cow<'a, str>) -> Step<Reduced<'a>> {
        let token = match self.next()? {
            Some(token) => token,
            None => return Err(self.reject("'('", None)),
        };
        match token.kind {
            TokenKind::Raw(raw) => Ok(Reduced {
                id,
                line,
                kind: EntityKind::Simple,
                type_name: Some(type_name),
                raw,
                offset: token.offset,
                body: None,
            }),
            TokenKind::LParen => {
                let (parameters, close) = self.parameters_until_close()?;
                Ok(Reduced {
                    id,
                    line,
                    kind: EntityKind::Simple,
                    type_name: Some(type_name),
                    raw: self.raw_between(token.offset, close.end),
                    offset: token.offset,
                    body: Some(Body::Simple(parameters)),
                })
            }
            TokenKind::UnclosedRaw(_) => Err(self.reject("balanced parameter list", Some(token))),
            _ => Err(self.reject("'('", Some(token))),
        }
    }

    /// Supertype layers after the opening parenthesis at `open`
    fn complex_body(&mut self, id: u64, line: usize, open: usize) -> Step<Reduced<'a>> {
        let mut parts = Vec::new();
        loop {
            let token = match self.next()? {
                Some(token) => token,
                None => return Err(self.reject("keyword", None)),
            };
            match token.kind {
                TokenKind::Keyword(keyword) => {
                    self.expect("'('", |k| matches!(k, TokenKind::LParen))?;
                    let (parameters, _) = self.parameters_until_close()?;
                    parts.push(TypedParameter::new(keyword.name.into_owned(), parameters));
                }
                TokenKind::RParen if !parts.is_empty() => {
                    return Ok(Reduced {
                        id,
                        line,
                        kind: EntityKind::Complex,
                        type_name: None,
                        raw: self.raw_between(open, token.end),
                        offset: open,
                        body: Some(Body::Complex(parts)),
                    });
                }
                _ => return Err(self.reject("keyword or ')'", Some(token))),
            }
        }
    }

    /// Parameters after an opening parenthesis, and the closing one
    fn parameters_until_close(&mut self) -> Step<(Vec<Parameter>, Token<'a>)> {
        let mut parameters = Vec::new();

        match self.next()? {
            Some(token) if matches!(token.kind, TokenKind::RParen) => return Ok((parameters, token)),
            other => self.peeked = other,
        }

        loop {
            parameters.push(self.parameter()?);
            match self.next()? {
                Some(token) if matches!(token.kind, TokenKind::Comma) => {}
                Some(token) if matches!(token.kind, TokenKind::RParen) => {
                    return Ok((parameters, token))
                }
                other => return Err(self.reject("',' or ')'", other)),
            }
        }
    }

    fn parameter(&mut self) -> Step<Parameter> {
        let token = match self.next()? {
            Some(token) => token,
            None => return Err(self.reject("parameter", None)),
        };
        let parameter = match token.kind {
            TokenKind::Integer(value) => Parameter::Integer(value),
            TokenKind::Real(value) => Parameter::Real(value),
            TokenKind::String(value) => Parameter::String(value.into_owned()),
            TokenKind::Binary(value) => Parameter::Binary(value),
            TokenKind::Enumeration(value) => Parameter::Enumeration(value.into_owned()),
            TokenKind::EntityInstanceName(id) => Parameter::EntityRef(id),
            TokenKind::Dollar => Parameter::Omitted,
            TokenKind::Asterisk => Parameter::Inherited,
            TokenKind::LParen => Parameter::List(self.nested(token.line)?.0),
            TokenKind::Keyword(keyword) => {
                self.expect("'('", |k| matches!(k, TokenKind::LParen))?;
                let (parameters, _) = self.nested(token.line)?;
                Parameter::Typed(TypedParameter::new(keyword.name.into_owned(), parameters))
            }
            _ => return Err(self.reject("parameter", Some(token))),
        };
        Ok(parameter)
    }

    /// [`parameters_until_close`](Self::parameters_until_close) one level deeper
    fn nested(&mut self, line: usize) -> Step<(Vec<Parameter>, Token<'a>)> {
        if self.nesting >= MAX_PARAMETER_NESTING {
            return Err(Fault::Syntax {
                line,
                message: format!(
                    "parameter nesting deeper than {} levels",
                    MAX_PARAMETER_NESTING
                ),
            });
        }
        self.nesting += 1;
        let result = self.parameters_until_close();
        self.nesting -= 1;
        result
    }

    /// Skip the rest of a malformed instance, through its `;`
    fn resync(&mut self, first_line: usize, line: usize, message: String) -> Result<()> {
        let id = match self.pending.take() {
            Some((id, registered)) => {
                // A skipped instance does not define its name
                if registered {
                    self.defined.remove(&id);
                }
                Some(id)
            }
            None => None,
        };

        if !self.options.resync {
            return Err(Error::Entity { id, line, message });
        }

        let mut last_line = line.max(first_line);
        loop {
            match self.peek_kind()? {
                None
                | Some(TokenKind::EndSec)
                | Some(TokenKind::Part21End)
                | Some(TokenKind::Data)
                | Some(TokenKind::HeaderSec) => break,
                Some(_) => {}
            }
            if let Some(token) = self.next()? {
                last_line = token.line;
                if matches!(token.kind, TokenKind::Semicolon) {
                    break;
                }
            }
        }

        tracing::warn!(
            id = ?id,
            first_line,
            last_line,
            message = %message,
            "Skipped malformed entity instance"
        );
        self.warnings.push(ResyncWarning {
            id,
            first_line,
            last_line,
            message,
        });

        match self.options.max_resync_warnings {
            Some(limit) if self.warnings.len() > limit => Err(Error::TooManyErrors {
                count: self.warnings.len(),
                line: last_line,
            }),
            _ => Ok(()),
        }
    }
}
