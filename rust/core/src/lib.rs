// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # step21 Core Parser
//!
//! Parser for ISO-10303-21 exchange files (STEP Part-21) built with
//! [nom](https://docs.rs/nom) recognizers and [memchr](https://docs.rs/memchr)
//! scanning.
//!
//! ## Overview
//!
//! - **Lexer**: state-dependent tokenization of the preamble, header and
//!   DATA sections, with an optional raw-capture mode for entity parameters
//! - **Parser**: one grammar, two outputs: an in-memory [`Model`] or a stream
//!   of rows into an [`IndexSink`]
//! - **Cross-references**: `(source, target, group)` records per entity
//!   instance, for reverse lookups
//! - **Schemas**: registrable per-schema keyword tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use step21_core::{parse, ParseOptions};
//!
//! let parsed = parse(content, &ParseOptions::default())?;
//! for entity in parsed.model.entities() {
//!     println!("#{} {:?}", entity.id(), entity.type_name());
//! }
//! for warning in &parsed.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```
//!
//! ## Index Mode
//!
//! Large files are indexed without building parameter trees:
//!
//! ```rust,ignore
//! use step21_core::{parse_into, ParseOptions};
//!
//! let report = parse_into(content, &mut sink, &ParseOptions::from_env())?;
//! println!("{} entities, {} xrefs", report.entities, report.xrefs);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for the model types

pub mod binary;
pub mod error;
pub mod lexer;
pub mod model;
pub mod options;
pub mod parser;
pub mod schema;
pub mod sink;
pub mod xref;

pub use binary::Binary;
pub use error::{Error, ResyncWarning, Result, SchemaError, SinkError};
pub use lexer::{Keyword, KeywordClass, LexState, Lexer, Token, TokenKind};
pub use model::{
    ComplexEntity, EntityInstance, EntityKind, Header, HeaderEntity, Model, Parameter, Section,
    SimpleEntity, TypedParameter,
};
pub use options::{LexMode, ParseOptions, DEFAULT_HEADER_SCAN_LIMIT};
pub use parser::{Parsed, Parser, MAX_PARAMETER_NESTING};
pub use schema::{KeywordSet, SchemaRegistry};
pub use sink::{
    DataEntityRow, HeaderEntityRow, IndexReport, IndexSink, SectionKind, SectionRow,
    HEADER_SECTION_ID,
};
pub use xref::{extract_xrefs, group_references, XRef};

/// Parse an exchange file into an in-memory model
pub fn parse(text: &str, options: &ParseOptions) -> Result<Parsed> {
    Parser::new(options.clone()).parse(text)
}

/// Parse an exchange file straight into an index sink
pub fn parse_into<S: IndexSink + ?Sized>(
    text: &str,
    sink: &mut S,
    options: &ParseOptions,
) -> Result<IndexReport> {
    Parser::new(options.clone()).parse_into(text, sink)
}
