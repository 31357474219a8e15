// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel indexing pipeline
//!
//! 1. Parse once, single-threaded, staging row metadata and raw-text spans
//! 2. Extract cross-references for all instances on the rayon pool
//! 3. Replay rows and xrefs in source order through one writer, then commit
//!
//! The target sink only sees writes once the whole file was accepted, so a
//! parse failure leaves it untouched.

use rayon::prelude::*;
use std::time::Instant;
use step21_core::{
    extract_xrefs, DataEntityRow, EntityKind, Error, HeaderEntityRow, IndexReport, IndexSink,
    ParseOptions, Parser, Result, SectionKind, SectionRow, SinkError, XRef,
};

struct StagedSection {
    id: u32,
    kind: SectionKind,
    raw_parameters: Option<String>,
    line: usize,
}

struct StagedHeader {
    section_id: u32,
    type_name: String,
    raw: String,
    line: usize,
}

/// Data entity with its parameter text kept as a span of the input
struct StagedEntity {
    section_id: u32,
    id: u64,
    type_name: Option<String>,
    offset: usize,
    len: usize,
    line: usize,
    kind: EntityKind,
}

enum Staged {
    Section(StagedSection),
    Header(StagedHeader),
    /// Position in `Staging::entities`
    Entity(usize),
}

#[derive(Default)]
struct Staging {
    events: Vec<Staged>,
    entities: Vec<StagedEntity>,
}

impl IndexSink for Staging {
    fn insert_section(&mut self, row: SectionRow<'_>) -> std::result::Result<(), SinkError> {
        self.events.push(Staged::Section(StagedSection {
            id: row.id,
            kind: row.kind,
            raw_parameters: row.raw_parameters.map(str::to_string),
            line: row.line,
        }));
        Ok(())
    }

    fn insert_header_entity(&mut self, row: HeaderEntityRow<'_>) -> std::result::Result<(), SinkError> {
        self.events.push(Staged::Header(StagedHeader {
            section_id: row.section_id,
            type_name: row.type_name.to_string(),
            raw: row.raw.to_string(),
            line: row.line,
        }));
        Ok(())
    }

    fn insert_data_entity(&mut self, row: DataEntityRow<'_>) -> std::result::Result<(), SinkError> {
        self.events.push(Staged::Entity(self.entities.len()));
        self.entities.push(StagedEntity {
            section_id: row.section_id,
            id: row.id,
            type_name: row.type_name.map(str::to_string),
            offset: row.offset,
            len: row.raw.len(),
            line: row.line,
            kind: row.kind,
        });
        Ok(())
    }

    fn insert_xref(&mut self, _xref: XRef) -> std::result::Result<(), SinkError> {
        Ok(())
    }

    fn commit(&mut self) -> std::result::Result<(), SinkError> {
        Ok(())
    }
}

/// Index `text` into `sink`, extracting cross-references in parallel
///
/// Produces the same rows, in the same order, as
/// [`Parser::parse_into`] with `extract_xrefs` enabled.
pub fn index_parallel<S: IndexSink + ?Sized>(
    text: &str,
    sink: &mut S,
    options: &ParseOptions,
) -> Result<IndexReport> {
    let started = Instant::now();
    tracing::info!(content_size = text.len(), "Starting parallel indexing");

    let mut staging = Staging::default();
    let mut report = Parser::new(options.clone().with_extract_xrefs(false)).parse_into(text, &mut staging)?;
    let parse_time = started.elapsed();
    tracing::info!(
        entities = staging.entities.len(),
        parse_time_ms = parse_time.as_millis() as u64,
        "Parse phase complete, extracting cross-references"
    );

    let xrefs: Vec<Vec<XRef>> = staging
        .entities
        .par_iter()
        .map(|entity| {
            let raw = &text[entity.offset..entity.offset + entity.len];
            extract_xrefs(entity.id, raw, entity.kind)
        })
        .collect();
    report.xrefs = xrefs.iter().map(Vec::len).sum();
    tracing::debug!(count = report.xrefs, "Extracted cross-references");

    for event in &staging.events {
        match event {
            Staged::Section(section) => sink
                .insert_section(SectionRow {
                    id: section.id,
                    kind: section.kind,
                    raw_parameters: section.raw_parameters.as_deref(),
                    line: section.line,
                })
                .map_err(|source| Error::Sink {
                    line: section.line,
                    source,
                })?,
            Staged::Header(header) => sink
                .insert_header_entity(HeaderEntityRow {
                    section_id: header.section_id,
                    type_name: &header.type_name,
                    raw: &header.raw,
                    line: header.line,
                })
                .map_err(|source| Error::Sink {
                    line: header.line,
                    source,
                })?,
            Staged::Entity(position) => {
                let entity = &staging.entities[*position];
                let line = entity.line;
                sink.insert_data_entity(DataEntityRow {
                    section_id: entity.section_id,
                    id: entity.id,
                    type_name: entity.type_name.as_deref(),
                    raw: &text[entity.offset..entity.offset + entity.len],
                    offset: entity.offset,
                    line,
                    kind: entity.kind,
                })
                .map_err(|source| Error::Sink { line, source })?;

                for xref in &xrefs[*position] {
                    sink.insert_xref(*xref)
                        .map_err(|source| Error::Sink { line, source })?;
                }
            }
        }
    }

    let line = staging.entities.last().map(|e| e.line).unwrap_or(1);
    sink.commit().map_err(|source| Error::Sink { line, source })?;

    tracing::info!(
        sections = report.sections,
        entities = report.entities,
        xrefs = report.xrefs,
        warnings = report.warnings.len(),
        total_time_ms = started.elapsed().as_millis() as u64,
        "Parallel indexing complete"
    );

    Ok(report)
}
