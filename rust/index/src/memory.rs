// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory relational index
//!
//! Four append-only tables (sections, header entities, data entities,
//! xrefs) plus lookup maps by ref id, xref source and xref target. The ref id
//! of a data entity is a uniqueness constraint. Writes after the commit
//! marker are rejected.

use rustc_hash::FxHashMap;
use step21_core::{
    DataEntityRow, EntityKind, HeaderEntityRow, IndexSink, SectionKind, SectionRow, SinkError,
    XRef,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    pub id: u32,
    pub kind: SectionKind,
    pub raw_parameters: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntityRecord {
    pub section_id: u32,
    pub type_name: String,
    pub raw: String,
    pub line: usize,
}

/// Data entity instance row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub section_id: u32,
    pub id: u64,
    /// `None` for complex instances
    pub type_name: Option<String>,
    /// Parameter text, parentheses included
    pub raw: String,
    pub line: usize,
    pub kind: EntityKind,
}

/// Index held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    pub(crate) sections: Vec<SectionRecord>,
    pub(crate) header_entities: Vec<HeaderEntityRecord>,
    pub(crate) entities: Vec<EntityRecord>,
    pub(crate) xrefs: Vec<XRef>,
    /// Ref id -> row in `entities`
    pub(crate) by_id: FxHashMap<u64, usize>,
    /// Xref source -> rows in `xrefs`
    pub(crate) by_source: FxHashMap<u64, Vec<usize>>,
    /// Xref target -> rows in `xrefs`
    pub(crate) by_target: FxHashMap<u64, Vec<usize>>,
    committed: bool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the parser accepted the whole file
    ///
    /// A partially populated index (failed or in-progress parse) is not
    /// committed and should be treated as invalid.
    #[inline]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn sections(&self) -> &[SectionRecord] {
        &self.sections
    }

    pub fn header_entities(&self) -> &[HeaderEntityRecord] {
        &self.header_entities
    }

    /// Data entity rows in insertion order
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn xrefs(&self) -> &[XRef] {
        &self.xrefs
    }

    pub fn entity(&self, id: u64) -> Option<&EntityRecord> {
        self.by_id.get(&id).map(|&row| &self.entities[row])
    }

    /// Number of data entity rows
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop every row and the commit marker
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    fn writable(&self) -> Result<(), SinkError> {
        if self.committed {
            Err(SinkError::Committed)
        } else {
            Ok(())
        }
    }
}

impl IndexSink for MemoryIndex {
    fn insert_section(&mut self, row: SectionRow<'_>) -> Result<(), SinkError> {
        self.writable()?;
        self.sections.push(SectionRecord {
            id: row.id,
            kind: row.kind,
            raw_parameters: row.raw_parameters.map(str::to_string),
            line: row.line,
        });
        Ok(())
    }

    fn insert_header_entity(&mut self, row: HeaderEntityRow<'_>) -> Result<(), SinkError> {
        self.writable()?;
        self.header_entities.push(HeaderEntityRecord {
            section_id: row.section_id,
            type_name: row.type_name.to_string(),
            raw: row.raw.to_string(),
            line: row.line,
        });
        Ok(())
    }

    fn insert_data_entity(&mut self, row: DataEntityRow<'_>) -> Result<(), SinkError> {
        self.writable()?;
        if self.by_id.contains_key(&row.id) {
            return Err(SinkError::DuplicateEntity(row.id));
        }
        self.by_id.insert(row.id, self.entities.len());
        self.entities.push(EntityRecord {
            section_id: row.section_id,
            id: row.id,
            type_name: row.type_name.map(str::to_string),
            raw: row.raw.to_string(),
            line: row.line,
            kind: row.kind,
        });
        Ok(())
    }

    fn insert_xref(&mut self, xref: XRef) -> Result<(), SinkError> {
        self.writable()?;
        let row = self.xrefs.len();
        self.xrefs.push(xref);
        self.by_source.entry(xref.from).or_default().push(row);
        self.by_target.entry(xref.to).or_default().push(row);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        self.writable()?;
        self.committed = true;
        Ok(())
    }
}
