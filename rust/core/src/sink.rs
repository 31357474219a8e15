// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index-mode output
//!
//! In index mode the parser never materializes parameter trees. Each reduced
//! section and entity instance is handed to an [`IndexSink`] as a row that
//! borrows its raw parameter text from the input. The sink owns storage and
//! transaction semantics; the parser calls [`IndexSink::commit`] once, after
//! the whole file was accepted.

use crate::error::{ResyncWarning, SinkError};
use crate::model::EntityKind;
use crate::xref::XRef;

/// Section id of the header section; DATA sections count up from 1
pub const HEADER_SECTION_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Data,
}

/// Section metadata row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRow<'a> {
    pub id: u32,
    pub kind: SectionKind,
    /// Parameter text written after `DATA`, parentheses included
    pub raw_parameters: Option<&'a str>,
    pub line: usize,
}

/// Header entity row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEntityRow<'a> {
    pub section_id: u32,
    pub type_name: &'a str,
    pub raw: &'a str,
    pub line: usize,
}

/// Data entity instance row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEntityRow<'a> {
    pub section_id: u32,
    pub id: u64,
    /// `None` for complex instances
    pub type_name: Option<&'a str>,
    /// Parameter text, parentheses included
    pub raw: &'a str,
    /// Byte offset of `raw` in the input
    pub offset: usize,
    pub line: usize,
    pub kind: EntityKind,
}

/// Storage collaborator for index mode
///
/// Implementations must reject a second data entity row with the same id.
pub trait IndexSink {
    fn insert_section(&mut self, row: SectionRow<'_>) -> Result<(), SinkError>;

    fn insert_header_entity(&mut self, row: HeaderEntityRow<'_>) -> Result<(), SinkError>;

    fn insert_data_entity(&mut self, row: DataEntityRow<'_>) -> Result<(), SinkError>;

    fn insert_xref(&mut self, xref: XRef) -> Result<(), SinkError>;

    /// Write the final commit marker
    fn commit(&mut self) -> Result<(), SinkError>;
}

impl<S: IndexSink + ?Sized> IndexSink for &mut S {
    #[inline]
    fn insert_section(&mut self, row: SectionRow<'_>) -> Result<(), SinkError> {
        (**self).insert_section(row)
    }

    #[inline]
    fn insert_header_entity(&mut self, row: HeaderEntityRow<'_>) -> Result<(), SinkError> {
        (**self).insert_header_entity(row)
    }

    #[inline]
    fn insert_data_entity(&mut self, row: DataEntityRow<'_>) -> Result<(), SinkError> {
        (**self).insert_data_entity(row)
    }

    #[inline]
    fn insert_xref(&mut self, xref: XRef) -> Result<(), SinkError> {
        (**self).insert_xref(xref)
    }

    #[inline]
    fn commit(&mut self) -> Result<(), SinkError> {
        (**self).commit()
    }
}

/// Summary of one index-mode parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Header section plus DATA sections
    pub sections: usize,
    pub header_entities: usize,
    pub entities: usize,
    pub xrefs: usize,
    pub warnings: Vec<ResyncWarning>,
}
