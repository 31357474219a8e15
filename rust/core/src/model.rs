// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory exchange file model
//!
//! Built by tree mode. Everything is append-only during the parse and
//! immutable afterwards; sections and entity instances keep source order.

use crate::binary::Binary;
use crate::xref::{group_references, XRef};
use rustc_hash::{FxHashMap, FxHashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameter value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parameter {
    Integer(i64),
    Real(f64),
    String(String),
    Binary(Binary),
    /// Enumeration name without the dots
    Enumeration(String),
    /// Entity instance reference `#n`
    EntityRef(u64),
    /// `$`
    Omitted,
    /// `*`
    Inherited,
    List(Vec<Parameter>),
    Typed(TypedParameter),
}

impl Parameter {
    /// Get as entity reference
    #[inline]
    pub fn as_entity_ref(&self) -> Option<u64> {
        match self {
            Parameter::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Get as string
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Parameter::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as enumeration name
    #[inline]
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Parameter::Enumeration(s) => Some(s),
            _ => None,
        }
    }

    /// Get as float (integers widen)
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Parameter::Real(f) => Some(*f),
            Parameter::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Parameter::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&[Parameter]> {
        match self {
            Parameter::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_typed(&self) -> Option<&TypedParameter> {
        match self {
            Parameter::Typed(typed) => Some(typed),
            _ => None,
        }
    }

    /// Check if omitted/inherited
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Parameter::Omitted | Parameter::Inherited)
    }

    /// Append every entity reference, depth first
    pub fn collect_references(&self, out: &mut Vec<u64>) {
        match self {
            Parameter::EntityRef(id) => out.push(*id),
            Parameter::List(items) => items.iter().for_each(|p| p.collect_references(out)),
            Parameter::Typed(typed) => typed
                .parameters
                .iter()
                .for_each(|p| p.collect_references(out)),
            _ => {}
        }
    }
}

/// Type-name-tagged parameter list
///
/// Used for explicitly typed select values and for the supertype layers of
/// a complex entity instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypedParameter {
    pub type_name: String,
    pub parameters: Vec<Parameter>,
}

impl TypedParameter {
    pub fn new(type_name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters,
        }
    }
}

/// Header section entity, also used for extra header entities
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderEntity {
    pub type_name: String,
    pub parameters: Vec<Parameter>,
    pub line: usize,
}

/// Header section
///
/// The three mandatory entities are taken by position, not by keyword.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    pub file_description: HeaderEntity,
    pub file_name: HeaderEntity,
    pub file_schema: HeaderEntity,
    pub extra: Vec<HeaderEntity>,
}

impl Header {
    /// Schema identifiers listed by the file schema entity
    pub fn schema_identifiers(&self) -> Vec<&str> {
        match self.file_schema.parameters.first() {
            Some(Parameter::List(items)) => items.iter().filter_map(Parameter::as_string).collect(),
            Some(Parameter::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    /// Mandatory entities followed by the extra ones
    pub fn entities(&self) -> impl Iterator<Item = &HeaderEntity> {
        [&self.file_description, &self.file_name, &self.file_schema]
            .into_iter()
            .chain(self.extra.iter())
    }
}

/// Entity instance with one type name
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimpleEntity {
    pub id: u64,
    pub type_name: String,
    pub parameters: Vec<Parameter>,
    pub line: usize,
}

/// Entity instance made of one typed parameter group per supertype layer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComplexEntity {
    pub id: u64,
    pub parts: Vec<TypedParameter>,
    pub line: usize,
}

/// Simple or complex entity instance
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityInstance {
    Simple(SimpleEntity),
    Complex(ComplexEntity),
}

/// Entity instance shape, also stored per index row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntityKind {
    Simple,
    Complex,
}

impl EntityInstance {
    #[inline]
    pub fn id(&self) -> u64 {
        match self {
            EntityInstance::Simple(e) => e.id,
            EntityInstance::Complex(e) => e.id,
        }
    }

    #[inline]
    pub fn line(&self) -> usize {
        match self {
            EntityInstance::Simple(e) => e.line,
            EntityInstance::Complex(e) => e.line,
        }
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityInstance::Simple(_) => EntityKind::Simple,
            EntityInstance::Complex(_) => EntityKind::Complex,
        }
    }

    /// Type name of a simple instance, `None` for complex ones
    pub fn type_name(&self) -> Option<&str> {
        match self {
            EntityInstance::Simple(e) => Some(&e.type_name),
            EntityInstance::Complex(_) => None,
        }
    }

    /// Check whether the instance is (or has a layer) of `type_name`
    pub fn is_a(&self, type_name: &str) -> bool {
        match self {
            EntityInstance::Simple(e) => e.type_name.eq_ignore_ascii_case(type_name),
            EntityInstance::Complex(e) => e
                .parts
                .iter()
                .any(|p| p.type_name.eq_ignore_ascii_case(type_name)),
        }
    }

    /// Parameter list of a simple instance
    pub fn parameters(&self) -> Option<&[Parameter]> {
        match self {
            EntityInstance::Simple(e) => Some(&e.parameters),
            EntityInstance::Complex(_) => None,
        }
    }

    /// Get parameter by index (simple instances only)
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.parameters()?.get(index)
    }

    /// Every referenced instance name in source order (duplicates kept)
    pub fn references(&self) -> Vec<u64> {
        let mut out = Vec::new();
        match self {
            EntityInstance::Simple(e) => e.parameters.iter().for_each(|p| p.collect_references(&mut out)),
            EntityInstance::Complex(e) => e
                .parts
                .iter()
                .flat_map(|part| part.parameters.iter())
                .for_each(|p| p.collect_references(&mut out)),
        }
        out
    }

    /// Cross-reference records grouped by top-level slot
    ///
    /// A simple instance has one slot; a complex instance has one slot per
    /// layer. Matches what the raw-text extractor yields for the same text.
    pub fn xrefs(&self) -> Vec<XRef> {
        let id = self.id();
        match self {
            EntityInstance::Simple(e) => {
                let mut refs = Vec::new();
                e.parameters.iter().for_each(|p| p.collect_references(&mut refs));
                group_references(id, [refs])
            }
            EntityInstance::Complex(e) => group_references(
                id,
                e.parts.iter().map(|part| {
                    let mut refs = Vec::new();
                    part.parameters.iter().for_each(|p| p.collect_references(&mut refs));
                    refs
                }),
            ),
        }
    }
}

/// DATA section
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Section {
    /// Parameters written after `DATA`, if any
    pub parameters: Option<Vec<Parameter>>,
    pub entities: Vec<EntityInstance>,
    pub line: usize,
}

/// Parsed exchange file
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    pub header: Header,
    pub sections: Vec<Section>,
}

impl Model {
    /// True for the result of an input without exchange structure
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.header == Header::default()
    }

    /// Number of entity instances across all sections
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.entities.len()).sum()
    }

    /// All entity instances in source order
    pub fn entities(&self) -> impl Iterator<Item = &EntityInstance> {
        self.sections.iter().flat_map(|s| s.entities.iter())
    }

    /// Find an instance by name (linear scan)
    pub fn entity(&self, id: u64) -> Option<&EntityInstance> {
        self.entities().find(|e| e.id() == id)
    }

    /// Instance lookup table for repeated access
    pub fn entity_map(&self) -> FxHashMap<u64, &EntityInstance> {
        self.entities().map(|e| (e.id(), e)).collect()
    }

    /// Referenced instance names with no definition, ascending
    pub fn dangling_references(&self) -> Vec<u64> {
        let defined: FxHashSet<u64> = self.entities().map(EntityInstance::id).collect();
        let mut dangling: Vec<u64> = self
            .entities()
            .flat_map(|e| e.references())
            .filter(|id| !defined.contains(id))
            .collect::<FxHashSet<u64>>()
            .into_iter()
            .collect();
        dangling.sort_unstable();
        dangling
    }
}
