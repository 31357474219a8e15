// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-reference extraction
//!
//! Works on the raw parameter text of one entity instance, as captured by the
//! lexer: `(…)` for a simple instance, `(A(…)B(…))` for a complex one. Every
//! `#n` outside string, binary and comment literals is assigned to the
//! top-level slot it occurs in. A simple instance has exactly one slot (its
//! parameter list); each layer of a complex instance is its own slot. Deeper
//! nesting contributes to the enclosing slot.

use crate::lexer::string_end;
use crate::model::EntityKind;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `from` mentions `to` inside its top-level slot `group` (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XRef {
    pub from: u64,
    pub to: u64,
    pub group: u32,
}

type SlotSet = SmallVec<[u64; 8]>;

/// Extract cross-references from the raw parameter text of `source`
pub fn extract_xrefs(source: u64, raw: &str, kind: EntityKind) -> Vec<XRef> {
    let slot_depth = match kind {
        EntityKind::Simple => 1,
        EntityKind::Complex => 2,
    };

    let bytes = raw.as_bytes();
    let len = bytes.len();
    let mut slots: SmallVec<[SlotSet; 4]> = SmallVec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'(' => {
                depth += 1;
                if depth == slot_depth {
                    slots.push(SlotSet::new());
                }
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b'\'' => i = string_end(bytes, i + 1).unwrap_or(len),
            b'"' => {
                i = match memchr::memchr(b'"', &bytes[i + 1..]) {
                    Some(offset) => i + 1 + offset + 1,
                    None => len,
                };
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match memchr::memmem::find(&bytes[i + 2..], b"*/") {
                    Some(offset) => i + 2 + offset + 2,
                    None => len,
                };
            }
            b'#' => {
                i += 1;
                let start = i;
                while i < len && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                // Names beyond u64 are never references; the lexer rejects them
                if let Ok(id) = lexical_core::parse::<u64>(&bytes[start..i]) {
                    if slots.is_empty() {
                        slots.push(SlotSet::new());
                    }
                    if let Some(slot) = slots.last_mut() {
                        if !slot.contains(&id) {
                            slot.push(id);
                        }
                    }
                }
            }
            _ => i += 1,
        }
    }

    flatten(source, slots)
}

/// Records for per-slot reference lists, in slot order, de-duplicated per slot
pub fn group_references<I, S>(source: u64, slots: I) -> Vec<XRef>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u64]>,
{
    let slots: SmallVec<[SlotSet; 4]> = slots
        .into_iter()
        .map(|refs| {
            let mut set = SlotSet::new();
            for &id in refs.as_ref() {
                if !set.contains(&id) {
                    set.push(id);
                }
            }
            set
        })
        .collect();
    flatten(source, slots)
}

fn flatten(source: u64, slots: SmallVec<[SlotSet; 4]>) -> Vec<XRef> {
    let mut out = Vec::with_capacity(slots.iter().map(|s| s.len()).sum());
    for (index, slot) in slots.iter().enumerate() {
        let group = index as u32 + 1;
        out.extend(slot.iter().map(|&to| XRef {
            from: source,
            to,
            group,
        }));
    }
    out
}
