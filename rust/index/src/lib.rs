// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # step21 Index
//!
//! Relational-style cross-reference index for ISO-10303-21 exchange files,
//! populated by the index mode of [`step21_core`].
//!
//! - [`MemoryIndex`]: section, header entity, data entity and xref tables
//!   with lookup maps by ref id, xref source and xref target
//! - Reverse lookups: [`MemoryIndex::referencing`],
//!   [`MemoryIndex::co_referencing`], [`MemoryIndex::dangling_targets`]
//! - [`index_parallel`]: cross-reference extraction on the rayon pool with a
//!   single serialized writer
//!
//! ```rust,ignore
//! use step21_index::{build_index, ParseOptions};
//!
//! let (index, report) = build_index(content, &ParseOptions::default())?;
//! // Instances that hold #12 and #14 in the same parameter slot
//! let owners = index.co_referencing(&[12, 14], 2);
//! ```

pub mod memory;
pub mod parallel;
pub mod query;

pub use memory::{EntityRecord, HeaderEntityRecord, MemoryIndex, SectionRecord};
pub use parallel::index_parallel;
pub use step21_core::{IndexReport, ParseOptions};

/// Parse `text` into a fresh, committed [`MemoryIndex`]
pub fn build_index(
    text: &str,
    options: &ParseOptions,
) -> step21_core::Result<(MemoryIndex, IndexReport)> {
    let mut index = MemoryIndex::new();
    let report = index_parallel(text, &mut index, options)?;
    Ok((index, report))
}
