// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reverse-lookup queries over a [`MemoryIndex`]
//!
//! All queries return ids in ascending order.

use crate::memory::{EntityRecord, MemoryIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use step21_core::XRef;

impl MemoryIndex {
    /// Instances whose parameters mention `target`
    pub fn referencing(&self, target: u64) -> Vec<u64> {
        let mut sources: Vec<u64> = self
            .rows_to(target)
            .map(|xref| xref.from)
            .collect::<FxHashSet<u64>>()
            .into_iter()
            .collect();
        sources.sort_unstable();
        sources
    }

    /// Cross-references recorded for `source`, in slot order
    pub fn references_of(&self, source: u64) -> Vec<XRef> {
        self.by_source
            .get(&source)
            .map(|rows| rows.iter().map(|&row| self.xrefs[row]).collect())
            .unwrap_or_default()
    }

    /// Ids `source` mentions within slot `group`
    pub fn group_members(&self, source: u64, group: u32) -> Vec<u64> {
        let mut members: Vec<u64> = self
            .references_of(source)
            .into_iter()
            .filter(|xref| xref.group == group)
            .map(|xref| xref.to)
            .collect();
        members.sort_unstable();
        members.dedup();
        members
    }

    /// Instances that mention at least `min_matches` of `ids` within one slot
    ///
    /// A `min_matches` of zero behaves like one: a source has to mention at
    /// least one of the ids to be found at all.
    pub fn co_referencing(&self, ids: &[u64], min_matches: usize) -> Vec<u64> {
        let min_matches = min_matches.max(1);
        let wanted: FxHashSet<u64> = ids.iter().copied().collect();
        if wanted.len() < min_matches {
            return Vec::new();
        }

        let matched: FxHashSet<(u64, u32, u64)> = wanted
            .iter()
            .flat_map(|&id| self.rows_to(id))
            .map(|xref| (xref.from, xref.group, xref.to))
            .collect();

        let mut per_slot: FxHashMap<(u64, u32), usize> = FxHashMap::default();
        for (from, group, _) in matched {
            *per_slot.entry((from, group)).or_insert(0) += 1;
        }

        let mut sources: Vec<u64> = per_slot
            .into_iter()
            .filter(|&(_, count)| count >= min_matches)
            .map(|((from, _), _)| from)
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }

    /// Referenced ids with no data entity row
    pub fn dangling_targets(&self) -> Vec<u64> {
        let mut targets: Vec<u64> = self
            .by_target
            .keys()
            .copied()
            .filter(|id| !self.by_id.contains_key(id))
            .collect();
        targets.sort_unstable();
        targets
    }

    /// Simple instances of `type_name` (case-insensitive), in insertion order
    pub fn entities_of_type<'s>(&'s self, type_name: &'s str) -> impl Iterator<Item = &'s EntityRecord> + 's {
        self.entities.iter().filter(move |e| {
            e.type_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(type_name))
        })
    }

    fn rows_to(&self, target: u64) -> impl Iterator<Item = &XRef> + '_ {
        self.by_target
            .get(&target)
            .into_iter()
            .flatten()
            .map(move |&row| &self.xrefs[row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step21_core::IndexSink;

    fn index(xrefs: &[(u64, u64, u32)]) -> MemoryIndex {
        let mut index = MemoryIndex::new();
        for &(from, to, group) in xrefs {
            index.insert_xref(XRef { from, to, group }).unwrap();
        }
        index
    }

    #[test]
    fn test_referencing() {
        let index = index(&[(3, 1, 1), (3, 1, 2), (2, 1, 1), (4, 9, 1)]);
        assert_eq!(index.referencing(1), vec![2, 3]);
        assert!(index.referencing(42).is_empty());
    }

    #[test]
    fn test_co_referencing_requires_a_shared_slot() {
        // #10 mentions 1 and 2 in one slot; #11 mentions them in different slots
        let index = index(&[
            (10, 1, 1),
            (10, 2, 1),
            (10, 3, 2),
            (11, 1, 1),
            (11, 2, 2),
            (12, 2, 1),
        ]);
        assert_eq!(index.co_referencing(&[1, 2], 2), vec![10]);
        assert_eq!(index.co_referencing(&[1, 2], 1), vec![10, 11, 12]);
        assert_eq!(index.co_referencing(&[1, 2, 3], 3), Vec::<u64>::new());
        assert_eq!(index.co_referencing(&[2, 2], 2), Vec::<u64>::new());
        assert_eq!(index.co_referencing(&[3], 0), vec![10]);
    }

    #[test]
    fn test_group_members() {
        let index = index(&[(10, 5, 2), (10, 4, 2), (10, 1, 1)]);
        assert_eq!(index.group_members(10, 2), vec![4, 5]);
        assert_eq!(
            index.references_of(10),
            vec![
                XRef { from: 10, to: 5, group: 2 },
                XRef { from: 10, to: 4, group: 2 },
                XRef { from: 10, to: 1, group: 1 },
            ]
        );
    }

    #[test]
    fn test_dangling_targets() {
        let index = index(&[(1, 7, 1), (1, 3, 1)]);
        assert_eq!(index.dangling_targets(), vec![3, 7]);
    }
}
