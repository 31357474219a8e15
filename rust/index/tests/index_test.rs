// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end indexing of exchange files into a MemoryIndex.

use step21_core::{parse_into, EntityKind, Error, LexMode, ParseOptions, SectionKind, XRef};
use step21_index::{build_index, index_parallel, MemoryIndex};

const FILE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('bracket'),'2;1');
FILE_NAME('bracket.stp','2024-01-01T00:00:00',('a'),('o'),'p','s','');
FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));
ENDSEC;
DATA;
#1=CARTESIAN_POINT('',(0.,0.,0.));
#2=DIRECTION('',(0.,0.,1.));
#3=DIRECTION('',(1.,0.,0.));
#4=AXIS2_PLACEMENT_3D('',#1,#2,#3);
#5=AXIS2_PLACEMENT_3D('',#1,#2,$);
#6=PLANE('',#4);
#7=(GEOMETRIC_REPRESENTATION_CONTEXT(3)GLOBAL_UNIT_ASSIGNED_CONTEXT((#8,#9))REPRESENTATION_CONTEXT('',''));
#8=(LENGTH_UNIT()NAMED_UNIT(*)SI_UNIT(.MILLI.,.METRE.));
#9=(NAMED_UNIT(*)PLANE_ANGLE_UNIT()SI_UNIT($,.RADIAN.));
#10=SHAPE_REPRESENTATION('',(#4,#6),#7);
ENDSEC;
END-ISO-10303-21;
";

fn sequential(text: &str, options: &ParseOptions) -> MemoryIndex {
    let mut index = MemoryIndex::new();
    parse_into(text, &mut index, options).unwrap();
    index
}

#[test]
fn test_tables() {
    let (index, report) = build_index(FILE, &ParseOptions::default()).unwrap();
    assert!(index.is_committed());
    assert!(report.warnings.is_empty());

    assert_eq!(index.sections().len(), 2);
    assert_eq!(index.sections()[0].kind, SectionKind::Header);
    assert_eq!(index.sections()[1].kind, SectionKind::Data);
    assert_eq!(index.header_entities().len(), 3);
    assert_eq!(index.header_entities()[2].raw, "(('AUTOMOTIVE_DESIGN'))");
    assert_eq!(index.len(), 10);

    let context = index.entity(7).unwrap();
    assert_eq!(context.kind, EntityKind::Complex);
    assert_eq!(context.type_name, None);
    assert_eq!(context.line, 14);

    let placement = index.entity(4).unwrap();
    assert_eq!(placement.type_name.as_deref(), Some("AXIS2_PLACEMENT_3D"));
    assert_eq!(placement.raw, "('',#1,#2,#3)");
    assert_eq!(index.entities_of_type("axis2_placement_3d").count(), 2);
}

#[test]
fn test_reverse_lookups() {
    let (index, _) = build_index(FILE, &ParseOptions::default()).unwrap();

    assert_eq!(index.referencing(1), vec![4, 5]);
    assert_eq!(index.referencing(4), vec![6, 10]);
    assert_eq!(index.co_referencing(&[1, 2, 3], 3), vec![4]);
    assert_eq!(index.co_referencing(&[1, 2], 2), vec![4, 5]);
    assert_eq!(index.co_referencing(&[4, 6], 2), vec![10]);
    assert_eq!(index.group_members(7, 2), vec![8, 9]);
    assert!(index.dangling_targets().is_empty());
}

#[test]
fn test_parallel_matches_sequential() {
    for mode in [LexMode::RawCapture, LexMode::Tokens] {
        let options = ParseOptions::default().with_lex_mode(mode);
        let expected = sequential(FILE, &options);

        let mut index = MemoryIndex::new();
        let report = index_parallel(FILE, &mut index, &options).unwrap();

        assert_eq!(report.entities, 10);
        assert_eq!(report.xrefs, index.xrefs().len());
        assert_eq!(index.sections(), expected.sections());
        assert_eq!(index.header_entities(), expected.header_entities());
        assert_eq!(index.entities(), expected.entities());
        assert_eq!(index.xrefs(), expected.xrefs());
    }
}

#[test]
fn test_failed_parse_leaves_index_uncommitted() {
    let text = FILE.replace("#6=PLANE('',#4);", "#6=PLANE('',#4);\n#2=PLANE('',#4);");

    let mut index = MemoryIndex::new();
    let err = parse_into(&text, &mut index, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DuplicateReference { id: 2, first_line: 9, .. }));
    assert!(!index.is_committed());
    assert_eq!(index.len(), 6);

    // The parallel pipeline writes nothing until the parse succeeded
    let mut index = MemoryIndex::new();
    assert!(index_parallel(&text, &mut index, &ParseOptions::default()).is_err());
    assert!(!index.is_committed());
    assert!(index.is_empty());
}

#[test]
fn test_committed_index_rejects_a_second_parse() {
    let (mut index, _) = build_index(FILE, &ParseOptions::default()).unwrap();
    match parse_into(FILE, &mut index, &ParseOptions::default()) {
        Err(Error::Sink { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected sink error, got {:?}", other),
    }
}

#[test]
fn test_dangling_targets() {
    let text = FILE.replace("#6=PLANE('',#4);", "#6=PLANE('',#40);");
    let (index, _) = build_index(&text, &ParseOptions::default()).unwrap();
    assert_eq!(index.dangling_targets(), vec![40]);
    assert_eq!(
        index.references_of(6),
        vec![XRef { from: 6, to: 40, group: 1 }]
    );
}

#[test]
fn test_resync_warnings_are_reported() {
    let text = FILE.replace("#3=DIRECTION('',(1.,0.,0.));", "#3=DIRECTION;");
    let (index, report) = build_index(&text, &ParseOptions::default()).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].first_line, 10);
    assert!(index.entity(3).is_none());
    assert_eq!(index.dangling_targets(), vec![3]);
}

#[test]
fn test_unbalanced_instance_keeps_its_neighbours() {
    let text = FILE.replace("#2=DIRECTION('',(0.,0.,1.));", "#2=DIRECTION('',(0.,0.,1.);");
    let (index, report) = build_index(&text, &ParseOptions::default()).unwrap();

    assert!(index.is_committed());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].id, Some(2));
    assert_eq!(index.len(), 9);
    assert!(index.entity(1).is_some());
    assert!(index.entity(2).is_none());
    assert!(index.entity(3).is_some());
    assert_eq!(index.dangling_targets(), vec![2]);
}
