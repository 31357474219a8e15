// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree-mode parsing of complete exchange files.

use step21_core::{
    extract_xrefs, parse, Binary, EntityInstance, EntityKind, Error, LexMode, ParseOptions,
    Parameter, Parser, TypedParameter, XRef,
};

const MINIMAL: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('d'),'1');
FILE_NAME('f.step','t',('a'),('o'),'p','s','a2');
FILE_SCHEMA(('schema'));
ENDSEC;
DATA;
#1=POINT('P1',1.,2.,3.);
ENDSEC;
END-ISO-10303-21;
";

fn with_data(data: &str) -> String {
    MINIMAL.replace("#1=POINT('P1',1.,2.,3.);\n", data)
}

#[test]
fn test_minimal_file() {
    let parsed = parse(MINIMAL, &ParseOptions::default()).unwrap();
    assert!(parsed.is_clean());

    let model = parsed.model;
    assert_eq!(model.sections.len(), 1);
    assert_eq!(model.sections[0].entities.len(), 1);

    match &model.sections[0].entities[0] {
        EntityInstance::Simple(entity) => {
            assert_eq!(entity.id, 1);
            assert_eq!(entity.type_name, "POINT");
            assert_eq!(entity.line, 8);
            assert_eq!(
                entity.parameters,
                vec![
                    Parameter::String("P1".into()),
                    Parameter::Real(1.0),
                    Parameter::Real(2.0),
                    Parameter::Real(3.0),
                ]
            );
        }
        other => panic!("Expected simple entity, got {:?}", other),
    }

    assert_eq!(model.header.file_description.type_name, "FILE_DESCRIPTION");
    assert_eq!(model.header.file_name.parameters[0], Parameter::String("f.step".into()));
    assert_eq!(model.header.schema_identifiers(), vec!["schema"]);
    assert!(model.header.extra.is_empty());
}

#[test]
fn test_complex_entity() {
    let parsed = parse(&with_data("#2=(A(1)B(2));\n"), &ParseOptions::default()).unwrap();
    match parsed.model.entity(2) {
        Some(EntityInstance::Complex(entity)) => assert_eq!(
            entity.parts,
            vec![
                TypedParameter::new("A", vec![Parameter::Integer(1)]),
                TypedParameter::new("B", vec![Parameter::Integer(2)]),
            ]
        ),
        other => panic!("Expected complex entity, got {:?}", other),
    }
}

#[test]
fn test_escaped_quote() {
    let parsed = parse(&with_data("#1=LABEL('it''s');\n"), &ParseOptions::default()).unwrap();
    let value = parsed.model.entity(1).and_then(|e| e.get(0)).and_then(Parameter::as_string);
    assert_eq!(value, Some("it's"));
    assert_eq!(value.map(str::len), Some(4));
}

#[test]
fn test_control_directives_are_kept() {
    let parsed = parse(&with_data("#1=LABEL('\\X2\\00E9\\X0\\');\n"), &ParseOptions::default()).unwrap();
    assert_eq!(
        parsed.model.entity(1).and_then(|e| e.get(0)),
        Some(&Parameter::String("\\X2\\00E9\\X0\\".into()))
    );
}

#[test]
fn test_binary_parameters() {
    let parsed = parse(&with_data("#1=BITS(\"0FF\",\"23F\",\"2FF\");\n"), &ParseOptions::default()).unwrap();
    let parameters = parsed.model.entity(1).and_then(EntityInstance::parameters).unwrap();
    match &parameters[0] {
        Parameter::Binary(b) => assert_eq!(b.to_u64(), Some(0xFF)),
        other => panic!("Expected binary, got {:?}", other),
    }
    match &parameters[1] {
        Parameter::Binary(b) => {
            assert_eq!(b.bit_len(), Some(6));
            assert_eq!(b.to_u64(), Some(0x3F));
        }
        other => panic!("Expected binary, got {:?}", other),
    }
    assert_eq!(parameters[2], Parameter::Binary(Binary::Invalid("2FF".into())));
}

#[test]
fn test_duplicate_reference() {
    let err = parse(
        &with_data("#5=POINT(0.);\n#6=POINT(1.);\n#5=POINT(2.);\n"),
        &ParseOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateReference {
            id: 5,
            first_line: 8,
            line: 10,
        }
    );
}

#[test]
fn test_resync_keeps_neighbours() {
    let text = with_data("#1=POINT(0.);\n#2=POINT(1.,,\n  2.);\n#3=POINT(3.);\n");
    let parsed = parse(&text, &ParseOptions::default()).unwrap();

    let ids: Vec<u64> = parsed.model.entities().map(EntityInstance::id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(parsed.warnings.len(), 1);

    let warning = &parsed.warnings[0];
    assert_eq!(warning.id, Some(2));
    assert_eq!(warning.first_line, 9);
    assert_eq!(warning.last_line, 10);
}

#[test]
fn test_resync_disabled_fails() {
    let text = with_data("#1=POINT(0.);\n#2=POINT(1.,,2.);\n#3=POINT(3.);\n");
    match parse(&text, &ParseOptions::default().with_resync(false)) {
        Err(Error::Entity { id, line, .. }) => {
            assert_eq!(id, Some(2));
            assert_eq!(line, 9);
        }
        other => panic!("Expected entity error, got {:?}", other),
    }
}

#[test]
fn test_parse_is_idempotent() {
    let text = with_data("#1=LINE(#2,#3);\n#2=POINT(0.);\n#3=POINT(1.);\n#4=(A(#1)B());\n");
    let mut parser = Parser::new(ParseOptions::default());
    let first = parser.parse(&text).unwrap();
    let second = parser.parse(&text).unwrap();
    assert_eq!(first, second);

    // A failed parse leaves nothing behind either
    assert!(parser.parse(&with_data("#1=A();\n#1=B();\n")).is_err());
    assert_eq!(parser.parse(&text).unwrap(), first);
}

#[test]
fn test_compatibility_mode() {
    let text = "iso-10303-21;\nheader;\nfile_description((''),'1');\nfile_name('','','','','','','');\nfile_schema(('s'));\nendsec;\ndata;\n#1=point(.unspecified.);\nendsec;\nend-iso-10303-21;\n";

    // Strict mode does not see a lower-case opening marker at all
    assert!(matches!(
        parse(text, &ParseOptions::default()),
        Err(Error::Structural { .. })
    ));

    let upper_marker = text.replacen("iso-10303-21;", "ISO-10303-21;", 1);
    match parse(&upper_marker, &ParseOptions::default()) {
        Err(Error::Scan { line, message, .. }) => {
            assert_eq!(line, 2);
            assert!(message.contains("header"));
        }
        other => panic!("Expected scan error, got {:?}", other),
    }

    // Both markers fold alongside the keywords
    let options = ParseOptions::default().with_compatibility_mode(true);
    for text in [text, upper_marker.as_str()] {
        let parsed = parse(text, &options).unwrap();
        let entity = parsed.model.entity(1).unwrap();
        assert_eq!(entity.type_name(), Some("POINT"));
        assert_eq!(entity.get(0), Some(&Parameter::Enumeration("UNSPECIFIED".into())));
    }
}

#[test]
fn test_header_scan_limit() {
    let padded = format!("{}{}", "x".repeat(128), MINIMAL);

    let options = ParseOptions::default().with_header_scan_limit(64);
    match parse(&padded, &options) {
        Err(Error::Scan { preview, .. }) => assert!(preview.len() <= 40),
        other => panic!("Expected scan error, got {:?}", other),
    }

    let options = ParseOptions::default().with_header_scan_limit(1024);
    assert_eq!(parse(&padded, &options).unwrap().model.len(), 1);
}

#[test]
fn test_trailing_content_is_ignored() {
    let text = format!("{}\nSIGNATURE;\n@@@ garbage", MINIMAL);
    assert_eq!(parse(&text, &ParseOptions::default()).unwrap().model.len(), 1);
}

#[test]
fn test_multiple_sections_keep_order() {
    let text = MINIMAL.replace(
        "ENDSEC;\nEND-ISO-10303-21;",
        "ENDSEC;\nDATA;\n#7=POINT(7.);\n#8=POINT(8.);\nENDSEC;\nEND-ISO-10303-21;",
    );
    let model = parse(&text, &ParseOptions::default()).unwrap().model;
    let ids: Vec<Vec<u64>> = model
        .sections
        .iter()
        .map(|s| s.entities.iter().map(EntityInstance::id).collect())
        .collect();
    assert_eq!(ids, vec![vec![1], vec![7, 8]]);
}

#[test]
fn test_tree_and_raw_xrefs_agree() {
    let data = "#1=POINT('#7',(0.,0.));\n#2=LINE(#1,(#1,(#3)));\n#3=(BOUNDED_CURVE()CURVE(#1,#2)REPRESENTATION_ITEM(''))\n;\n#4=SET((#2,#3),/* #9 */$);\n";
    let text = with_data(data);
    let parsed = parse(&text, &ParseOptions::default()).unwrap();

    for entity in parsed.model.entities() {
        let start = text.find(&format!("#{}=", entity.id())).unwrap();
        let body = &text[start..];
        let open = body.find('(').unwrap();
        let end = body.find(";\n#").or_else(|| body.find(";\nENDSEC")).unwrap();
        let raw = body[open..end].trim_end();
        assert_eq!(
            extract_xrefs(entity.id(), raw, entity.kind()),
            entity.xrefs(),
            "mismatch for #{}",
            entity.id()
        );
    }

    let complex = parsed.model.entity(3).unwrap();
    assert_eq!(complex.kind(), EntityKind::Complex);
    assert_eq!(
        complex.xrefs(),
        vec![
            XRef { from: 3, to: 1, group: 2 },
            XRef { from: 3, to: 2, group: 2 },
        ]
    );
}

#[test]
fn test_lex_mode_does_not_change_tree_mode() {
    let text = with_data("#1=(A(1)B(#1));\n");
    let tokens = parse(&text, &ParseOptions::default().with_lex_mode(LexMode::Tokens)).unwrap();
    let raw = parse(&text, &ParseOptions::default().with_lex_mode(LexMode::RawCapture)).unwrap();
    assert_eq!(tokens, raw);
}

#[test]
fn test_dangling_references() {
    let text = with_data("#1=LINE(#2,#40);\n#2=POINT(#30);\n");
    let model = parse(&text, &ParseOptions::default()).unwrap().model;
    assert_eq!(model.dangling_references(), vec![30, 40]);
}
