#![expect(missing_docs)]

use core::fmt::Write;

use recordmodem::{
    ParseOutcome, ParserOptions, RecordParser, chunk_utils::produce_chunks,
};

mod common;

use crate::common::{STREAM, render, zips_schema};

#[test]
fn snapshot_records_from_chunked_stream() {
    let schema = zips_schema();
    let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
    let mut records = Vec::new();
    let mut trace = String::new();
    for (i, chunk) in STREAM.iter().enumerate() {
        let chunk = chunk.as_bytes();
        let mut offset = 0;
        loop {
            let progress = parser.parse(chunk, offset).unwrap();
            offset = progress.offset;
            writeln!(trace, "{i}: {:?} @{offset}", progress.outcome).unwrap();
            if progress.outcome != ParseOutcome::RecordComplete {
                break;
            }
            records.push(parser.materialize().unwrap());
            parser.reset();
        }
    }
    parser.finish().unwrap();

    insta::assert_snapshot!(trace, @r"
    0: RecordStarted @22
    1: RecordComplete @108
    1: NoRecord @108
    2: RecordComplete @55
    2: RecordStarted @60
    3: RecordComplete @92
    3: NoRecord @92
    4: NoRecord @1
    ");
    insta::assert_snapshot!(render(&schema, &records), @r#"
    id=1 city=BOSTON pop=667137 loc={-71.05,42.36} meta={"src":"census","tags":["a","b"]} state=MA
    id=2 city=Cambridge pop=NULL loc={} meta=NULL state=NULL
    id=3 city=Zürich "ZH" pop=NULL loc=NULL meta=[1,{"k":true}] state=NULL
    "#);
}

#[test]
fn every_chunking_renders_the_same() {
    let schema = zips_schema();
    let whole = STREAM.concat();
    let expected = {
        let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
        render(&schema, &parser.parse_all(whole.as_bytes()).unwrap())
    };
    for parts in 1..=whole.len() {
        let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
        let mut records = Vec::new();
        for chunk in produce_chunks(whole.as_bytes(), parts) {
            let mut offset = 0;
            loop {
                let progress = parser.parse(chunk, offset).unwrap();
                offset = progress.offset;
                if progress.outcome != ParseOutcome::RecordComplete {
                    break;
                }
                records.push(parser.materialize().unwrap());
                parser.reset();
            }
        }
        parser.finish().unwrap();
        assert_eq!(render(&schema, &records), expected, "{parts} parts");
    }
}

#[test]
fn snapshot_errors() {
    let schema = zips_schema();
    let cases: [&str; 5] = [
        r#"{"id": 1.5}"#,
        r#"{"id": 1, "loc": [1, "x"]}"#,
        r#"{"state": "TOO LONG"}"#,
        r#"[{"id": 1}]"#,
        "{\"city\": \"open",
    ];
    let mut out = String::new();
    for input in cases {
        let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
        let err = parser.parse_all(input.as_bytes()).unwrap_err();
        writeln!(out, "{err}").unwrap();
    }
    insta::assert_snapshot!(out, @r#"
    invalid input syntax for type integer: "1.5" (column id of table zips) at 1:11 (byte 10)
    invalid input syntax for type double precision: "x" (column loc of table zips) at 1:25 (byte 24)
    value too long for type character(2) (column state of table zips) at 1:20 (byte 19)
    record error: top-level value is an array, expected an object at 1:1 (byte 0)
    syntax error: unexpected end of input at 1:15 (byte 14)
    "#);
}
