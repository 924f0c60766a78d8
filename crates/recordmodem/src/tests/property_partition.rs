use std::sync::Arc;

use quickcheck::{Arbitrary, Gen, QuickCheck};
use quickcheck_macros::quickcheck;
use serde_json::{Map, Value};

use super::utils::{parse_chunks, parser};
use crate::{
    Column, ParserOptions, Record, RecordParser, ScalarType, Schema, TypedValue,
    chunk_utils::split_at_points,
};

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "rows",
        vec![
            Column::scalar("a", ScalarType::Int4),
            Column::scalar("b", ScalarType::Text),
            Column::structured("c"),
        ],
    ))
}

fn arbitrary_json(g: &mut Gen, depth: usize) -> Value {
    let kinds = if depth == 0 { 5 } else { 7 };
    match u8::arbitrary(g) % kinds {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::from(i64::arbitrary(g)),
        3 => Value::from(f64::from(i16::arbitrary(g)) / 8.0),
        4 => Value::String(String::arbitrary(g)),
        5 => Value::Array(
            (0..usize::arbitrary(g) % 4)
                .map(|_| arbitrary_json(g, depth - 1))
                .collect(),
        ),
        _ => Value::Object(
            (0..usize::arbitrary(g) % 4)
                .map(|_| (String::arbitrary(g), arbitrary_json(g, depth - 1)))
                .collect(),
        ),
    }
}

/// One source row. Absent fields are left out of the JSON object.
#[derive(Clone, Debug)]
struct Row {
    a: Option<i32>,
    b: Option<String>,
    c: Option<Value>,
    /// A field no column matches, placed before the known ones.
    extra: Option<Value>,
}

impl Arbitrary for Row {
    fn arbitrary(g: &mut Gen) -> Self {
        Row {
            a: Option::arbitrary(g),
            b: Option::arbitrary(g),
            c: bool::arbitrary(g).then(|| arbitrary_json(g, 3)),
            extra: bool::arbitrary(g).then(|| arbitrary_json(g, 2)),
        }
    }
}

impl Row {
    fn to_json(&self) -> String {
        let mut object = Map::new();
        if let Some(extra) = &self.extra {
            object.insert("extra".into(), extra.clone());
        }
        if let Some(a) = self.a {
            object.insert("a".into(), a.into());
        }
        if let Some(b) = &self.b {
            object.insert("b".into(), b.clone().into());
        }
        if let Some(c) = &self.c {
            object.insert("c".into(), c.clone());
        }
        Value::Object(object).to_string()
    }

    fn expected(&self) -> Record {
        let c = match &self.c {
            None | Some(Value::Null) => None,
            Some(value) => Some(TypedValue::Json(value.to_string())),
        };
        Record::new(vec![
            self.a.map(TypedValue::Int4),
            self.b.clone().map(TypedValue::Text),
            c,
        ])
    }
}

fn stream(rows: &[Row]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&row.to_json());
        // Mix tight concatenation with newline and space separators.
        match i % 3 {
            0 => {}
            1 => out.push('\n'),
            _ => out.push_str(" \r\n"),
        }
    }
    out
}

/// Property: however the stream is cut into chunks, the records are the ones
/// the rows describe, in order.
#[test]
fn partition_invariance_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(rows: Vec<Row>, splits: Vec<usize>) -> bool {
        let src = stream(&rows);
        let chunks = split_at_points(src.as_bytes(), &splits);
        let mut parser = parser(schema());
        let records = parse_chunks(&mut parser, &chunks).unwrap();
        let expected: Vec<Record> = rows.iter().map(Row::expected).collect();
        records == expected && parser.bytes_consumed() == src.len() as u64
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .r#gen(Gen::new(24))
        .quickcheck(prop as fn(Vec<Row>, Vec<usize>) -> bool);
}

/// Property: structured columns hold exactly what a compact serializer would
/// write for the same value.
#[quickcheck]
fn structured_text_matches_serde_json(row: Row) -> bool {
    let src = row.to_json();
    let mut parser = RecordParser::new(schema(), ParserOptions::default());
    let records = parser.parse_all(src.as_bytes()).unwrap();
    records.len() == 1 && records[0] == row.expected()
}
