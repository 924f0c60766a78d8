#![allow(missing_docs)]
#![allow(dead_code)]

use core::fmt::Write;
use std::sync::Arc;

use recordmodem::{Column, Record, ScalarType, Schema};

/// Three records as a transport might deliver them: cut mid-string, mid-key
/// and right after a record boundary.
pub const STREAM: &[&str] = &[
    r#"{"id": 1, "city": "BOS"#,
    r#"TON", "pop": 667137.0, "loc": [-71.05, 42.36], "meta": {"src": "census", "tags": ["a", "b"]}, "state": "MA"}"#,
    r#"{"id": 2, "city": "Cambridge", "loc": [], "meta": null}{"id""#,
    r#": 3, "city": "Zürich \"ZH\"", "pop": null, "meta": [1, {"k": true}], "ignored": {"x": [1]}}"#,
    "\n",
];

pub fn zips_schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "zips",
        vec![
            Column::scalar("id", ScalarType::Int4),
            Column::scalar("city", ScalarType::Text),
            Column::scalar("pop", ScalarType::Int8),
            Column::array("loc", ScalarType::Float8),
            Column::structured("meta"),
            Column::scalar("state", ScalarType::Bpchar).with_type_modifier(2),
        ],
    ))
}

/// One line per record: `name=value` pairs in column order.
pub fn render(schema: &Schema, records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        let mut first = true;
        for (column, value) in schema.columns().iter().zip(record.values()) {
            if !first {
                out.push(' ');
            }
            first = false;
            match value {
                Some(v) => write!(out, "{}={v}", column.name).unwrap(),
                None => write!(out, "{}=NULL", column.name).unwrap(),
            }
        }
        out.push('\n');
    }
    out
}
