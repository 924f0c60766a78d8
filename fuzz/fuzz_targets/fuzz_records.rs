#![no_main]
use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use recordmodem::{Column, ParseOutcome, ParserOptions, RecordParser, ScalarType, Schema};
use serde_json::{Map, Value};

const HEADER: usize = 5; // 1 flag + 4-byte seed

const FIELDS: &[&str] = &["a", "b", "c", "d", "e", "f", "zz"];

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "fuzz",
        vec![
            Column::scalar("a", ScalarType::Int4),
            Column::scalar("b", ScalarType::Text),
            Column::scalar("c", ScalarType::Float8),
            Column::array("d", ScalarType::Int8),
            Column::structured("e"),
            Column::scalar("f", ScalarType::Varchar).with_type_modifier(4),
        ],
    ))
}

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => Value::from(u.arbitrary::<i32>()?),
            3 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            4..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            16..=20 => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
            _ => Err(arbitrary::Error::IncorrectFormat)?,
        };
        Ok(ArbitraryValue(value))
    }
}

/// Builds a stream of records whose keys mostly hit the schema's columns.
fn record_stream(data: &[u8]) -> Vec<u8> {
    let mut u = Unstructured::new(data);
    let mut out = Vec::new();
    while !u.is_empty() {
        let Ok(fields) = u.arbitrary::<Vec<(u8, ArbitraryValue)>>() else {
            break;
        };
        let record: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (FIELDS[usize::from(k) % FIELDS.len()].to_owned(), v.0))
            .collect();
        let Ok(bytes) = serde_json::to_vec(&Value::Object(record)) else {
            break;
        };
        out.extend_from_slice(&bytes);
        if u.arbitrary::<bool>().unwrap_or(false) {
            out.push(b'\n');
        }
    }
    out
}

/// Splits `data` into chunks of pseudo-random, non-zero length.
fn split(data: &[u8], split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut state = split_seed | 1;
    while start < data.len() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let size = (state as usize % (data.len() - start)) + 1;
        chunks.push(&data[start..start + size]);
        start += size;
    }
    chunks
}

fn options(flags: u8) -> ParserOptions {
    ParserOptions {
        integer_fraction_fixup: flags & 2 == 0,
        reject_unknown_fields: flags & 4 != 0,
        max_depth: (flags & 8 != 0).then_some(usize::from(flags >> 4) + 1),
    }
}

/// Renders records and the terminating error, if any, for comparison.
fn run_chunked(chunks: &[&[u8]], options: ParserOptions) -> String {
    let mut parser = RecordParser::new(schema(), options);
    let mut out = String::new();
    for chunk in chunks {
        let mut offset = 0;
        loop {
            match parser.parse(chunk, offset) {
                Ok(progress) => {
                    assert!(progress.offset >= offset && progress.offset <= chunk.len());
                    offset = progress.offset;
                    if progress.outcome != ParseOutcome::RecordComplete {
                        assert_eq!(offset, chunk.len());
                        break;
                    }
                    let record = parser.materialize().unwrap();
                    assert_eq!(record.len(), parser.schema().columns().len());
                    out.push_str(&format!("{record:?}\n"));
                    parser.reset();
                }
                Err(err) => {
                    out.push_str(&format!("{err}\n"));
                    return out;
                }
            }
        }
    }
    match parser.finish() {
        Ok(()) => out,
        Err(err) => out + &format!("{err}\n"),
    }
}

fn records(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u64::from(u32::from_le_bytes([data[1], data[2], data[3], data[4]]));
    let data = &data[HEADER..];

    let stream = if flags & 1 != 0 {
        record_stream(data)
    } else {
        data.to_vec()
    };

    let whole = run_chunked(&[&stream], options(flags));
    let chunked = run_chunked(&split(&stream, split_seed), options(flags));
    assert_eq!(whole, chunked);
}

fuzz_target!(|data: &[u8]| records(data));
