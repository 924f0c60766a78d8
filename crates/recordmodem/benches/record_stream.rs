//! Benchmark – `recordmodem::RecordParser` over a concatenated stream
#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::{fmt::Write, hint::black_box, sync::Arc, time::Duration};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use recordmodem::{
    Column, ParseOutcome, ParserOptions, RecordParser, RecordReader, ScalarType, Schema,
};

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "events",
        vec![
            Column::scalar("id", ScalarType::Int8),
            Column::scalar("name", ScalarType::Text),
            Column::scalar("score", ScalarType::Float8),
            Column::array("tags", ScalarType::Text),
            Column::structured("payload"),
        ],
    ))
}

/// A deterministic stream of `rows` records, newline separated.
fn make_stream(rows: usize) -> String {
    let mut s = String::new();
    for i in 0..rows {
        writeln!(
            s,
            r#"{{"id": {i}.0, "name": "user \"{i}\"", "score": {score}, "tags": ["a", "b{i}"], "payload": {{"n": {i}, "xs": [1, 2, {{"deep": null}}]}}, "skip": [1, 2, 3]}}"#,
            score = i as f64 / 7.0,
        )
        .unwrap();
    }
    s
}

/// Feeds `payload` in `parts` chunks and returns the number of records.
fn run_chunked(schema: &Arc<Schema>, payload: &[u8], parts: usize) -> usize {
    let chunk_size = payload.len().div_ceil(parts);
    let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
    let mut produced = 0usize;
    for chunk in payload.chunks(chunk_size) {
        let mut offset = 0;
        loop {
            let progress = parser.parse(chunk, offset).unwrap();
            offset = progress.offset;
            if progress.outcome != ParseOutcome::RecordComplete {
                break;
            }
            black_box(parser.materialize().unwrap());
            parser.reset();
            produced += 1;
        }
    }
    parser.finish().unwrap();
    produced
}

fn bench_record_stream(c: &mut Criterion) {
    let schema = schema();
    let payload = make_stream(2_000);

    let mut group = c.benchmark_group("record_stream");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("parse_all", |b| {
        b.iter(|| {
            let mut parser = RecordParser::new(schema.clone(), ParserOptions::default());
            black_box(parser.parse_all(black_box(payload.as_bytes())).unwrap().len())
        });
    });

    for &parts in &[10usize, 1_000, 50_000] {
        group.bench_with_input(BenchmarkId::new("chunked", parts), &parts, |b, &parts| {
            b.iter(|| black_box(run_chunked(&schema, black_box(payload.as_bytes()), parts)));
        });
    }

    group.bench_function("reader", |b| {
        b.iter(|| {
            RecordReader::new(payload.as_bytes(), schema.clone(), ParserOptions::default())
                .map(Result::unwrap)
                .count()
        });
    });
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(10));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_record_stream }
criterion_main!(benches);
