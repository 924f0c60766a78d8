use std::sync::Arc;

use crate::{
    Column, ParseOutcome, ParserError, ParserOptions, Record, RecordParser, ScalarType, Schema,
};

/// `{a: integer, b: text}`, the shape most tests start from.
pub(crate) fn int_text_schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "t",
        vec![
            Column::scalar("a", ScalarType::Int4),
            Column::scalar("b", ScalarType::Text),
        ],
    ))
}

pub(crate) fn parser(schema: Arc<Schema>) -> RecordParser {
    RecordParser::new(schema, ParserOptions::default())
}

/// Feeds `chunks` one after another the way a transport loop would,
/// collecting every record, then finishes the stream.
pub(crate) fn parse_chunks(
    parser: &mut RecordParser,
    chunks: &[&[u8]],
) -> Result<Vec<Record>, ParserError> {
    let mut records = Vec::new();
    for chunk in chunks {
        let mut offset = 0;
        loop {
            let progress = parser.parse(chunk, offset)?;
            offset = progress.offset;
            if progress.outcome != ParseOutcome::RecordComplete {
                assert_eq!(offset, chunk.len());
                break;
            }
            records.push(parser.materialize()?);
            parser.reset();
        }
    }
    parser.finish()?;
    Ok(records)
}

pub(crate) fn parse_str(schema: Arc<Schema>, input: &str) -> Result<Vec<Record>, ParserError> {
    parser(schema).parse_all(input.as_bytes())
}
