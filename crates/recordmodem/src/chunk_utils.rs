/// Split `payload` into approximately equal-sized chunks.
///
/// Chunks are cut at byte positions, so multi-byte UTF-8 sequences may
/// straddle two chunks, just as they do across network reads.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// Split `payload` at the given positions, taken modulo the remaining
/// length. Used by property tests to derive chunkings from arbitrary input.
#[must_use]
pub fn split_at_points<'a>(payload: &'a [u8], splits: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::with_capacity(splits.len() + 1);
    let mut rest = payload;
    for &split in splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + split % rest.len());
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_cover_payload() {
        let payload = b"{\"a\":\"\xc3\xa9\"}";
        let chunks = produce_chunks(payload, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.concat(), payload);
    }

    #[test]
    fn split_points_wrap() {
        let chunks = split_at_points(b"abcdef", &[0, 7, 100]);
        assert_eq!(chunks, vec![&b"a"[..], b"bcd", b"e", b"f"]);
    }
}
