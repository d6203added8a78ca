//! Purpose: String-aware and bracket-aware scanning over raw JSON bytes.
//! Exports: `string_end`, `matching_close`, `skip_whitespace`, `token_end`.
//! Role: Shared primitives for the decoder and the legacy text accessors.
//! Invariants: Bracket characters inside quoted text are never structural.
//! Invariants: A quote terminates a string only when preceded by an even run of backslashes.
//! Invariants: All scans are linear in the bytes they visit; nothing is cached between calls.

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

pub(crate) fn is_structural(byte: u8) -> bool {
    matches!(byte, b',' | b'}' | b']' | b':')
}

pub(crate) fn skip_whitespace(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && is_whitespace(bytes[idx]) {
        idx += 1;
    }
    idx
}

/// End (exclusive) of a bare token starting at `start`: stops at a structural
/// character or whitespace.
pub(crate) fn token_end(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && !is_structural(bytes[idx]) && !is_whitespace(bytes[idx]) {
        idx += 1;
    }
    idx
}

/// Index of the quote closing the string whose opening quote is at `open`.
pub(crate) fn string_end(bytes: &[u8], open: usize) -> Option<usize> {
    let body_start = open + 1;
    let mut idx = body_start;
    while idx < bytes.len() {
        let rel = bytes[idx..].iter().position(|&b| b == b'"')?;
        let quote = idx + rel;
        let mut backslashes = 0;
        while quote > body_start + backslashes && bytes[quote - 1 - backslashes] == b'\\' {
            backslashes += 1;
        }
        if backslashes % 2 == 0 {
            return Some(quote);
        }
        idx = quote + 1;
    }
    None
}

/// Index of the bracket closing the `{` or `[` at `open`. Both bracket kinds
/// share one nesting counter; quoted text is skipped whole.
pub(crate) fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        match bytes[idx] {
            b'"' => idx = string_end(bytes, idx)?,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}
