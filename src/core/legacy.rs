//! Purpose: Lenient text-level accessors used by services that skip a full decode.
//! Exports: `extract_property`, `extract_array_elements`.
//! Role: Compatibility path for token/id/row extraction straight from response text.
//! Invariants: Never fail; missing or malformed input degrades to `None` or an empty Vec.
//! Invariants: Property lookup is depth-agnostic: the first textual `"name":` wins.
//! Notes: Use `decode` + `Value::get` when the property must be scoped to the root object.

use super::decode::unescape_at;
use super::encode::escape;
use super::scan;

/// Text of the value following the first `"name":` anywhere in `text`.
///
/// Strings come back unescaped, objects and arrays as their raw bracketed
/// slice, and every other value as its literal token (`42`, `true`, `null`).
pub fn extract_property(text: &str, name: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let needle = format!("\"{}\"", escape(name));
    for (idx, _) in text.match_indices(&needle) {
        let after = scan::skip_whitespace(bytes, idx + needle.len());
        if bytes.get(after) != Some(&b':') {
            continue;
        }
        let start = scan::skip_whitespace(bytes, after + 1);
        return raw_value(text, start);
    }
    None
}

fn raw_value(text: &str, start: usize) -> Option<String> {
    let bytes = text.as_bytes();
    match bytes.get(start)? {
        b'"' => {
            let close = scan::string_end(bytes, start)?;
            let raw = &text[start + 1..close];
            Some(unescape_at(raw, start + 1).unwrap_or_else(|_| raw.to_string()))
        }
        b'{' | b'[' => {
            let close = scan::matching_close(bytes, start)?;
            Some(text[start..=close].to_string())
        }
        _ => {
            let end = scan::token_end(bytes, start);
            (end > start).then(|| text[start..end].to_string())
        }
    }
}

/// Raw `{...}` slices of the first array in `text`, in order and undecoded.
/// Non-object elements are skipped; on truncated input the elements that
/// completed before the break are returned.
pub fn extract_array_elements(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut elements = Vec::new();
    let Some(open) = first_array_open(bytes) else {
        return elements;
    };

    let mut idx = open + 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b']' => break,
            b'"' => match scan::string_end(bytes, idx) {
                Some(close) => idx = close,
                None => break,
            },
            b'{' => match scan::matching_close(bytes, idx) {
                Some(close) => {
                    elements.push(text[idx..=close].to_string());
                    idx = close;
                }
                None => break,
            },
            b'[' => match scan::matching_close(bytes, idx) {
                Some(close) => idx = close,
                None => break,
            },
            _ => {}
        }
        idx += 1;
    }
    elements
}

fn first_array_open(bytes: &[u8]) -> Option<usize> {
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'"' => idx = scan::string_end(bytes, idx)?,
            b'[' => return Some(idx),
            _ => {}
        }
        idx += 1;
    }
    None
}
