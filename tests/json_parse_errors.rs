//! Purpose: Regression coverage for decode failure variants, offsets and categories.
//! Exports: Integration tests only.
//! Role: Verify stable diagnostics that callers log and the CLI reports.
//! Invariants: A failed decode never yields a partial value.
//! Invariants: Category labels and exit-code mapping stay deterministic for representative input.

use basalt::core::decode::{MAX_DEPTH, decode};
use basalt::core::error::{Error, ErrorKind, ParseError, to_exit_code};

#[test]
fn truncated_object_reports_unmatched_bracket() {
    let err = decode(r#"{"a":"#).expect_err("truncated object");
    assert_eq!(err, ParseError::UnmatchedBracket { offset: 0, open: '{' });

    let err = decode("[1, 2").expect_err("truncated array");
    assert_eq!(err, ParseError::UnmatchedBracket { offset: 0, open: '[' });
}

#[test]
fn unterminated_text_points_at_opening_quote() {
    let err = decode(r#"{"a":"abc"#).expect_err("unterminated");
    assert_eq!(err, ParseError::UnterminatedString { offset: 5 });
    assert_eq!(err.category(), "unterminated-string");
}

#[test]
fn malformed_tokens_carry_the_token_text() {
    let err = decode(r#"{"n":12ab}"#).expect_err("malformed");
    assert_eq!(
        err,
        ParseError::MalformedNumber {
            offset: 5,
            token: "12ab".to_string()
        }
    );
    assert_eq!(err.to_string(), "malformed number `12ab` at offset 5");

    let err = decode("[truth]").expect_err("malformed literal");
    assert_eq!(err.category(), "malformed-number");
    assert_eq!(err.offset(), 1);
}

#[test]
fn invalid_escape_offset_points_at_backslash() {
    let err = decode(r#"["a\x"]"#).expect_err("escape");
    assert_eq!(err, ParseError::InvalidEscape { offset: 3 });
}

#[test]
fn structural_surprises_are_reported() {
    let err = decode(r#"{"a" 1}"#).expect_err("missing colon");
    assert_eq!(
        err,
        ParseError::UnexpectedCharacter {
            offset: 5,
            found: '1'
        }
    );

    let err = decode("[1] [2]").expect_err("trailing");
    assert_eq!(err, ParseError::TrailingCharacters { offset: 4 });

    assert_eq!(
        decode("").expect_err("empty"),
        ParseError::UnexpectedEnd { offset: 0 }
    );
    assert_eq!(
        decode("  ").expect_err("blank"),
        ParseError::UnexpectedEnd { offset: 2 }
    );
}

#[test]
fn nesting_limit_reports_depth_and_offset() {
    let depth = MAX_DEPTH + 1;
    let payload = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let err = decode(&payload).expect_err("too deep");
    assert_eq!(
        err,
        ParseError::NestingTooDeep {
            offset: MAX_DEPTH,
            limit: MAX_DEPTH
        }
    );
}

#[test]
fn parse_errors_map_to_decode_kind() {
    let err = Error::from(decode(r#"{"a":"abc"#).expect_err("unterminated"));
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.message(), Some("invalid json (unterminated-string)"));
    assert_eq!(err.offset(), Some(5));
    assert_eq!(to_exit_code(err.kind()), 6);
    let source = std::error::Error::source(&err).expect("source");
    assert_eq!(source.to_string(), "unterminated string starting at offset 5");
}
