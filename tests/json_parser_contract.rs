//! Purpose: Lock decoder contract expectations with corpus + differential coverage.
//! Exports: Integration tests only (no runtime exports).
//! Role: Catch semantic drift between `basalt::core::decode` and the serde_json baseline.
//! Invariants: Differential checks assert parity where both parsers should agree.
//! Invariants: Malformed payloads are rejected by both parsers.
//! Notes: Comparison goes through `interop`, so number parity means parity of the numeric text.

use basalt::core::decode::{MAX_DEPTH, decode};
use basalt::core::encode::encode;
use basalt::core::value::Value;

fn parse_basalt(input: &str) -> Result<serde_json::Value, String> {
    decode(input)
        .map(|value| serde_json::Value::from(&value))
        .map_err(|err| err.to_string())
}

fn parse_serde_json(input: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str::<serde_json::Value>(input).map_err(|err| err.to_string())
}

fn assert_differential_parity(input: &str) {
    let ours = parse_basalt(input);
    let serde = parse_serde_json(input);
    match (ours, serde) {
        (Ok(a), Ok(b)) => assert_eq!(a, b, "parser value mismatch for {input}"),
        (Err(_), Err(_)) => {}
        (left, right) => panic!("parser outcome mismatch for {input}: basalt={left:?}, serde={right:?}"),
    }
}

#[test]
fn corpus_valid_payloads_match_serde() {
    let corpus = [
        r#"{"a":1,"b":"ok"}"#,
        r#"[1,2,3,{"x":true}]"#,
        r#"{"nested":{"arr":[{"k":"v"}]}}"#,
        r#"{"unicode":"\u2603","pair":"\ud83d\ude00"}"#,
        r#"{"escapes":"tab\there \"quoted\" back\\slash \/ \b\f\r\n"}"#,
        r#"{"empty_obj":{},"empty_arr":[],"empty_text":""}"#,
        r#"  { "spaced" : [ 1 , 2 ] , "flag" : false }  "#,
        r#"{"note":"braces } and [ brackets ] in text","n":null}"#,
        r#"[0,-12,3.25,1e3,2.5E-4,-0.5e+2]"#,
        r#"{"max_u64":18446744073709551615,"min_i64":-9223372036854775808}"#,
        r#"true"#,
        r#"null"#,
        r#""top-level text""#,
        r#"[[[]],[{}],[{"deep":[{"deeper":[1]}]}]]"#,
    ];

    for case in corpus {
        assert_differential_parity(case);
    }
}

#[test]
fn corpus_duplicate_keys_match_serde() {
    assert_differential_parity(r#"{"a":1,"a":2}"#);
    let value = decode(r#"{"a":1,"b":0,"a":2}"#).expect("decode");
    let keys: Vec<_> = value.as_object().expect("object").keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn corpus_malformed_payloads_rejected_by_both() {
    let corpus = [
        "",
        "   ",
        r#"{"a":}"#,
        r#"{"a" 1}"#,
        r#"{"a":1,}"#,
        r#"[1,]"#,
        r#"[1 2]"#,
        r#"{"a":1}}"#,
        r#""abc"#,
        r#"{"a":"\q"}"#,
        r#"{"a":tru}"#,
        r#"{1:2}"#,
        "[",
        "{",
        "01",
        "1.",
        ".5",
        "-",
        "1e",
        "nul",
        r#"{"a":1}x"#,
    ];

    for case in corpus {
        assert!(parse_basalt(case).is_err(), "basalt accepted {case:?}");
        assert!(parse_serde_json(case).is_err(), "serde_json accepted {case:?}");
    }
}

#[test]
fn corpus_nesting_within_serde_limit_matches() {
    let depth = 100usize;
    let payload = format!("{}0{}", "[".repeat(depth), "]".repeat(depth));
    assert_differential_parity(&payload);
}

#[test]
fn corpus_nesting_beyond_limit_is_rejected() {
    let within = format!("{}0{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
    assert!(decode(&within).is_ok(), "nesting at the limit should decode");

    let depth = MAX_DEPTH + 1;
    let beyond = format!("{}0{}", "[".repeat(depth), "]".repeat(depth));
    assert!(decode(&beyond).is_err());
    assert!(parse_serde_json(&beyond).is_err());
}

#[test]
fn canonical_output_matches_serde_compact_form() {
    let corpus = [
        r#"{"id":7,"name":"Widget","tags":["a","b"],"owner":{"active":true,"note":null}}"#,
        r#"[{"k":"line\nbreak"},{"k":"quote\"d"},{"k":"back\\slash"}]"#,
    ];
    for case in corpus {
        let value = decode(case).expect("decode");
        let ours = encode(&value).expect("encode");
        let reparsed = parse_serde_json(&ours).expect("serde reparse");
        assert_eq!(reparsed, parse_serde_json(case).expect("serde parse"));
        assert_eq!(decode(&ours).expect("decode"), value);
    }
}

#[test]
fn serde_values_convert_into_value_trees() {
    let source = serde_json::json!({"n": 5, "f": 1.5, "list": [true, null, "x"]});
    let value = Value::from(source.clone());
    assert_eq!(value.get("n").and_then(Value::as_i64), Some(5));
    assert_eq!(value.get("f").and_then(Value::as_f64), Some(1.5));
    assert_eq!(serde_json::Value::from(&value), source);
}
