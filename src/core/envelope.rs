//! Purpose: Read the backend's failure body (`{error, message, code}` and auth variants).
//! Exports: `ErrorEnvelope`.
//! Role: Turns a non-success response body into diagnostic fields for `Error`.
//! Invariants: Never fails; a body that is not an object yields an empty envelope.
//! Invariants: With no recognized field present, the raw body is the diagnostic.

use super::decode::decode;
use super::value::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub error: Option<String>,
    pub message: Option<String>,
    pub code: Option<String>,
    pub hint: Option<String>,
    pub details: Option<String>,
    /// Auth endpoints report `error_description` / `msg` instead of `message`.
    pub description: Option<String>,
}

impl ErrorEnvelope {
    pub fn parse(body: &str) -> Self {
        let Ok(value) = decode(body) else {
            return Self::default();
        };
        if value.as_object().is_none() {
            return Self::default();
        }
        Self {
            error: field_text(&value, "error"),
            message: field_text(&value, "message"),
            code: field_text(&value, "code").or_else(|| field_text(&value, "error_code")),
            hint: field_text(&value, "hint"),
            details: field_text(&value, "details"),
            description: field_text(&value, "error_description")
                .or_else(|| field_text(&value, "msg")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.message.is_none()
            && self.code.is_none()
            && self.description.is_none()
    }

    /// Best human-readable line: message, then description, then error, then
    /// the trimmed raw body.
    pub fn diagnostic(&self, body: &str) -> String {
        self.message
            .as_deref()
            .or(self.description.as_deref())
            .or(self.error.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string())
    }
}

/// Text members as-is; numbers keep their literal text (auth codes are often
/// numeric). Anything else is treated as absent.
fn field_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Text(text) => Some(text.clone()),
        Value::Number(number) => number.as_str().map(str::to_string),
        _ => None,
    }
}
