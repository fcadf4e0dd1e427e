//! The normalized `{message, statusCode}` error envelope.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code of an [`ErrorEnvelope`]: a GraphQL `extensions.code` string
/// or a numeric HTTP-like fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Code(String),
    Numeric(u16),
}

impl StatusCode {
    pub const UNAUTHENTICATED: &'static str = "UNAUTHENTICATED";
    pub const INTERNAL_SERVER_ERROR: &'static str = "INTERNAL_SERVER_ERROR";

    pub fn code(code: impl Into<String>) -> Self {
        Self::Code(code.into())
    }

    /// Exact, case-sensitive comparison against a string code.
    pub fn is_code(&self, code: &str) -> bool {
        matches!(self, Self::Code(own) if own == code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => f.write_str(code),
            Self::Numeric(status) => write!(f, "{status}"),
        }
    }
}

/// Error value produced by the authenticated transport for every failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub status_code: StatusCode,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }

    /// Envelope used when the body is missing, falsy, or not JSON, and when
    /// no response arrives at all.
    pub fn unknown() -> Self {
        Self::new("Unknown error", StatusCode::code(StatusCode::INTERNAL_SERVER_ERROR))
    }

    /// Inspect a parsed response body.
    ///
    /// Returns `Some` when the body is falsy or carries a non-empty `errors`
    /// array. Messages are concatenated without a separator; the status code is
    /// the first error's `extensions.code`, or `500`.
    pub fn from_graphql_body(body: &Value) -> Option<Self> {
        if is_falsy(body) {
            return Some(Self::unknown());
        }

        let errors = body.get("errors")?.as_array()?;
        if errors.is_empty() {
            return None;
        }

        let message: String = errors
            .iter()
            .filter_map(|error| error.get("message").and_then(Value::as_str))
            .collect();
        let message = if message.is_empty() {
            Value::Array(errors.clone()).to_string()
        } else {
            message
        };

        let status_code = errors
            .first()
            .and_then(|error| error.pointer("/extensions/code"))
            .and_then(status_from_json)
            .unwrap_or(StatusCode::Numeric(500));

        Some(Self::new(message, status_code))
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn status_from_json(code: &Value) -> Option<StatusCode> {
    if is_falsy(code) {
        return None;
    }
    match code {
        Value::String(text) => Some(StatusCode::Code(text.clone())),
        Value::Number(number) => Some(
            number
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .map_or_else(|| StatusCode::Code(number.to_string()), StatusCode::Numeric),
        ),
        other => Some(StatusCode::Code(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn falsy_bodies_produce_unknown_error() {
        for body in [json!(null), json!(false), json!(0), json!("")] {
            assert_eq!(ErrorEnvelope::from_graphql_body(&body), Some(ErrorEnvelope::unknown()));
        }
    }

    #[test]
    fn messages_are_concatenated_without_separator() {
        let body = json!({
            "errors": [
                {"message": "first", "extensions": {"code": "BAD_USER_INPUT"}},
                {"message": "second", "extensions": {"code": "FORBIDDEN"}}
            ]
        });
        let envelope = ErrorEnvelope::from_graphql_body(&body).unwrap();
        assert_eq!(envelope.message, "firstsecond");
        assert_eq!(envelope.status_code, StatusCode::code("BAD_USER_INPUT"));
    }

    #[test]
    fn missing_code_falls_back_to_numeric_500() {
        let body = json!({"errors": [{"message": "boom"}]});
        let envelope = ErrorEnvelope::from_graphql_body(&body).unwrap();
        assert_eq!(envelope.status_code, StatusCode::Numeric(500));
    }

    #[test]
    fn empty_messages_fall_back_to_serialized_errors() {
        let body = json!({"errors": [{"extensions": {"code": "X"}}]});
        let envelope = ErrorEnvelope::from_graphql_body(&body).unwrap();
        assert_eq!(envelope.message, r#"[{"extensions":{"code":"X"}}]"#);
        assert_eq!(envelope.status_code, StatusCode::code("X"));
    }

    #[test]
    fn data_only_and_empty_errors_pass_through() {
        assert_eq!(ErrorEnvelope::from_graphql_body(&json!({"data": {"me": null}})), None);
        assert_eq!(ErrorEnvelope::from_graphql_body(&json!({"errors": []})), None);
        assert_eq!(ErrorEnvelope::from_graphql_body(&json!([1, 2])), None);
    }

    #[test]
    fn envelope_serializes_with_camel_case_status() {
        let value = serde_json::to_value(ErrorEnvelope::new("x", StatusCode::Numeric(500))).unwrap();
        assert_eq!(value, json!({"message": "x", "statusCode": 500}));
    }
}
