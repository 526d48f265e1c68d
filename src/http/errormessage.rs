//! Deriving a human message from a failed response.

use crate::base::statustext::status_msg;
use crate::http::response::Response;
use crate::http::responsebody::ResponseData;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One way of pulling a message out of a decoded error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// The body itself, when it is a string.
    StringBody,
    /// A truthy `message` field.
    MessageField,
    /// A truthy `error` field.
    ErrorField,
    /// The whole body serialized as JSON.
    ///
    /// Yields nothing when there is no body, so the error message falls back
    /// to the status line (e.g. `502 BAD GATEWAY`) instead of `"null"`.
    Fallback,
}

impl ExtractStrategy {
    fn apply(&self, data: Option<&ResponseData>) -> Option<String> {
        match self {
            ExtractStrategy::StringBody => match data? {
                ResponseData::Text(s) => Some(s.clone()),
                ResponseData::Json(Value::String(s)) => Some(s.clone()),
                _ => None,
            },
            ExtractStrategy::MessageField => field(data?, "message"),
            ExtractStrategy::ErrorField => field(data?, "error"),
            ExtractStrategy::Fallback => data.map(|d| d.to_json_value().to_string()),
        }
    }
}

/// Read `key` from a JSON object if its value is truthy.
fn field(data: &ResponseData, key: &str) -> Option<String> {
    match data.as_json()?.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// How the message of a response error is produced.
#[derive(Clone)]
pub enum ErrorMessage {
    /// Try each strategy in order; the first that yields a message wins.
    Strategies(Vec<ExtractStrategy>),
    /// Caller-supplied extractor.
    Custom(Arc<dyn Fn(&Response) -> String + Send + Sync>),
}

impl Default for ErrorMessage {
    fn default() -> Self {
        ErrorMessage::Strategies(vec![
            ExtractStrategy::StringBody,
            ExtractStrategy::MessageField,
            ExtractStrategy::ErrorField,
            ExtractStrategy::Fallback,
        ])
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::Strategies(s) => f.debug_tuple("Strategies").field(s).finish(),
            ErrorMessage::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ErrorMessage {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Response) -> String + Send + Sync + 'static,
    {
        ErrorMessage::Custom(Arc::new(f))
    }

    /// Message for `response`. Falls back to the status line (`404 NOT FOUND`)
    /// when no strategy produces one.
    pub fn extract(&self, response: &Response) -> String {
        match self {
            ErrorMessage::Custom(f) => f(response),
            ErrorMessage::Strategies(strategies) => strategies
                .iter()
                .find_map(|s| s.apply(response.data()))
                .unwrap_or_else(|| status_msg(response.status().as_u16())),
        }
    }
}
