//! Normalized error type for every stage of the request pipeline.
//!
//! A [`NetError`] is built once, at the point a failure is detected, and is
//! then handed back to the caller unchanged. The only exception is the
//! attached response, which response-phase interceptors may replace.

use crate::base::statustext::status_msg;
use crate::http::response::Response;
use crate::http::responsebody::ResponseData;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used across the crate.
pub type NetResult<T> = Result<T, NetError>;

/// Category of a [`NetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The base URL / path combination does not form an absolute URL.
    InvalidUrl,
    /// Neither a base URL nor an absolute path was configured.
    MissingBase,
    /// The transport did not answer within the configured timeout.
    Timeout,
    /// The transport answered with a status outside 200-299.
    Response,
    /// The body could not be decoded with the content-type driven strategy.
    Decode,
    /// A request or response interceptor failed and nothing recovered it.
    Interceptor,
    /// The caller aborted the request through its own signal.
    Aborted,
    /// The transport itself failed (DNS, connect, TLS, protocol).
    Transport,
    /// A header name or value could not be encoded.
    InvalidHeader,
    /// A structured payload could not be serialized.
    Serialize,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::MissingBase => "missing_base",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Response => "response",
            ErrorKind::Decode => "decode",
            ErrorKind::Interceptor => "interceptor",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Transport => "transport",
            ErrorKind::InvalidHeader => "invalid_header",
            ErrorKind::Serialize => "serialize",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single error type surfaced by [`Client`](crate::client::Client).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NetError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
    status_msg: Option<String>,
    data: Option<ResponseData>,
    response: Option<Box<Response>>,
    #[source]
    source: Option<BoxError>,
}

impl NetError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            status_msg: None,
            data: None,
            response: None,
            source: None,
        }
    }

    fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn with_response(mut self, response: Response) -> Self {
        let code = response.status().as_u16();
        self.status = Some(code);
        self.status_msg = Some(status_msg(code));
        self.data = response.data().cloned();
        self.response = Some(Box::new(response));
        self
    }

    /// The URL could not be parsed.
    pub fn invalid_url(input: &str, source: url::ParseError) -> Self {
        Self::new(ErrorKind::InvalidUrl, format!("Invalid URL: {input}")).with_source(source)
    }

    /// No base URL and no absolute path.
    pub fn missing_base() -> Self {
        Self::new(ErrorKind::MissingBase, "No URL or baseURL provided.")
    }

    /// Timeout error carrying the synthetic 408 response built by the client.
    pub fn timeout(after: Duration, response: Response) -> Self {
        Self::new(ErrorKind::Timeout, timeout_message(after)).with_response(response)
    }

    /// Wrap a non-2xx response, deriving the message with `message`.
    pub fn from_response(response: Response, message: String) -> Self {
        Self::new(ErrorKind::Response, message).with_response(response)
    }

    /// The body of `response` failed to decode.
    pub fn decode(response: Response, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self::new(ErrorKind::Decode, source.to_string())
            .with_response(response)
            .with_source(source)
    }

    /// Wrap a thrown value: a plain message without any response attached.
    pub fn from_thrown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interceptor, message)
    }

    /// The caller's abort signal fired.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Aborted, reason)
    }

    /// The transport failed before producing a response.
    pub fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::new(ErrorKind::Transport, message).with_source(source)
    }

    /// A header could not be represented on the wire.
    pub fn invalid_header(name: &str) -> Self {
        Self::new(ErrorKind::InvalidHeader, format!("Invalid header: {name}"))
    }

    /// A structured payload failed to serialize.
    pub fn serialize(source: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialize, source.to_string()).with_source(source)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human readable message (same as `Display`).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Numeric HTTP status, when a response (real or synthetic) is attached.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Status code and phrase, e.g. `404 NOT FOUND`.
    pub fn status_msg(&self) -> Option<&str> {
        self.status_msg.as_deref()
    }

    /// Decoded body of the failing response.
    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Take the attached response out of the error.
    pub fn into_response(self) -> Option<Response> {
        self.response.map(|r| *r)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub(crate) fn take_response(&mut self) -> Option<Response> {
        self.response.take().map(|r| *r)
    }

    pub(crate) fn set_response(&mut self, response: Response) {
        self.response = Some(Box::new(response));
    }
}

impl From<String> for NetError {
    fn from(message: String) -> Self {
        NetError::from_thrown(message)
    }
}

impl From<&str> for NetError {
    fn from(message: &str) -> Self {
        NetError::from_thrown(message)
    }
}

/// Message used for both the timeout error and its synthetic response body.
pub fn timeout_message(after: Duration) -> String {
    format!(
        "Request timed out after server failed to respond after {}ms",
        after.as_millis()
    )
}
