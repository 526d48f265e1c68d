//! Raw request payloads.

use crate::http::multipart::FormData;
use bytes::Bytes;

/// A request body that is sent as-is (structured payloads go through
/// `RequestConfig::data` instead).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body (GET, DELETE).
    #[default]
    Empty,
    /// Raw bytes.
    Bytes(Bytes),
    /// `multipart/form-data`, encoded when the request is built.
    Form(FormData),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<FormData> for RequestBody {
    fn from(form: FormData) -> Self {
        RequestBody::Form(form)
    }
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
            RequestBody::Form(f) => f.is_empty(),
        }
    }

    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            RequestBody::Form(form) => Some(form.content_type()),
            _ => None,
        }
    }

    /// Encode into wire bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(b) => b,
            RequestBody::Form(form) => form.into_body(),
        }
    }
}
