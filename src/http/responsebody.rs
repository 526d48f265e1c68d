//! Content-type driven response body decoding.

use crate::http::config::ResponseType;
use crate::http::multipart::{boundary_from_content_type, FormData, MultipartError};
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Accepted content-type prefixes per decoder, scanned in this order when
/// the declared response type does not match.
const DECODE_TABLE: [(ResponseType, &[&str]); 5] = [
    (ResponseType::Json, &["application/json"]),
    (
        ResponseType::Text,
        &[
            "text/html",
            "text/plain",
            "application/xml",
            "text/xml",
            "application/x-www-form-urlencoded",
        ],
    ),
    (ResponseType::FormData, &["multipart/form-data"]),
    (
        ResponseType::Blob,
        &[
            "application/pdf",
            "image/jpeg",
            "image/png",
            "image/webp",
            "audio/mpeg",
            "audio/ogg",
            "video/mp4",
            "video/webm",
        ],
    ),
    (
        ResponseType::ArrayBuffer,
        &["application/pdf", "application/octet-stream"],
    ),
];

/// Binary body tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Bytes,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The eagerly decoded body of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Blob(Blob),
    ArrayBuffer(Bytes),
    FormData(FormData),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(s) => Some(s),
            ResponseData::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of a blob or array buffer.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseData::Blob(b) => Some(&b.bytes),
            ResponseData::ArrayBuffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_form_data(&self) -> Option<&FormData> {
        match self {
            ResponseData::FormData(f) => Some(f),
            _ => None,
        }
    }

    /// JSON view of the data.
    ///
    /// Text becomes a JSON string; form data becomes an object of its text
    /// fields; binary bodies become an empty object.
    pub fn to_json_value(&self) -> Value {
        match self {
            ResponseData::Json(v) => v.clone(),
            ResponseData::Text(s) => Value::String(s.clone()),
            ResponseData::FormData(form) => Value::Object(
                form.iter()
                    .filter_map(|(name, part)| {
                        part.as_text()
                            .map(|text| (name.to_string(), Value::String(text.to_string())))
                    })
                    .collect(),
            ),
            ResponseData::Blob(_) | ResponseData::ArrayBuffer(_) => {
                Value::Object(serde_json::Map::new())
            }
        }
    }
}

/// A body that did not decode with the selected strategy.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

/// Media type without parameters, lower-cased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn accepted(kind: ResponseType) -> &'static [&'static str] {
    DECODE_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, prefixes)| *prefixes)
        .unwrap_or_default()
}

fn normalize(declared: ResponseType) -> ResponseType {
    match declared {
        ResponseType::Document => ResponseType::Text,
        ResponseType::Stream => ResponseType::ArrayBuffer,
        other => other,
    }
}

/// Pick the decoder for a body.
///
/// The declared type wins when its prefixes match the observed content type.
/// Otherwise the first table entry that matches is used, and text when none
/// does.
pub fn select_decoder(declared: ResponseType, content_type: Option<&str>) -> ResponseType {
    let Some(observed) = content_type.map(essence) else {
        return ResponseType::Text;
    };
    let matches = |prefixes: &[&str]| prefixes.iter().any(|p| observed.starts_with(p));

    let declared = normalize(declared);
    if matches(accepted(declared)) {
        return declared;
    }

    DECODE_TABLE
        .iter()
        .find(|(_, prefixes)| matches(*prefixes))
        .map(|(kind, _)| *kind)
        .unwrap_or(ResponseType::Text)
}

/// Decode `body` with `decoder`. `content_type` is the raw header value.
pub fn decode(
    decoder: ResponseType,
    body: &Bytes,
    content_type: Option<&str>,
) -> Result<ResponseData, DecodeError> {
    let data = match normalize(decoder) {
        ResponseType::Json => ResponseData::Json(serde_json::from_slice(body)?),
        ResponseType::FormData => {
            let boundary = content_type
                .and_then(boundary_from_content_type)
                .ok_or(MultipartError::NoBoundary)?;
            ResponseData::FormData(FormData::parse(body, boundary)?)
        }
        ResponseType::Blob => ResponseData::Blob(Blob {
            content_type: content_type.map(essence).unwrap_or_default(),
            bytes: body.clone(),
        }),
        ResponseType::ArrayBuffer => ResponseData::ArrayBuffer(body.clone()),
        _ => ResponseData::Text(String::from_utf8_lossy(body).into_owned()),
    };
    Ok(data)
}
