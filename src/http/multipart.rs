//! Multipart form data.
//!
//! Provides RFC 2046 `multipart/form-data` encoding for request bodies and
//! decoding for `multipart/form-data` responses.
//!
//! # Example
//! ```
//! use fetchkit::http::multipart::{FormData, Part};
//!
//! let form = FormData::new()
//!     .text("username", "user123")
//!     .part("file", Part::bytes(&b"file content"[..]).file_name("doc.txt"));
//!
//! assert!(form.content_type().starts_with("multipart/form-data; boundary="));
//! ```

use bytes::Bytes;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const BOUNDARY_PREFIX: &str = "----fetchkit-boundary-";

/// Failure to decode a multipart body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("multipart body has no boundary parameter")]
    NoBoundary,
    #[error("multipart body does not contain its boundary")]
    MissingBoundary,
    #[error("multipart body is not terminated by a closing boundary")]
    Unterminated,
    #[error("malformed multipart part: {0}")]
    Malformed(&'static str),
}

/// An ordered set of named form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FormData {
    boundary: String,
    fields: Vec<(String, Part)>,
}

impl Default for FormData {
    fn default() -> Self {
        Self::new()
    }
}

impl FormData {
    /// Empty form with a generated boundary.
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Empty form with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Append a `text/plain` field.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(name, Part::text(value))
    }

    /// Append an arbitrary part. Repeated names are kept.
    pub fn part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.fields.push((name.into(), part));
        self
    }

    /// First part with this name.
    pub fn get(&self, name: &str) -> Option<&Part> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// First part with this name, as UTF-8 text.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Part::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Part)> {
        self.fields.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `Content-Type` header value announcing the boundary.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact size of [`into_body`](Self::into_body) without encoding.
    pub fn content_length(&self) -> usize {
        if self.fields.is_empty() {
            return 0;
        }
        let delimiter = self.boundary.len() + 2;
        let parts: usize = self
            .fields
            .iter()
            .map(|(name, part)| {
                delimiter + CRLF.len() + part.head(name).len() + part.data.len() + CRLF.len()
            })
            .sum();
        parts + delimiter + 2 + CRLF.len()
    }

    /// Encode the form. An empty form encodes to an empty body.
    pub fn into_body(self) -> Bytes {
        if self.fields.is_empty() {
            return Bytes::new();
        }

        let mut out = Vec::with_capacity(self.content_length());
        for (name, part) in &self.fields {
            self.write_delimiter(&mut out, false);
            out.extend_from_slice(part.head(name).as_bytes());
            out.extend_from_slice(&part.data);
            out.extend_from_slice(CRLF);
        }
        self.write_delimiter(&mut out, true);
        Bytes::from(out)
    }

    fn write_delimiter(&self, out: &mut Vec<u8>, last: bool) {
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        if last {
            out.extend_from_slice(b"--");
        }
        out.extend_from_slice(CRLF);
    }

    /// Decode a `multipart/form-data` body delimited by `boundary`.
    pub fn parse(body: &[u8], boundary: &str) -> Result<FormData, MultipartError> {
        let delimiter = format!("--{boundary}");
        let delimiter = delimiter.as_bytes();

        let mut pos = find(body, delimiter, 0).ok_or(MultipartError::MissingBoundary)?
            + delimiter.len();
        let mut form = FormData::with_boundary(boundary);

        loop {
            let rest = &body[pos..];
            if rest.starts_with(b"--") {
                return Ok(form);
            }

            let start = pos + line_break_len(rest)?;
            let next = find(body, delimiter, start).ok_or(MultipartError::Unterminated)?;

            let mut end = next;
            if body[start..end].ends_with(b"\r\n") {
                end -= 2;
            } else if body[start..end].ends_with(b"\n") {
                end -= 1;
            }

            let (name, part) = parse_part(&body[start..end])?;
            form.fields.push((name, part));

            pos = next + delimiter.len();
        }
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl Part {
    /// UTF-8 text, typed `text/plain; charset=utf-8`.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(value.into()),
            content_type: Some(TEXT_PLAIN.to_string()),
            file_name: None,
        }
    }

    /// Raw bytes with no declared type.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn mime(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn name_of_file(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The data as UTF-8, if it is.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Part headers including the blank line that ends them.
    fn head(&self, name: &str) -> String {
        let mut head = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_param(name)
        );
        if let Some(file_name) = &self.file_name {
            head += &format!("; filename=\"{}\"", escape_param(file_name));
        }
        if let Some(mime) = &self.content_type {
            head += &format!("\r\nContent-Type: {mime}");
        }
        head + "\r\n\r\n"
    }
}

/// Extract the `boundary` parameter from a `multipart/*` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn parse_part(raw: &[u8]) -> Result<(String, Part), MultipartError> {
    let (head, data) = match find(raw, b"\r\n\r\n", 0) {
        Some(i) => (&raw[..i], &raw[i + 4..]),
        None => match find(raw, b"\n\n", 0) {
            Some(i) => (&raw[..i], &raw[i + 2..]),
            None => return Err(MultipartError::Malformed("missing header terminator")),
        },
    };
    let head =
        std::str::from_utf8(head).map_err(|_| MultipartError::Malformed("non UTF-8 headers"))?;

    let mut name = None;
    let mut part = Part::bytes(Bytes::copy_from_slice(data));

    for line in head.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                let Some((k, v)) = param.split_once('=') else {
                    continue;
                };
                let v = unescape_param(v.trim().trim_matches('"'));
                match k.trim() {
                    "name" => name = Some(v),
                    "filename" => part.file_name = Some(v),
                    _ => {}
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            part.content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or(MultipartError::Malformed("part has no name"))?;
    Ok((name, part))
}

fn line_break_len(rest: &[u8]) -> Result<usize, MultipartError> {
    if rest.starts_with(b"\r\n") {
        Ok(2)
    } else if rest.starts_with(b"\n") {
        Ok(1)
    } else {
        Err(MultipartError::Malformed("boundary not followed by a line break"))
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Percent-escape `"`, CR and LF in a disposition parameter, as browsers do.
fn escape_param(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn unescape_param(value: &str) -> String {
    value
        .replace("%22", "\"")
        .replace("%0D", "\r")
        .replace("%0A", "\n")
}

/// `----fetchkit-boundary-` followed by the clock and pid in hex.
fn generate_boundary() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{BOUNDARY_PREFIX}{nanos:x}{:x}", std::process::id())
}
