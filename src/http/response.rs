//! Response wrapper with eagerly decoded data.

use crate::base::neterror::NetError;
use crate::cookies::jar::CookieJar;
use crate::http::config::{RequestConfig, ResponseType};
use crate::http::multipart::{boundary_from_content_type, FormData, MultipartError};
use crate::http::responsebody::{self, essence, Blob, ResponseData};
use crate::http::transport::RawResponse;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

/// A resolved response.
///
/// `data` holds the body decoded once according to the content type; the
/// raw body stays available through [`Response::json`], [`Response::text`]
/// and friends for reading it in another shape.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    cookies: CookieJar,
    url: Url,
    data: Option<ResponseData>,
    config: RequestConfig,
    raw: RawResponse,
}

impl Response {
    /// Wrap `raw` and decode its body.
    ///
    /// Status 204, and a response with neither a content type nor a body,
    /// leave `data` empty. A body that fails to decode yields a `Decode`
    /// error carrying the response.
    pub fn resolve(raw: RawResponse, config: RequestConfig) -> Result<Response, NetError> {
        let mut response = Response {
            status: raw.status,
            headers: raw.headers.clone(),
            cookies: CookieJar::from_headers(&raw.headers),
            url: raw.url.clone(),
            data: None,
            config,
            raw,
        };

        if response.status == StatusCode::NO_CONTENT {
            return Ok(response);
        }

        let content_type = response.content_type().map(str::to_string);
        if content_type.is_none() && response.raw.body.is_empty() {
            return Ok(response);
        }

        let declared = response.config.response_type.unwrap_or_default();
        let decoder = responsebody::select_decoder(declared, content_type.as_deref());
        tracing::trace!(
            status = response.status.as_u16(),
            declared = %declared,
            decoder = %decoder,
            "decoding response body"
        );

        match responsebody::decode(decoder, &response.raw.body, content_type.as_deref()) {
            Ok(data) => {
                response.data = Some(data);
                Ok(response)
            }
            Err(e) => Err(NetError::decode(response, e)),
        }
    }

    /// A response that never came from the transport, e.g. for a timeout.
    /// Its data is `message` as text.
    pub fn synthetic(
        status: StatusCode,
        message: impl Into<String>,
        url: Url,
        config: RequestConfig,
    ) -> Response {
        let message = message.into();
        let raw = RawResponse::new(status, url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .body(message.clone());

        Response {
            status,
            headers: raw.headers.clone(),
            cookies: CookieJar::new(),
            url,
            data: Some(ResponseData::Text(message)),
            config,
            raw,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase for the status, empty when there is none.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or_default()
    }

    /// Status in 200-299.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Cookies from the `Cookie` and `Set-Cookie` headers.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> &mut Option<ResponseData> {
        &mut self.data
    }

    /// Deserialize the decoded data into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, NetError> {
        let value = self
            .data
            .as_ref()
            .map(ResponseData::to_json_value)
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(|e| NetError::decode(self.clone(), e))
    }

    /// The effective config the request was sent with.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// The declared response type, defaulting to JSON.
    pub fn response_type(&self) -> ResponseType {
        self.config.response_type.unwrap_or_default()
    }

    /// The untouched transport response.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Re-read the raw body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.raw.body).map_err(|e| NetError::decode(self.clone(), e))
    }

    /// Re-read the raw body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw.body).into_owned()
    }

    pub fn blob(&self) -> Blob {
        Blob {
            content_type: self.content_type().map(essence).unwrap_or_default(),
            bytes: self.raw.body.clone(),
        }
    }

    pub fn array_buffer(&self) -> Bytes {
        self.raw.body.clone()
    }

    /// Re-read the raw body as multipart form data.
    pub fn form_data(&self) -> Result<FormData, NetError> {
        let boundary = self
            .content_type()
            .and_then(boundary_from_content_type)
            .ok_or_else(|| NetError::decode(self.clone(), MultipartError::NoBoundary))?;
        FormData::parse(&self.raw.body, boundary).map_err(|e| NetError::decode(self.clone(), e))
    }
}
