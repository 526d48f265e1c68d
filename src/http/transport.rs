//! The fetch primitive the client dispatches through.

use crate::base::neterror::NetError;
use crate::http::request::RequestDescriptor;
use crate::socket::connectjob::ConnectJob;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::header::HOST;
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use url::Url;

/// Sends one request and returns the complete response.
///
/// The client races the returned future against its timeout / abort signal
/// and drops it when the signal fires.
pub trait Transport: Send + Sync {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse, NetError>>;
}

/// A response exactly as the transport delivered it, body fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, url: Url) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url,
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Default transport: one HTTP/1.1 connection per request over TCP, with
/// BoringSSL for `https`.
#[derive(Debug, Clone, Default)]
pub struct HyperTransport;

impl HyperTransport {
    pub fn new() -> Self {
        Self
    }

    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, NetError> {
        let (method, url, mut headers, body) = request.into_parts();

        let socket = ConnectJob::connect(&url).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(socket))
            .await
            .map_err(|e| NetError::transport("HTTP/1.1 handshake failed", e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection closed with error");
            }
        });

        if !headers.contains_key(HOST) {
            headers.insert(HOST, host_header(&url)?);
        }

        let mut req = http::Request::builder()
            .method(method)
            .uri(origin_form(&url))
            .body(Full::new(body))
            .map_err(|e| NetError::transport("failed to build request", e))?;
        *req.headers_mut() = headers;

        let response = sender
            .send_request(req)
            .await
            .map_err(|e| NetError::transport(format!("request to {url} failed"), e))?;

        let (parts, incoming) = response.into_parts();
        let body = incoming
            .collect()
            .await
            .map_err(|e| NetError::transport("failed to read response body", e))?
            .to_bytes();

        Ok(RawResponse {
            status: parts.status,
            headers: parts.headers,
            url,
            body,
        })
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse, NetError>> {
        Box::pin(self.execute(request))
    }
}

/// `/path?query` request target.
fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// `host[:port]`, with the port only when it is not the scheme default.
fn host_header(url: &Url) -> Result<HeaderValue, NetError> {
    let host = url.host_str().unwrap_or_default();
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).map_err(|_| NetError::invalid_header("host"))
}
