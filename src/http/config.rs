//! Per-request configuration and the defaults/override merge.

use crate::http::abort::AbortSignal;
use crate::http::errormessage::ErrorMessage;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::params::{Params, ParamsSerializer};
use crate::http::requestbody::RequestBody;
use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Returned when an option string names no known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {option}: {value}")]
pub struct UnknownOption {
    option: &'static str,
    value: String,
}

/// Whether the transport should send and store credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    Include,
    SameOrigin,
    Omit,
}

impl Credentials {
    pub fn as_str(&self) -> &'static str {
        match self {
            Credentials::Include => "include",
            Credentials::SameOrigin => "same-origin",
            Credentials::Omit => "omit",
        }
    }
}

impl FromStr for Credentials {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(Credentials::Include),
            "same-origin" => Ok(Credentials::SameOrigin),
            "omit" => Ok(Credentials::Omit),
            _ => Err(UnknownOption {
                option: "credentials mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Cache mode forwarded to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    Default,
    NoStore,
    Reload,
    NoCache,
    ForceCache,
    OnlyIfCached,
}

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Default => "default",
            CacheMode::NoStore => "no-store",
            CacheMode::Reload => "reload",
            CacheMode::NoCache => "no-cache",
            CacheMode::ForceCache => "force-cache",
            CacheMode::OnlyIfCached => "only-if-cached",
        }
    }
}

impl FromStr for CacheMode {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(CacheMode::Default),
            "no-store" => Ok(CacheMode::NoStore),
            "reload" => Ok(CacheMode::Reload),
            "no-cache" => Ok(CacheMode::NoCache),
            "force-cache" => Ok(CacheMode::ForceCache),
            "only-if-cached" => Ok(CacheMode::OnlyIfCached),
            _ => Err(UnknownOption {
                option: "cache mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Hint for how the response body should be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Text,
    Blob,
    ArrayBuffer,
    FormData,
    Document,
    Stream,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Json => "json",
            ResponseType::Text => "text",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::FormData => "formdata",
            ResponseType::Document => "document",
            ResponseType::Stream => "stream",
        }
    }
}

impl FromStr for ResponseType {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseType::Json),
            "text" => Ok(ResponseType::Text),
            "blob" => Ok(ResponseType::Blob),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "formdata" => Ok(ResponseType::FormData),
            "document" => Ok(ResponseType::Document),
            "stream" => Ok(ResponseType::Stream),
            _ => Err(UnknownOption {
                option: "response type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password pair for `Authorization: Basic`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one request, or the defaults of a client.
///
/// Every field is optional; [`RequestConfig::merge`] lays an override on top
/// of a set of defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub method: Option<Method>,
    pub base_url: Option<String>,
    pub url: Option<String>,
    /// Use `url` verbatim and ignore `base_url`.
    pub bypass_base_url: Option<bool>,
    pub headers: OrderedHeaderMap,
    pub params: Option<Params>,
    pub params_serializer: Option<ParamsSerializer>,
    /// Structured payload, serialized as JSON into the body.
    pub data: Option<serde_json::Value>,
    /// Raw body, used when `data` is absent.
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
    pub credentials: Option<Credentials>,
    /// Forces `Credentials::Include` when true.
    pub with_credentials: Option<bool>,
    pub cache: Option<CacheMode>,
    pub response_type: Option<ResponseType>,
    pub auth: Option<BasicAuth>,
    pub xsrf_cookie_name: Option<String>,
    pub xsrf_header_name: Option<String>,
    pub error_message: Option<ErrorMessage>,
    pub signal: Option<AbortSignal>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn bypass_base_url(mut self, bypass: bool) -> Self {
        self.bypass_base_url = Some(bypass);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: impl Into<OrderedHeaderMap>) -> Self {
        self.headers.merge(&headers.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.get_or_insert_with(Params::new).insert(key, value);
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = Some(serializer);
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn xsrf(mut self, cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        self.xsrf_cookie_name = Some(cookie_name.into());
        self.xsrf_header_name = Some(header_name.into());
        self
    }

    pub fn error_message(mut self, error_message: ErrorMessage) -> Self {
        self.error_message = Some(error_message);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Produce the effective config: `overrides` on top of `self`.
    ///
    /// Each field set in `overrides` replaces the one in `self`. Headers are
    /// the exception and are merged key by key. Neither input is modified.
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut headers = self.headers.clone();
        headers.merge(&overrides.headers);

        RequestConfig {
            method: pick(&overrides.method, &self.method),
            base_url: pick(&overrides.base_url, &self.base_url),
            url: pick(&overrides.url, &self.url),
            bypass_base_url: overrides.bypass_base_url.or(self.bypass_base_url),
            headers,
            params: pick(&overrides.params, &self.params),
            params_serializer: pick(&overrides.params_serializer, &self.params_serializer),
            data: pick(&overrides.data, &self.data),
            body: pick(&overrides.body, &self.body),
            timeout: overrides.timeout.or(self.timeout),
            credentials: overrides.credentials.or(self.credentials),
            with_credentials: overrides.with_credentials.or(self.with_credentials),
            cache: overrides.cache.or(self.cache),
            response_type: overrides.response_type.or(self.response_type),
            auth: pick(&overrides.auth, &self.auth),
            xsrf_cookie_name: pick(&overrides.xsrf_cookie_name, &self.xsrf_cookie_name),
            xsrf_header_name: pick(&overrides.xsrf_header_name, &self.xsrf_header_name),
            error_message: pick(&overrides.error_message, &self.error_message),
            signal: pick(&overrides.signal, &self.signal),
        }
    }

    /// The effective credentials mode.
    pub fn effective_credentials(&self) -> Credentials {
        if self.with_credentials == Some(true) {
            Credentials::Include
        } else {
            self.credentials.unwrap_or(Credentials::SameOrigin)
        }
    }
}

fn pick<T: Clone>(preferred: &Option<T>, fallback: &Option<T>) -> Option<T> {
    preferred.as_ref().or(fallback.as_ref()).cloned()
}
