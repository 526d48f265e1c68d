//! Turns an effective [`RequestConfig`] into a transport-ready descriptor.

use crate::base::neterror::NetError;
use crate::cookies::jar::CookieSource;
use crate::http::abort::AbortSignal;
use crate::http::config::{CacheMode, Credentials, RequestConfig};
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::params::Params;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

/// Final URL plus everything the transport needs to send it.
///
/// Immutable once built and consumed by exactly one transport call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
    credentials: Credentials,
    cache: Option<CacheMode>,
    signal: Option<AbortSignal>,
}

impl RequestDescriptor {
    /// Build the descriptor for `config`.
    ///
    /// `cookies` is the cookie context used for XSRF injection and the
    /// `Cookie` header. Without one, XSRF injection is skipped. The XSRF
    /// header is only set for requests to the base URL's origin, and
    /// `same-origin` credentials only attach cookies there.
    pub fn build(
        config: &RequestConfig,
        cookies: Option<&dyn CookieSource>,
    ) -> Result<Self, NetError> {
        let mut headers = config.headers.clone();

        let mut url = resolve_url(config)?;
        append_query(&mut url, config);

        let body = encode_body(config, &mut headers)?;
        set_basic_auth(config, &mut headers);
        let same_origin = is_same_origin(config, &url);
        if same_origin {
            set_xsrf_header(config, cookies, &url, &mut headers);
        }

        let credentials = config.effective_credentials();
        let send_cookies = match credentials {
            Credentials::Include => true,
            Credentials::SameOrigin => same_origin,
            Credentials::Omit => false,
        };
        if send_cookies {
            set_cookie_header(cookies, &url, &mut headers);
        }

        Ok(Self {
            url,
            method: config.method.clone().unwrap_or(Method::GET),
            headers: headers.to_header_map()?,
            body,
            credentials,
            cache: config.cache,
            signal: config.signal.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials
    }

    pub fn cache(&self) -> Option<CacheMode> {
        self.cache
    }

    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    /// Replace the signal with the one that actually governs dispatch
    /// (timeout combined with the caller's signal).
    pub(crate) fn set_signal(&mut self, signal: AbortSignal) {
        self.signal = Some(signal);
    }

    /// Split into method, URL, headers and body.
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Bytes) {
        (self.method, self.url, self.headers, self.body)
    }
}

fn resolve_url(config: &RequestConfig) -> Result<Url, NetError> {
    let base = config.base_url.as_deref().filter(|b| !b.is_empty());
    let path = config.url.as_deref().filter(|p| !p.is_empty());
    let bypass = config.bypass_base_url.unwrap_or(false);

    let input = match (bypass, base, path) {
        (true, _, Some(path)) => path.to_string(),
        (_, Some(base), path) => format!("{base}{}", path.unwrap_or_default()),
        (_, None, Some(path)) => path.to_string(),
        (_, None, None) => return Err(NetError::missing_base()),
    };

    Url::parse(&input).map_err(|e| NetError::invalid_url(&input, e))
}

fn append_query(url: &mut Url, config: &RequestConfig) {
    let empty = Params::new();
    let params = config.params.as_ref().unwrap_or(&empty);

    let serialized = match &config.params_serializer {
        Some(serializer) => serializer.serialize(params),
        None => params.to_query_string(),
    };
    if serialized.is_empty() {
        return;
    }

    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{serialized}"),
        _ => serialized,
    };
    url.set_query(Some(&query));
}

fn encode_body(config: &RequestConfig, headers: &mut OrderedHeaderMap) -> Result<Bytes, NetError> {
    if let Some(data) = &config.data {
        let bytes = serde_json::to_vec(data).map_err(NetError::serialize)?;
        headers.insert_if_absent("content-type", "application/json");
        return Ok(Bytes::from(bytes));
    }

    match &config.body {
        Some(body) => {
            if let Some(content_type) = body.content_type() {
                headers.insert_if_absent("content-type", content_type);
            }
            Ok(body.clone().into_bytes())
        }
        None => Ok(Bytes::new()),
    }
}

fn set_basic_auth(config: &RequestConfig, headers: &mut OrderedHeaderMap) {
    let Some(auth) = &config.auth else {
        return;
    };
    if headers.contains("authorization") {
        return;
    }
    let token = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
    headers.insert("authorization", format!("Basic {token}"));
}

/// Whether `url` shares its origin with the configured base URL.
///
/// A request without a base URL is its own origin.
fn is_same_origin(config: &RequestConfig, url: &Url) -> bool {
    let Some(base) = config.base_url.as_deref().filter(|b| !b.is_empty()) else {
        return true;
    };
    match Url::parse(base) {
        Ok(base) => base.origin() == url.origin(),
        Err(_) => false,
    }
}

fn set_xsrf_header(
    config: &RequestConfig,
    cookies: Option<&dyn CookieSource>,
    url: &Url,
    headers: &mut OrderedHeaderMap,
) {
    let (Some(cookie_name), Some(header_name)) =
        (&config.xsrf_cookie_name, &config.xsrf_header_name)
    else {
        return;
    };

    let Some(source) = cookies else {
        tracing::warn!(
            cookie = %cookie_name,
            header = %header_name,
            "XSRF names configured without a cookie context; header not set"
        );
        return;
    };

    match source.cookie_value(cookie_name, url).filter(|token| !token.is_empty()) {
        Some(token) => headers.insert(header_name.as_str(), token),
        None => tracing::trace!(cookie = %cookie_name, "XSRF cookie not present"),
    }
}

fn set_cookie_header(
    cookies: Option<&dyn CookieSource>,
    url: &Url,
    headers: &mut OrderedHeaderMap,
) {
    if headers.contains("cookie") {
        return;
    }
    if let Some(header) = cookies.and_then(|c| c.cookie_header(url)) {
        headers.insert("cookie", header);
    }
}
