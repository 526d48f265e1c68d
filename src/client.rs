//! HTTP client with instance defaults and interceptors.
//!
//! # Example
//!
//! ```rust,no_run
//! use fetchkit::Client;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), fetchkit::NetError> {
//! let client = Client::builder()
//!     .base_url("https://api.example.com")
//!     .timeout(Duration::from_secs(5))
//!     .build();
//!
//! client.interceptors().request.use_fn(|config| async move {
//!     Ok(config.header("x-request-id", "42"))
//! });
//!
//! let resp = client.get("/users", None).await?;
//! println!("{:?}", resp.data());
//! # Ok(())
//! # }
//! ```

use crate::base::neterror::{timeout_message, NetError};
use crate::cookies::jar::{CookieJar, CookieSource};
use crate::http::abort::{with_timeout, AbortReason, AbortSignal};
use crate::http::config::{BasicAuth, CacheMode, Credentials, RequestConfig, ResponseType};
use crate::http::errormessage::ErrorMessage;
use crate::http::interceptor::Interceptors;
use crate::http::request::RequestDescriptor;
use crate::http::response::Response;
use crate::http::transport::{HyperTransport, RawResponse, Transport};
use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// HTTP client.
///
/// Cloning is cheap; clones share defaults, interceptors, transport and
/// cookie jar. Use [`Client::builder()`] to configure one.
#[derive(Clone)]
pub struct Client {
    defaults: Arc<RwLock<RequestConfig>>,
    interceptors: Arc<Interceptors>,
    transport: Arc<dyn Transport>,
    cookie_jar: Option<Arc<RwLock<CookieJar>>>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults())
            .field("interceptors", &self.interceptors)
            .field("cookie_jar", &self.cookie_jar.is_some())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client with default settings and the hyper transport.
    pub fn new() -> Self {
        ClientBuilder::default().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Snapshot of the instance defaults.
    pub fn defaults(&self) -> RequestConfig {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// The shared cookie jar, when one was installed.
    pub fn cookie_jar(&self) -> Option<&Arc<RwLock<CookieJar>>> {
        self.cookie_jar.as_ref()
    }

    /// Set the default `Authorization` header: `Bearer <token>`, or the raw
    /// token when `is_bearer` is false.
    pub fn set_auth_header(&self, token: &str, is_bearer: bool) {
        let value = if is_bearer {
            format!("Bearer {token}")
        } else {
            token.to_string()
        };
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .headers
            .insert("authorization", value);
    }

    pub async fn get(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        self.request(config.unwrap_or_default().method(Method::GET).url(url))
            .await
    }

    pub async fn delete(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        self.request(config.unwrap_or_default().method(Method::DELETE).url(url))
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        self.send_with_data(Method::POST, url, data, config).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        self.send_with_data(Method::PUT, url, data, config).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        url: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        self.send_with_data(Method::PATCH, url, data, config).await
    }

    async fn send_with_data<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        data: &B,
        config: Option<RequestConfig>,
    ) -> Result<Response, NetError> {
        let data = serde_json::to_value(data).map_err(NetError::serialize)?;
        self.request(config.unwrap_or_default().method(method).url(url).data(data))
            .await
    }

    /// Run the full pipeline for `config`.
    ///
    /// Defaults are merged under `config`, request interceptors run, the
    /// request is built and dispatched under the timeout, the body is
    /// decoded, and response interceptors run. A non-2xx status becomes a
    /// `Response`-kind error; response interceptors still see its response.
    pub async fn request(&self, config: RequestConfig) -> Result<Response, NetError> {
        let merged = self.defaults().merge(&config);
        let config = self.interceptors.request.run(merged).await?;

        let cookies = self.cookie_jar.as_deref().map(|jar| jar as &dyn CookieSource);
        let descriptor = RequestDescriptor::build(&config, cookies)?;
        let url = descriptor.url().clone();
        let credentials = descriptor.credentials();

        tracing::debug!(method = %descriptor.method(), %url, "dispatching request");
        let raw = self.dispatch(descriptor, &config).await?;
        tracing::debug!(status = raw.status.as_u16(), %url, "response received");

        if credentials != Credentials::Omit {
            self.store_cookies(&raw);
        }

        let error_message = config.error_message.clone().unwrap_or_default();
        let response = Response::resolve(raw, config)?;

        if response.ok() {
            return self.interceptors.response.run(response).await;
        }

        let message = error_message.extract(&response);
        let mut err = NetError::from_response(response, message);
        if let Some(attached) = err.take_response() {
            let intercepted = self.interceptors.response.run(attached).await?;
            err.set_response(intercepted);
        }
        tracing::debug!(status = ?err.status(), error = %err, "request failed");
        Err(err)
    }

    /// Send through the transport, racing the timeout and the caller's signal.
    async fn dispatch(
        &self,
        mut descriptor: RequestDescriptor,
        config: &RequestConfig,
    ) -> Result<RawResponse, NetError> {
        let url = descriptor.url().clone();

        if let Some(reason) = config.signal.as_ref().and_then(AbortSignal::reason) {
            return Err(abort_error(reason, url, config));
        }

        let (signal, timer) = match config.timeout.filter(|t| !t.is_zero()) {
            Some(timeout) => {
                let (signal, token) = with_timeout(timeout, config.signal.as_ref());
                (Some(signal), Some(token))
            }
            None => (config.signal.clone(), None),
        };

        let Some(signal) = signal else {
            return self.transport.send(descriptor).await;
        };
        if let Some(reason) = signal.reason() {
            return Err(abort_error(reason, url, config));
        }
        descriptor.set_signal(signal.clone());

        let result = tokio::select! {
            biased;
            reason = signal.aborted() => Err(abort_error(reason, url, config)),
            result = self.transport.send(descriptor) => result,
        };

        if let Some(timer) = timer {
            timer.cancel();
        }
        result
    }

    fn store_cookies(&self, raw: &RawResponse) {
        let Some(jar) = &self.cookie_jar else {
            return;
        };
        let received = CookieJar::from_headers(&raw.headers);
        if received.is_empty() {
            return;
        }
        tracing::trace!(count = received.len(), "storing response cookies");
        jar.write()
            .unwrap_or_else(PoisonError::into_inner)
            .store_response(&raw.url, &received);
    }
}

fn abort_error(reason: AbortReason, url: Url, config: &RequestConfig) -> NetError {
    match reason {
        AbortReason::Timeout(after) => {
            tracing::debug!(%url, timeout_ms = after.as_millis() as u64, "request timed out");
            let response = Response::synthetic(
                StatusCode::REQUEST_TIMEOUT,
                timeout_message(after),
                url,
                config.clone(),
            );
            NetError::timeout(after, response)
        }
        AbortReason::Cancelled(reason) => {
            tracing::debug!(%url, %reason, "request aborted");
            NetError::aborted(reason)
        }
    }
}

/// Builder for a [`Client`].
///
/// Defaults: method `GET`, header `accept: application/json`, no timeout.
pub struct ClientBuilder {
    defaults: RequestConfig,
    transport: Option<Arc<dyn Transport>>,
    cookie_jar: Option<Arc<RwLock<CookieJar>>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            defaults: RequestConfig::new()
                .method(Method::GET)
                .header("accept", "application/json"),
            transport: None,
            cookie_jar: None,
        }
    }
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.defaults.base_url = Some(base_url.into());
        self
    }

    /// Add or replace a default header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.defaults.credentials = Some(credentials);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.defaults.with_credentials = Some(with_credentials);
        self
    }

    pub fn cache(mut self, cache: CacheMode) -> Self {
        self.defaults.cache = Some(cache);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.defaults.response_type = Some(response_type);
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.defaults.auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// XSRF cookie and header names. Needs a cookie jar to take effect.
    pub fn xsrf(mut self, cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        self.defaults.xsrf_cookie_name = Some(cookie_name.into());
        self.defaults.xsrf_header_name = Some(header_name.into());
        self
    }

    pub fn error_message(mut self, error_message: ErrorMessage) -> Self {
        self.defaults.error_message = Some(error_message);
        self
    }

    /// Default abort signal for every request.
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.defaults.signal = Some(signal);
        self
    }

    /// Lay `config` over the defaults collected so far.
    pub fn defaults(mut self, config: RequestConfig) -> Self {
        self.defaults = self.defaults.merge(&config);
        self
    }

    /// Replace the hyper transport.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Install a cookie jar, shared by all clones of the client.
    pub fn cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookie_jar = Some(Arc::new(RwLock::new(jar)));
        self
    }

    /// Install a cookie jar shared with the caller.
    pub fn shared_cookie_jar(mut self, jar: Arc<RwLock<CookieJar>>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    pub fn build(self) -> Client {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HyperTransport::new()));

        Client {
            defaults: Arc::new(RwLock::new(self.defaults)),
            interceptors: Arc::new(Interceptors::default()),
            transport,
            cookie_jar: self.cookie_jar,
        }
    }
}
