use bytes::Bytes;
use fetchkit::cookies::CookieJar;
use fetchkit::http::abort::AbortController;
use fetchkit::http::config::{Credentials, RequestConfig, ResponseType};
use fetchkit::http::errormessage::ErrorMessage;
use fetchkit::http::request::RequestDescriptor;
use fetchkit::http::transport::{RawResponse, Transport};
use fetchkit::{Client, ErrorKind, NetError, ResponseData};
use futures::future::BoxFuture;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderValue, Method, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Arc<dyn Fn(&RequestDescriptor) -> RawResponse + Send + Sync>;

/// Records every request and answers with `respond`.
#[derive(Clone)]
struct MockTransport {
    seen: Arc<Mutex<Vec<RequestDescriptor>>>,
    respond: Responder,
}

impl MockTransport {
    fn new<F>(respond: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> RawResponse + Send + Sync + 'static,
    {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    fn json(status: u16, body: &'static str) -> Self {
        Self::new(move |req| {
            RawResponse::new(StatusCode::from_u16(status).unwrap(), req.url().clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body)
        })
    }

    /// Echo the request body back as JSON.
    fn echo() -> Self {
        Self::new(|req| {
            RawResponse::new(StatusCode::OK, req.url().clone())
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(req.body().clone())
        })
    }

    fn requests(&self) -> Vec<RequestDescriptor> {
        self.seen.lock().unwrap().clone()
    }

    fn last(&self) -> RequestDescriptor {
        self.requests().pop().expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse, NetError>> {
        let response = (self.respond)(&request);
        self.seen.lock().unwrap().push(request);
        Box::pin(async move { Ok(response) })
    }
}

/// Never answers.
struct Unresponsive;

impl Transport for Unresponsive {
    fn send(&self, _request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse, NetError>> {
        Box::pin(futures::future::pending())
    }
}

fn client_with(transport: MockTransport) -> Client {
    Client::builder()
        .base_url("https://api.example.com")
        .transport(transport)
        .build()
}

#[tokio::test]
async fn test_defaults_merge_with_request_headers() {
    let transport = MockTransport::json(200, "{}");
    let client = Client::builder()
        .base_url("https://api.example.com")
        .header("x-app", "demo")
        .transport(transport.clone())
        .build();

    let config = RequestConfig::new().header("Accept", "text/plain").header("x-trace", "7");
    client.get("/users", Some(config)).await.unwrap();

    let req = transport.last();
    assert_eq!(req.headers()["accept"], "text/plain");
    assert_eq!(req.headers()["x-app"], "demo");
    assert_eq!(req.headers()["x-trace"], "7");
    assert_eq!(req.method(), Method::GET);

    // defaults untouched by the per-request override
    assert_eq!(client.defaults().headers.get("accept"), Some("application/json"));
}

#[tokio::test]
async fn test_base_url_plus_path() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client.get("/users", None).await.unwrap();
    assert_eq!(transport.last().url().as_str(), "https://api.example.com/users");
}

#[tokio::test]
async fn test_bypass_base_url() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    let config = RequestConfig::new().bypass_base_url(true);
    client.get("https://otherapi.com/", Some(config)).await.unwrap();
    assert_eq!(transport.last().url().as_str(), "https://otherapi.com/");
}

#[tokio::test]
async fn test_params_are_appended() {
    let transport = MockTransport::json(200, "[]");
    let client = client_with(transport.clone());

    let config = RequestConfig::new().param("id", 1).param("name", "John");
    client.get("/users", Some(config)).await.unwrap();
    assert_eq!(
        transport.last().url().as_str(),
        "https://api.example.com/users?id=1&name=John"
    );
}

#[tokio::test]
async fn test_no_content_has_no_data() {
    let transport = MockTransport::new(|req| RawResponse::new(StatusCode::NO_CONTENT, req.url().clone()));
    let client = client_with(transport);

    let resp = client.delete("/users/1", None).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.data().is_none());
}

#[tokio::test]
async fn test_declared_text_decodes_json_body() {
    let transport = MockTransport::json(200, r#"{"a":1}"#);
    let client = client_with(transport);

    let config = RequestConfig::new().response_type(ResponseType::Text);
    let resp = client.get("/a", Some(config)).await.unwrap();
    assert_eq!(resp.data(), Some(&ResponseData::Json(json!({"a": 1}))));
}

#[tokio::test]
async fn test_unknown_content_type_decodes_as_text() {
    let transport = MockTransport::new(|req| {
        RawResponse::new(StatusCode::OK, req.url().clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/x-custom"))
            .body("raw")
    });
    let client = client_with(transport);

    let resp = client.get("/raw", None).await.unwrap();
    assert_eq!(resp.data().and_then(|d| d.as_text()), Some("raw"));
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let transport = MockTransport::json(200, "{not json");
    let client = client_with(transport);

    let err = client.get("/broken", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(err.status(), Some(200));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_rejects_with_message() {
    let client = Client::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_millis(2000))
        .transport(Unresponsive)
        .build();

    let err = client.get("/slow", None).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(
        err.message(),
        "Request timed out after server failed to respond after 2000ms"
    );
    assert_eq!(err.status(), Some(408));
    assert_eq!(
        err.data().and_then(|d| d.as_text()),
        Some("Request timed out after server failed to respond after 2000ms")
    );
}

#[tokio::test(start_paused = true)]
async fn test_per_request_timeout_overrides_default() {
    let client = Client::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(30))
        .transport(Unresponsive)
        .build();

    let config = RequestConfig::new().timeout(Duration::from_millis(150));
    let err = client.get("/slow", Some(config)).await.unwrap_err();
    assert_eq!(
        err.message(),
        "Request timed out after server failed to respond after 150ms"
    );
}

#[tokio::test]
async fn test_not_found_error_shape() {
    let transport = MockTransport::json(404, r#"{"error":"Not Found"}"#);
    let client = client_with(transport);

    let err = client.get("/missing", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Response);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.status_msg(), Some("404 NOT FOUND"));
    assert_eq!(err.message(), "Not Found");
    assert_eq!(
        err.data().and_then(|d| d.as_json()),
        Some(&json!({"error": "Not Found"}))
    );
}

#[tokio::test]
async fn test_custom_error_message() {
    let transport = MockTransport::json(422, r#"{"errors":["name is required"]}"#);
    let client = Client::builder()
        .base_url("https://api.example.com")
        .error_message(ErrorMessage::custom(|resp| {
            format!("validation failed ({})", resp.status().as_u16())
        }))
        .transport(transport)
        .build();

    let err = client.post("/users", &json!({}), None).await.unwrap_err();
    assert_eq!(err.message(), "validation failed (422)");
}

#[tokio::test]
async fn test_error_without_message_falls_back() {
    let transport = MockTransport::new(|req| RawResponse::new(StatusCode::BAD_GATEWAY, req.url().clone()));
    let client = client_with(transport);

    let err = client.get("/", None).await.unwrap_err();
    assert_eq!(err.message(), "502 BAD GATEWAY");
    assert_eq!(err.status_msg(), Some("502 BAD GATEWAY"));
}

#[tokio::test]
async fn test_request_interceptors_run_in_order() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client.interceptors().request.use_fn(|config: RequestConfig| async move {
        Ok(config.header("x-order", "first"))
    });
    client.interceptors().request.use_fn(|config: RequestConfig| async move {
        let seen = config.headers.get("x-order").unwrap_or_default().to_string();
        Ok(config.header("x-order", format!("{seen},second")))
    });

    client.get("/", None).await.unwrap();
    assert_eq!(transport.last().headers()["x-order"], "first,second");
}

#[tokio::test]
async fn test_ejected_interceptor_is_skipped() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    let handle = client.interceptors().request.use_fn(|config: RequestConfig| async move {
        Ok(config.header("x-ejected", "1"))
    });
    client.interceptors().request.use_fn(|config: RequestConfig| async move {
        Ok(config.header("x-kept", "1"))
    });
    client.interceptors().request.eject(handle);

    client.get("/", None).await.unwrap();
    let req = transport.last();
    assert!(req.headers().get("x-ejected").is_none());
    assert_eq!(req.headers()["x-kept"], "1");
    assert_eq!(client.interceptors().request.len(), 1);
}

#[tokio::test]
async fn test_request_interceptor_error_stops_dispatch() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client
        .interceptors()
        .request
        .use_fn(|_config: RequestConfig| async move { Err(NetError::from("Invalid URL")) });

    let err = client.get("/", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interceptor);
    assert_eq!(err.message(), "Invalid URL");
    assert!(err.response().is_none());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_rejection_handler_recovers() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client.interceptors().request.use_with_rejection(
        |_config: RequestConfig| async move { Err(NetError::from("nope")) },
        |_err: NetError| async move {
            Ok(RequestConfig::new()
                .base_url("https://fallback.example.com")
                .url("/recovered")
                .header("x-recovered", "yes"))
        },
    );

    client.get("/", None).await.unwrap();
    let req = transport.last();
    assert_eq!(req.url().as_str(), "https://fallback.example.com/recovered");
    assert_eq!(req.headers()["x-recovered"], "yes");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_response_interceptor_transforms_data() {
    let transport = MockTransport::json(200, r#"{"value":1}"#);
    let client = client_with(transport);

    client.interceptors().response.use_fn(|mut resp: fetchkit::Response| async move {
        *resp.data_mut() = Some(ResponseData::Json(json!({"wrapped": true})));
        Ok(resp)
    });

    let resp = client.get("/", None).await.unwrap();
    assert_eq!(resp.data().and_then(|d| d.as_json()), Some(&json!({"wrapped": true})));
}

#[tokio::test]
async fn test_response_interceptor_sees_error_response() {
    let transport = MockTransport::json(500, r#"{"message":"boom"}"#);
    let client = client_with(transport);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    client.interceptors().response.use_fn(move |resp: fetchkit::Response| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(resp)
        }
    });

    let err = client.get("/", None).await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.message(), "boom");
    assert_eq!(err.response().unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_post_json_round_trip() {
    let transport = MockTransport::echo();
    let client = client_with(transport.clone());

    let payload = json!({"name": "Ada", "langs": ["en", "fr"]});
    let resp = client.post("/users", &payload, None).await.unwrap();

    let req = transport.last();
    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.headers()["content-type"], "application/json");
    assert_eq!(resp.data().and_then(|d| d.as_json()), Some(&payload));

    let typed: Value = resp.data_as().unwrap();
    assert_eq!(typed["name"], "Ada");
}

#[tokio::test]
async fn test_put_and_patch_methods() {
    let transport = MockTransport::echo();
    let client = client_with(transport.clone());

    client.put("/users/1", &json!({"a": 1}), None).await.unwrap();
    assert_eq!(transport.last().method(), Method::PUT);

    client.patch("/users/1", &json!({"a": 2}), None).await.unwrap();
    assert_eq!(transport.last().method(), Method::PATCH);
    assert_eq!(transport.last().body(), &Bytes::from_static(br#"{"a":2}"#));
}

#[tokio::test]
async fn test_set_auth_header_applies_to_later_requests() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client.set_auth_header("t0k", true);
    client.get("/me", None).await.unwrap();
    assert_eq!(transport.last().headers()["authorization"], "Bearer t0k");
}

#[tokio::test]
async fn test_basic_auth() {
    let transport = MockTransport::json(200, "{}");
    let client = Client::builder()
        .base_url("https://api.example.com")
        .auth("user", "pass")
        .transport(transport.clone())
        .build();

    client.get("/", None).await.unwrap();
    assert_eq!(transport.last().headers()["authorization"], "Basic dXNlcjpwYXNz");
}

#[tokio::test]
async fn test_cookie_jar_round_trip() {
    let transport = MockTransport::new(|req| {
        RawResponse::new(StatusCode::OK, req.url().clone())
            .header(SET_COOKIE, HeaderValue::from_static("sid=abc; Path=/; HttpOnly"))
            .header(SET_COOKIE, HeaderValue::from_static("XSRF-TOKEN=x1; Path=/"))
    });
    let client = Client::builder()
        .base_url("https://api.example.com")
        .xsrf("XSRF-TOKEN", "X-XSRF-TOKEN")
        .cookie_jar(CookieJar::new())
        .transport(transport.clone())
        .build();

    let first = client.get("/login", None).await.unwrap();
    assert_eq!(first.cookies().get("sid").unwrap().value, "abc");
    assert!(transport.last().headers().get("cookie").is_none());

    client.get("/profile", None).await.unwrap();
    let req = transport.last();
    assert_eq!(req.headers()["cookie"], "sid=abc; XSRF-TOKEN=x1");
    assert_eq!(req.headers()["x-xsrf-token"], "x1");
}

#[tokio::test]
async fn test_cookies_and_xsrf_stay_on_their_origin() {
    let transport = MockTransport::new(|req| {
        let mut raw = RawResponse::new(StatusCode::OK, req.url().clone());
        if req.url().path() == "/login" {
            raw = raw
                .header(
                    SET_COOKIE,
                    HeaderValue::from_static(
                        "sid=secret; Domain=api.example.com; Path=/; Secure; HttpOnly",
                    ),
                )
                .header(SET_COOKIE, HeaderValue::from_static("XSRF-TOKEN=x1"));
        }
        raw
    });
    let client = Client::builder()
        .base_url("https://api.example.com")
        .xsrf("XSRF-TOKEN", "X-XSRF-TOKEN")
        .cookie_jar(CookieJar::new())
        .transport(transport.clone())
        .build();

    client.get("/login", None).await.unwrap();

    for credentials in [Credentials::SameOrigin, Credentials::Include] {
        client
            .get(
                "http://evil.example.org/collect",
                Some(RequestConfig::new().bypass_base_url(true).credentials(credentials)),
            )
            .await
            .unwrap();
        let req = transport.last();
        assert_eq!(req.url().host_str(), Some("evil.example.org"));
        assert!(req.headers().get("cookie").is_none());
        assert!(req.headers().get("x-xsrf-token").is_none());
    }

    client.get("/me", None).await.unwrap();
    let req = transport.last();
    assert_eq!(req.headers()["cookie"], "sid=secret; XSRF-TOKEN=x1");
    assert_eq!(req.headers()["x-xsrf-token"], "x1");
}

#[tokio::test]
async fn test_logout_cookie_evicts_session() {
    let transport = MockTransport::new(|req| {
        let cookie = match req.url().path() {
            "/login" => "sid=abc; Path=/",
            "/logout" => "sid=; Path=/; Max-Age=0",
            _ => return RawResponse::new(StatusCode::OK, req.url().clone()),
        };
        RawResponse::new(StatusCode::OK, req.url().clone())
            .header(SET_COOKIE, HeaderValue::from_static(cookie))
    });
    let client = Client::builder()
        .base_url("https://api.example.com")
        .cookie_jar(CookieJar::new())
        .transport(transport.clone())
        .build();

    client.get("/login", None).await.unwrap();
    client.get("/logout", None).await.unwrap();
    assert_eq!(transport.last().headers()["cookie"], "sid=abc");

    client.get("/me", None).await.unwrap();
    assert!(transport.last().headers().get("cookie").is_none());
}

#[tokio::test]
async fn test_omit_credentials_skips_cookies() {
    let transport = MockTransport::json(200, "{}");
    let mut jar = CookieJar::new();
    jar.parse("sid=abc");
    let client = Client::builder()
        .base_url("https://api.example.com")
        .credentials(Credentials::Omit)
        .cookie_jar(jar)
        .transport(transport.clone())
        .build();

    client.get("/", None).await.unwrap();
    assert!(transport.last().headers().get("cookie").is_none());
}

#[tokio::test]
async fn test_xsrf_without_jar_is_skipped() {
    let transport = MockTransport::json(200, "{}");
    let client = Client::builder()
        .base_url("https://api.example.com")
        .xsrf("XSRF-TOKEN", "X-XSRF-TOKEN")
        .transport(transport.clone())
        .build();

    client.get("/", None).await.unwrap();
    assert!(transport.last().headers().get("x-xsrf-token").is_none());
}

#[tokio::test]
async fn test_already_aborted_signal() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    let controller = AbortController::new();
    controller.abort("user navigated away");

    let config = RequestConfig::new().signal(controller.signal());
    let err = client.get("/", Some(config)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert_eq!(err.message(), "user navigated away");
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abort_in_flight() {
    let client = Client::builder()
        .base_url("https://api.example.com")
        .transport(Unresponsive)
        .build();

    let controller = AbortController::new();
    let config = RequestConfig::new().signal(controller.signal());

    let request = tokio::spawn({
        let client = client.clone();
        async move { client.get("/slow", Some(config)).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.abort("cancelled");

    let err = request.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
}

#[tokio::test(start_paused = true)]
async fn test_abort_wins_over_pending_timeout() {
    let client = Client::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .transport(Unresponsive)
        .build();

    let controller = AbortController::new();
    let config = RequestConfig::new().signal(controller.signal());

    let request = tokio::spawn({
        let client = client.clone();
        async move { client.get("/slow", Some(config)).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.abort("stop");

    let err = request.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert!(!err.is_timeout());
}
