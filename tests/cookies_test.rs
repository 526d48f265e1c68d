use fetchkit::cookies::{CookieAttributes, CookieJar, CookieSource, SameSite};
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use url::Url;

#[test]
fn test_parse_and_serialize() {
    let mut jar = CookieJar::new();
    jar.parse("foo=bar; Path=/; HttpOnly");

    assert_eq!(jar.len(), 1);
    let cookie = jar.get("foo").unwrap();
    assert_eq!(cookie.value, "bar");
    assert_eq!(cookie.attributes.path.as_deref(), Some("/"));
    assert!(cookie.attributes.http_only);
    assert_eq!(jar.header(), "foo=bar; Path=/; HttpOnly");
}

#[test]
fn test_attributes_bind_to_preceding_cookie() {
    let mut jar = CookieJar::new();
    jar.parse("a=1; Secure; b=2; Max-Age=60; SameSite=lax");

    let a = jar.get("a").unwrap();
    let b = jar.get("b").unwrap();
    assert!(a.attributes.secure);
    assert_eq!(a.attributes.max_age, None);
    assert!(!b.attributes.secure);
    assert_eq!(b.attributes.max_age, Some(60));
    assert_eq!(b.attributes.same_site, Some(SameSite::Lax));
}

#[test]
fn test_leading_attribute_is_dropped() {
    let mut jar = CookieJar::new();
    jar.parse("Path=/; id=7");

    assert_eq!(jar.len(), 1);
    assert_eq!(jar.get("id").unwrap().value, "7");
    assert!(jar.get("Path").is_none());
}

#[test]
fn test_value_may_contain_equals() {
    let mut jar = CookieJar::new();
    jar.parse("token=abc==; Path=/");
    assert_eq!(jar.get("token").unwrap().value, "abc==");
}

#[test]
fn test_same_name_replaces() {
    let mut jar = CookieJar::new();
    jar.parse("theme=light; lang=en");
    jar.parse("theme=dark");

    assert_eq!(jar.len(), 2);
    assert_eq!(jar.request_header(), "theme=dark; lang=en");
}

#[test]
fn test_from_response_headers() {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, HeaderValue::from_static("sid=xyz; HttpOnly"));
    headers.append(SET_COOKIE, HeaderValue::from_static("pref=1; Max-Age=10"));

    let jar = CookieJar::from_headers(&headers);
    assert_eq!(jar.len(), 2);
    assert!(jar.get("sid").unwrap().attributes.http_only);
    assert_eq!(jar.get("pref").unwrap().attributes.max_age, Some(10));
}

#[test]
fn test_from_request_cookie_header() {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("a=1; b=2"));

    let jar = CookieJar::from_headers(&headers);
    assert_eq!(jar.request_header(), "a=1; b=2");
}

#[test]
fn test_set_rejects_empty_name() {
    let mut jar = CookieJar::new();
    let err = jar.set("", "v", CookieAttributes::default()).unwrap_err();
    assert_eq!(err.message(), "Name cannot be empty");
    assert!(jar.is_empty());
}

#[test]
fn test_set_and_delete() {
    let mut jar = CookieJar::new();
    let attrs = CookieAttributes {
        path: Some("/app".into()),
        secure: true,
        ..Default::default()
    };
    jar.set("session", "s1", attrs).unwrap();
    assert_eq!(jar.header(), "session=s1; Path=/app; Secure");

    jar.delete("session");
    assert!(jar.is_empty());
    assert_eq!(jar.cookie_header(&Url::parse("https://example.com/app").unwrap()), None);
}

#[test]
fn test_cookie_source_lookup() {
    let mut jar = CookieJar::new();
    jar.parse("XSRF-TOKEN=t0k3n; Path=/");
    let url = Url::parse("https://example.com/page").unwrap();

    assert_eq!(jar.cookie_value("XSRF-TOKEN", &url).as_deref(), Some("t0k3n"));
    assert_eq!(jar.cookie_value("missing", &url), None);
    assert_eq!(jar.cookie_header(&url).as_deref(), Some("XSRF-TOKEN=t0k3n"));
}

#[test]
fn test_cookie_source_respects_path_and_secure() {
    let mut jar = CookieJar::new();
    jar.parse("admin=1; Path=/admin; Secure; open=1");

    let admin = Url::parse("https://example.com/admin/users").unwrap();
    assert_eq!(jar.cookie_header(&admin).as_deref(), Some("admin=1; open=1"));

    let plain = Url::parse("http://example.com/admin/users").unwrap();
    assert_eq!(jar.cookie_header(&plain).as_deref(), Some("open=1"));

    let elsewhere = Url::parse("https://example.com/home").unwrap();
    assert_eq!(jar.cookie_value("admin", &elsewhere), None);
}
