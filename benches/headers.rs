use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fetchkit::http::config::RequestConfig;
use fetchkit::http::orderedheaders::OrderedHeaderMap;
use fetchkit::http::request::RequestDescriptor;
use serde_json::json;

fn browser_like_headers() -> OrderedHeaderMap {
    OrderedHeaderMap::from([
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Encoding", "gzip, deflate, br"),
        ("Accept-Language", "en-GB,en;q=0.9"),
        ("Cache-Control", "max-age=0"),
        (
            "Cookie",
            "WMF-Last-Access=xxxxxxxxxxx; GeoIP=xxxxxxxxxxxxxxxxxxxxxxxxxxx; NetworkProbeLimit=0.001",
        ),
        ("X-Requested-With", "XMLHttpRequest"),
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36",
        ),
    ])
}

fn benchmark_headers_to_header_map(c: &mut Criterion) {
    let headers = browser_like_headers();

    c.bench_function("headers_to_header_map", |b| {
        b.iter(|| black_box(&headers).to_header_map())
    });
}

fn benchmark_headers_insert(c: &mut Criterion) {
    c.bench_function("headers_insert", |b| {
        b.iter(|| {
            let mut headers = OrderedHeaderMap::new();
            headers.insert("Accept", "text/html");
            headers.insert("User-Agent", "Mozilla/5.0");
            headers.insert("accept", "application/json");
            black_box(headers)
        })
    });
}

fn benchmark_config_merge(c: &mut Criterion) {
    let defaults = RequestConfig::new()
        .base_url("https://api.example.com")
        .headers(browser_like_headers());
    let overrides = RequestConfig::new()
        .url("/users")
        .header("authorization", "Bearer abc")
        .header("accept", "application/json");

    c.bench_function("config_merge", |b| {
        b.iter(|| black_box(&defaults).merge(black_box(&overrides)))
    });
}

fn benchmark_request_build(c: &mut Criterion) {
    let config = RequestConfig::new()
        .base_url("https://api.example.com")
        .url("/users")
        .headers(browser_like_headers())
        .param("page", 2)
        .param("q", "ada lovelace")
        .auth("user", "pass")
        .data(json!({"name": "Ada", "tags": ["math", "engines"]}));

    c.bench_function("request_build", |b| {
        b.iter(|| RequestDescriptor::build(black_box(&config), None))
    });
}

criterion_group!(
    benches,
    benchmark_headers_to_header_map,
    benchmark_headers_insert,
    benchmark_config_merge,
    benchmark_request_build
);
criterion_main!(benches);
