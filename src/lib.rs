//! # fetchkit
//!
//! An async HTTP client with axios-style ergonomics.
//!
//! `fetchkit` wraps a transport (HTTP/1.1 over hyper and BoringSSL by default)
//! with instance defaults, request/response interceptors, JSON request
//! bodies, content-type driven response decoding, cookie parsing, timeouts
//! and a single normalized error type.
//!
//! ## Features
//!
//! - **Instance defaults**: base URL, headers, timeout, credentials, auth
//! - **Interceptors**: ordered request and response chains with ejectable handles
//! - **Response decoding**: JSON, text, blob, array buffer and multipart form data
//! - **Cookies**: `Cookie` / `Set-Cookie` parsing and an optional client jar
//! - **Errors**: status, status phrase, decoded body and an extracted message
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fetchkit::{Client, NetError};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NetError> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")
//!         .build();
//!
//!     let created = client.post("/users", &json!({"name": "Ada"}), None).await?;
//!     println!("Status: {}", created.status());
//!
//!     match client.get("/users/404", None).await {
//!         Ok(resp) => println!("{:?}", resp.data()),
//!         Err(err) => println!("{:?} {}", err.status_msg(), err),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and status phrases
//! - [`client`] - The client and its builder
//! - [`cookies`] - Cookie parsing and the cookie jar
//! - [`http`] - Config, request building, interceptors, responses, transport
//! - [`socket`] - Connection setup for the default transport

pub mod base;
pub mod client;
pub mod cookies;
pub mod http;
pub mod socket;

pub use base::neterror::{ErrorKind, NetError, NetResult};
pub use client::{Client, ClientBuilder};
pub use cookies::{Cookie, CookieJar};
pub use crate::http::{RequestConfig, Response, ResponseData};
