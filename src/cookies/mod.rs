//! Cookie parsing and storage.
//!
//! - [`Cookie`](canonicalcookie::Cookie): a name/value pair plus the fixed
//!   attribute set (`Expires`, `Max-Age`, `Path`, `Domain`, `Secure`,
//!   `HttpOnly`, `SameSite`, `Partitioned`, `SameParty`).
//! - [`CookieJar`](jar::CookieJar): ordered cookies parsed from raw
//!   `Cookie` / `Set-Cookie` strings, serialized back, and scoped to the
//!   host they were received from.
//! - [`CookieSource`](jar::CookieSource): the cookie context a request reads
//!   XSRF tokens and credentialed cookies from, filtered by request URL.
//!
//! ```rust
//! use fetchkit::cookies::jar::CookieJar;
//!
//! let mut jar = CookieJar::new();
//! jar.parse("sid=abc; Path=/; HttpOnly; theme=dark");
//! assert_eq!(jar.len(), 2);
//! assert_eq!(jar.request_header(), "sid=abc; theme=dark");
//! ```

pub mod canonicalcookie;
pub mod jar;

pub use canonicalcookie::{Cookie, CookieAttributes, SameSite};
pub use jar::{CookieJar, CookieSource};
