//! Flat, name-keyed cookie collection.

use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::{is_attribute, Cookie, CookieAttributes};
use http::header::{COOKIE, SET_COOKIE};
use http::HeaderMap;
use std::sync::{PoisonError, RwLock};
use time::OffsetDateTime;
use url::Url;

/// An ambient cookie context a request can read from.
///
/// Supplying one to the request builder is what enables XSRF header
/// injection and credentialed `Cookie` headers. Lookups are scoped to the
/// request URL: only cookies whose domain, path, `Secure` flag and expiry
/// allow it are returned.
pub trait CookieSource: Send + Sync {
    /// Value of the cookie called `name` that applies to `url`.
    fn cookie_value(&self, name: &str, url: &Url) -> Option<String>;

    /// `name=value; ...` string for a request `Cookie` header to `url`.
    fn cookie_header(&self, url: &Url) -> Option<String>;
}

/// Cookies in first-insertion order.
///
/// A cookie replaces an earlier one with the same name, domain and path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect cookies from the `Cookie` and every `Set-Cookie` header.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::new();

        if let Some(cookie) = headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            jar.parse(cookie);
        }

        let set_cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !set_cookies.is_empty() {
            jar.parse_all(set_cookies);
        }

        jar
    }

    /// Insert or replace the cookie called `name`.
    pub fn set(
        &mut self,
        name: &str,
        value: &str,
        attributes: CookieAttributes,
    ) -> Result<(), NetError> {
        if name.is_empty() {
            return Err(NetError::from_thrown("Name cannot be empty"));
        }
        self.insert(Cookie::new(name, value).with_attributes(attributes));
        Ok(())
    }

    /// Insert a cookie, replacing one in the same slot in place.
    pub fn insert(&mut self, cookie: Cookie) {
        if let Some(existing) = self.cookies.iter_mut().find(|c| c.same_slot(&cookie)) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Remove every cookie called `name`.
    pub fn delete(&mut self, name: &str) {
        self.cookies.retain(|c| c.name != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn all(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Copy every cookie of `other` into this jar as is.
    pub fn merge(&mut self, other: &CookieJar) {
        for cookie in other.iter() {
            self.insert(cookie.clone());
        }
    }

    /// Store the cookies of a response received from `url`.
    ///
    /// Each cookie is scoped to the response host (see
    /// [`Cookie::matches_url`]). A cookie whose `Domain` does not cover the
    /// host is dropped. An already expired cookie, e.g. `Max-Age=0`, evicts
    /// the stored cookie in its slot instead of being stored.
    pub fn store_response(&mut self, url: &Url, received: &CookieJar) {
        let now = OffsetDateTime::now_utc();

        for cookie in received.iter() {
            let mut cookie = cookie.clone();
            if !cookie.scope_to(url, now) {
                continue;
            }
            if cookie.is_expired(now) {
                tracing::trace!(cookie = %cookie.name, "evicting expired cookie");
                self.cookies.retain(|c| !c.same_slot(&cookie));
                continue;
            }
            self.insert(cookie);
        }

        self.cookies.retain(|c| !c.is_expired(now));
    }

    /// Cookies that may be sent to `url`, longest path first.
    pub fn matching(&self, url: &Url) -> Vec<&Cookie> {
        let now = OffsetDateTime::now_utc();
        let mut matched: Vec<&Cookie> = self
            .cookies
            .iter()
            .filter(|c| c.matches_url(url, now))
            .collect();

        let path_len = |c: &Cookie| c.attributes.path.as_deref().map_or(0, str::len);
        matched.sort_by(|a, b| path_len(b).cmp(&path_len(a)));
        matched
    }

    /// Serialize all cookies with their attributes, joined by `; `.
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(Cookie::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Serialize only the `name=value` pairs, joined by `; `.
    pub fn request_header(&self) -> String {
        self.cookies
            .iter()
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Parse one raw cookie string.
    ///
    /// The string is split on `;`. A part whose key is a recognized attribute
    /// applies to the current cookie; any other key starts a new cookie.
    pub fn parse(&mut self, raw: &str) {
        self.parse_parts(raw.split(';'));
    }

    /// Parse several raw strings (e.g. multiple `Set-Cookie` values) as one
    /// continuous sequence of parts.
    pub fn parse_all<'a, I>(&mut self, raws: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.parse_parts(raws.into_iter().flat_map(|raw| raw.split(';')));
    }

    /// Group parts into `name=value; attrs` segments and parse each one.
    fn parse_parts<'a, I>(&mut self, parts: I)
    where
        I: Iterator<Item = &'a str>,
    {
        let mut segment: Option<String> = None;

        for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
            let key = part.split_once('=').map_or(part, |(k, _)| k.trim());

            if is_attribute(key) {
                match segment.as_mut() {
                    Some(current) => {
                        current.push_str("; ");
                        current.push_str(part);
                    }
                    None => tracing::trace!(attribute = %key, "attribute with no cookie to attach to"),
                }
                continue;
            }

            if let Some(done) = segment.take() {
                self.insert(Cookie::parse(&done));
            }
            segment = Some(if part.contains('=') {
                part.to_string()
            } else {
                format!("{part}=")
            });
        }

        if let Some(done) = segment {
            self.insert(Cookie::parse(&done));
        }
    }
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str, url: &Url) -> Option<String> {
        self.matching(url)
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    fn cookie_header(&self, url: &Url) -> Option<String> {
        let matched = self.matching(url);
        if matched.is_empty() {
            return None;
        }
        Some(
            matched
                .into_iter()
                .map(Cookie::pair)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl CookieSource for RwLock<CookieJar> {
    fn cookie_value(&self, name: &str, url: &Url) -> Option<String> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookie_value(name, url)
    }

    fn cookie_header(&self, url: &Url) -> Option<String> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookie_header(url)
    }
}
