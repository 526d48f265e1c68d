use std::fmt;
use std::str::FromStr;
use time::format_description::StaticFormatDescription;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use url::Url;

/// Attribute names recognized inside a cookie string, in serialization order.
pub const ATTRIBUTE_NAMES: [&str; 9] = [
    "Expires",
    "Max-Age",
    "Path",
    "Domain",
    "Secure",
    "HttpOnly",
    "SameSite",
    "Partitioned",
    "SameParty",
];

/// IMF-fixdate, the layout `Expires` is serialized in.
const EXPIRES_FORMAT: StaticFormatDescription = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Represents a cookie together with its recognized attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
    /// Set when the cookie was stored from a response without a `Domain`;
    /// it then only matches that exact host.
    pub host_only: bool,
    /// Absolute expiry, fixed when the cookie is stored from a response.
    pub expiry: Option<OffsetDateTime>,
}

/// The fixed attribute set a cookie may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub expires: Option<OffsetDateTime>,
    /// Seconds until expiry.
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub partitioned: bool,
    pub same_party: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("strict") {
            Ok(SameSite::Strict)
        } else if s.eq_ignore_ascii_case("lax") {
            Ok(SameSite::Lax)
        } else if s.eq_ignore_ascii_case("none") {
            Ok(SameSite::None)
        } else {
            Err(())
        }
    }
}

impl From<cookie::SameSite> for SameSite {
    fn from(value: cookie::SameSite) -> Self {
        match value {
            cookie::SameSite::Strict => SameSite::Strict,
            cookie::SameSite::Lax => SameSite::Lax,
            cookie::SameSite::None => SameSite::None,
        }
    }
}

/// Whether `key` names one of [`ATTRIBUTE_NAMES`], ignoring case.
pub fn is_attribute(key: &str) -> bool {
    ATTRIBUTE_NAMES.iter().any(|name| name.eq_ignore_ascii_case(key))
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Parse one `name=value; Attr; Attr=value` segment.
    ///
    /// Attribute values come from [`cookie::Cookie::parse`]; `SameParty` is
    /// not known to it and is picked up here.
    pub fn parse(segment: &str) -> Self {
        let same_party = segment
            .split(';')
            .skip(1)
            .any(|attr| attr.trim().eq_ignore_ascii_case("SameParty"));

        let parsed = match cookie::Cookie::parse(segment.to_string()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::trace!(%segment, error = %e, "cookie segment rejected by parser");
                let (name, value) = segment
                    .split(';')
                    .next()
                    .and_then(|pair| pair.split_once('='))
                    .unwrap_or((segment, ""));
                return Cookie::new(name.trim(), value.trim());
            }
        };

        let attributes = CookieAttributes {
            expires: parsed.expires_datetime(),
            max_age: parsed.max_age().map(|age| age.whole_seconds()),
            path: parsed.path().map(str::to_string),
            domain: parsed.domain().map(str::to_string),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site: parsed.same_site().map(SameSite::from),
            partitioned: parsed.partitioned().unwrap_or(false),
            same_party,
        };
        Cookie::new(parsed.name(), parsed.value()).with_attributes(attributes)
    }

    /// The `Expires` attribute, if it was a valid HTTP date.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.attributes.expires
    }

    /// `name=value` pair as sent in a request `Cookie` header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Fix the scope of a cookie received from `url`.
    ///
    /// A missing `Domain` makes the cookie host-only. `Max-Age` is turned
    /// into an absolute expiry relative to `now` and wins over `Expires`.
    /// Returns `false` when the `Domain` does not cover the response host.
    pub(crate) fn scope_to(&mut self, url: &Url, now: OffsetDateTime) -> bool {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        match self.attributes.domain.take() {
            Some(domain) => {
                let domain = domain.trim_start_matches('.').to_ascii_lowercase();
                if !domain_matches(&domain, &host, false) {
                    tracing::trace!(cookie = %self.name, %domain, %host, "domain does not cover host");
                    return false;
                }
                self.attributes.domain = Some(domain);
                self.host_only = false;
            }
            None => {
                self.attributes.domain = Some(host);
                self.host_only = true;
            }
        }

        self.expiry = match self.attributes.max_age {
            Some(secs) => Some(
                now.checked_add(Duration::seconds(secs))
                    .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc()),
            ),
            None => self.attributes.expires,
        };
        true
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match (self.expiry, self.attributes.max_age) {
            (Some(at), _) => at <= now,
            (None, Some(secs)) => secs <= 0,
            (None, None) => self.attributes.expires.is_some_and(|at| at <= now),
        }
    }

    /// Whether this cookie may be sent with a request to `url`.
    ///
    /// A cookie without a `Domain` that was never stored from a response
    /// matches every host. `Path` is prefix matched and `Secure` requires
    /// https.
    pub fn matches_url(&self, url: &Url, now: OffsetDateTime) -> bool {
        let host = url.host_str().unwrap_or_default();
        if let Some(domain) = &self.attributes.domain {
            if !domain_matches(domain, host, self.host_only) {
                return false;
            }
        }
        if let Some(path) = &self.attributes.path {
            if !path_matches(path, url.path()) {
                return false;
            }
        }
        if self.attributes.secure && url.scheme() != "https" {
            return false;
        }
        !self.is_expired(now)
    }

    /// Same name, domain and path: a later cookie replaces an earlier one.
    pub(crate) fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name
            && self.attributes.domain == other.attributes.domain
            && self.attributes.path == other.attributes.path
    }
}

/// RFC 6265 domain matching. Host-only cookies need an exact match.
fn domain_matches(cookie_domain: &str, host: &str, host_only: bool) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.');
    if host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }
    if host_only || cookie_domain.is_empty() {
        return false;
    }

    let host = host.to_ascii_lowercase();
    host.strip_suffix(&cookie_domain.to_ascii_lowercase())
        .is_some_and(|rest| rest.ends_with('.'))
}

/// RFC 6265 path matching.
fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    match request_path.strip_prefix(cookie_path) {
        Some(rest) => cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

impl fmt::Display for Cookie {
    /// Full serialization including attributes, e.g. `id=1; Path=/; Secure`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;

        let attrs = &self.attributes;
        if let Some(expires) = attrs.expires {
            let expires = expires
                .to_offset(time::UtcOffset::UTC)
                .format(EXPIRES_FORMAT)
                .map_err(|_| fmt::Error)?;
            write!(f, "; Expires={expires}")?;
        }
        if let Some(max_age) = attrs.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if let Some(path) = &attrs.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &attrs.domain {
            write!(f, "; Domain={domain}")?;
        }
        if attrs.secure {
            f.write_str("; Secure")?;
        }
        if attrs.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(same_site) = attrs.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }
        if attrs.partitioned {
            f.write_str("; Partitioned")?;
        }
        if attrs.same_party {
            f.write_str("; SameParty")?;
        }
        Ok(())
    }
}
