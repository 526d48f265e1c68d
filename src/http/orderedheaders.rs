use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::collections::HashMap;
use std::str::FromStr;

/// A header map that preserves insertion order and original casing.
///
/// Lookups are case-insensitive. Inserting a key that already exists under a
/// different casing updates the value in place and keeps the first casing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedHeaderMap {
    headers: Vec<(String, String)>,
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Insert or update a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if let Some((_, v)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            *v = value;
        } else {
            self.headers.push((name, value));
        }
    }

    /// Insert only if no header with this name exists yet.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.headers.push((name, value.into()));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(idx).1)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Headers in insertion order with their original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Overlay `other` on top of `self`, key by key.
    ///
    /// Keys only in `self` keep their value and position; keys in `other`
    /// win on conflict; new keys are appended in `other`'s order.
    pub fn merge(&mut self, other: &OrderedHeaderMap) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Plain-mapping view keyed by lower-case name.
    pub fn to_map(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .map(|(n, v)| (n.to_ascii_lowercase(), v.clone()))
            .collect()
    }

    /// Convert to an `http::HeaderMap`, validating every name and value.
    /// `http::HeaderMap` preserves insertion order.
    pub fn to_header_map(&self) -> Result<HeaderMap, NetError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_str(name).map_err(|_| NetError::invalid_header(name))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| NetError::invalid_header(name))?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }

    /// Build from a transport header map. Non UTF-8 values are skipped.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }
        headers
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedHeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl From<HashMap<String, String>> for OrderedHeaderMap {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for OrderedHeaderMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}
