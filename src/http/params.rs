//! Query parameters and their serialization.

use std::fmt;
use std::sync::Arc;

/// Ordered query parameters.
///
/// Keys may repeat; serialization keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization, e.g. `id=1&name=John`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Caller-supplied replacement for the default query serializer.
///
/// The returned string is appended to the URL's query as-is.
#[derive(Clone)]
pub struct ParamsSerializer(Arc<dyn Fn(&Params) -> String + Send + Sync>);

impl ParamsSerializer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Params) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn serialize(&self, params: &Params) -> String {
        (self.0)(params)
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamsSerializer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_serialization_keeps_order() {
        let params: Params = [("id", "1"), ("name", "John")].into_iter().collect();
        assert_eq!(params.to_query_string(), "id=1&name=John");
    }

    #[test]
    fn test_percent_encoding() {
        let mut params = Params::new();
        params.insert("q", "a b&c");
        params.insert("page", 2);
        assert_eq!(params.to_query_string(), "q=a+b%26c&page=2");
    }

    #[test]
    fn test_empty() {
        assert_eq!(Params::new().to_query_string(), "");
    }

    #[test]
    fn test_custom_serializer() {
        let serializer = ParamsSerializer::new(|p: &Params| {
            p.iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(",")
        });
        let params: Params = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(serializer.serialize(&params), "a:1,b:2");
    }
}
