use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::params::{QueryParams, QueryValue};

/// Insertion-ordered header set where `None` marks an explicit absence.
///
/// Layers merge last-writer-wins per name (ASCII case-insensitive). Entries
/// whose final value is `None` are dropped when the set is handed to the
/// transport; they are never sent with an empty placeholder.
#[derive(Clone, Debug, Default)]
pub struct Headers(Vec<(String, Option<String>)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing entry with the same name.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name.into(), Some(value.into()));
        self
    }

    /// Record an explicit absence for `name`; the header is stripped before
    /// dispatch even if a lower layer set it.
    pub fn unset(mut self, name: impl Into<String>) -> Self {
        self.put(name.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_deref())
    }

    fn put(&mut self, name: String, value: Option<String>) {
        match self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some(index) => self.0[index].1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Layer `overrides` on top of `self`; `overrides` wins on name collision.
    pub(crate) fn merge(mut self, overrides: &Headers) -> Headers {
        for (name, value) in &overrides.0 {
            self.put(name.clone(), value.clone());
        }
        self
    }

    /// Drop explicit absences and build the transport header map.
    pub(crate) fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();

        for (name, value) in &self.0 {
            let Some(value) = value else { continue };

            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader { name: name.clone() })?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidHeader { name: name.clone() })?;
            map.insert(header, value);
        }

        Ok(map)
    }
}

/// Method, path, query parameters, headers, and body for one call. Built per
/// call, never retained.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    pub method: Method,
    /// Path relative to the configured host.
    pub url: String,
    pub params: QueryParams,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: QueryParams::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push(key, value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = self.headers.set(name, value);
        self
    }

    /// Mark a header as explicitly absent for this call.
    pub fn without_header(mut self, name: impl Into<String>) -> Self {
        self.headers = self.headers.unset(name);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
