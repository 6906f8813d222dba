//! Concrete, transport-ready request values.

use crate::{MoyaError, Result};
use bytes::Bytes;
use http::{header::HeaderName, HeaderMap, HeaderValue, Method};
use std::collections::HashMap;
use url::Url;

/// A fully resolved HTTP request.
///
/// Produced by [`Endpoint::url_request`](crate::Endpoint::url_request) and
/// handed to a [`Transport`](crate::Transport). `body` is `None` when the task
/// attaches no body at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,

    /// The absolute URL, including any encoded query parameters.
    pub url: Url,

    /// Request headers.
    pub headers: HeaderMap,

    /// The request body.
    pub body: Option<Bytes>,
}

impl Request {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Inserts every header from a string map, replacing existing values.
    ///
    /// Fields are applied in name order, so when two names differ only in
    /// case the outcome does not depend on map iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`MoyaError::Underlying`] if a header name or value is invalid.
    pub fn with_header_fields(mut self, fields: &HashMap<String, String>) -> Result<Self> {
        let mut fields: Vec<(&String, &String)> = fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in fields {
            let name = HeaderName::try_from(name.as_str()).map_err(MoyaError::underlying)?;
            let value = HeaderValue::try_from(value.as_str()).map_err(MoyaError::underlying)?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Sets a header only if the request does not already carry it.
    pub fn set_header_if_absent(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.headers.contains_key(&name) {
            self.headers.insert(name, value);
        }
    }

    /// Layers transport-wide default headers underneath this request's own.
    ///
    /// Headers already on the request win; defaults only fill gaps.
    pub fn merge_default_headers(&mut self, defaults: &HeaderMap) {
        for name in defaults.keys() {
            if self.headers.contains_key(name) {
                continue;
            }
            for value in defaults.get_all(name) {
                self.headers.append(name.clone(), value.clone());
            }
        }
    }

    /// Appends an already percent-encoded query string to the URL.
    ///
    /// Existing query components are kept and joined with `&`.
    pub fn append_query(&mut self, encoded: &str) {
        if encoded.is_empty() {
            return;
        }
        let query = match self.url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded.to_string(),
        };
        self.url.set_query(Some(&query));
    }

    /// Decoded query pairs in URL order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect()
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl From<Request> for reqwest::Request {
    fn from(request: Request) -> Self {
        let mut converted = reqwest::Request::new(request.method, request.url);
        *converted.headers_mut() = request.headers;
        if let Some(body) = request.body {
            *converted.body_mut() = Some(reqwest::Body::from(body));
        }
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};

    fn request(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).unwrap())
    }

    #[test]
    fn test_append_query_to_empty_url() {
        let mut req = request("https://api.example.com/search");
        req.append_query("q=cats");
        assert_eq!(req.url.as_str(), "https://api.example.com/search?q=cats");
    }

    #[test]
    fn test_append_query_keeps_existing() {
        let mut req = request("https://api.example.com/search?page=2");
        req.append_query("q=cats");
        assert_eq!(
            req.query_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "cats".to_string())
            ]
        );
    }

    #[test]
    fn test_append_empty_query_is_noop() {
        let mut req = request("https://api.example.com/search");
        req.append_query("");
        assert_eq!(req.url.query(), None);
    }

    #[test]
    fn test_merge_default_headers_request_wins() {
        let mut req = request("https://api.example.com");
        req.headers
            .insert(USER_AGENT, HeaderValue::from_static("target/1.0"));

        let mut defaults = HeaderMap::new();
        defaults.insert(USER_AGENT, HeaderValue::from_static("moya"));
        defaults.insert(ACCEPT, HeaderValue::from_static("*/*"));

        req.merge_default_headers(&defaults);

        assert_eq!(req.header("user-agent"), Some("target/1.0"));
        assert_eq!(req.header("accept"), Some("*/*"));
    }

    #[test]
    fn test_invalid_header_name_is_underlying() {
        let mut fields = HashMap::new();
        fields.insert("bad header".to_string(), "x".to_string());

        let result = request("https://api.example.com").with_header_fields(&fields);
        assert!(matches!(result, Err(MoyaError::Underlying(_, None))));
    }

    #[test]
    fn test_header_fields_differing_in_case_are_deterministic() {
        for _ in 0..50 {
            let mut fields = HashMap::new();
            fields.insert("X-Token".to_string(), "upper".to_string());
            fields.insert("x-token".to_string(), "lower".to_string());

            let req = request("https://api.example.com")
                .with_header_fields(&fields)
                .unwrap();
            assert_eq!(req.header("x-token"), Some("lower"));
            assert_eq!(req.headers.get_all("x-token").iter().count(), 1);
        }
    }

    #[test]
    fn test_set_header_if_absent() {
        let mut req = request("https://api.example.com");
        req.set_header_if_absent(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        req.set_header_if_absent(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_into_reqwest_request() {
        let mut req = Request::new(
            Method::POST,
            Url::parse("https://api.example.com/users").unwrap(),
        );
        req.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        req.body = Some(Bytes::from_static(b"{}"));

        let converted: reqwest::Request = req.into();
        assert_eq!(converted.method(), &Method::POST);
        assert_eq!(converted.url().as_str(), "https://api.example.com/users");
        assert_eq!(converted.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            converted.body().and_then(|b| b.as_bytes()),
            Some(&b"{}"[..])
        );
    }
}
