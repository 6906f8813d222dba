//! Response value handed back by a transport.
//!
//! The [`Response`] type keeps the raw body bytes together with the status
//! code, headers and the request that produced it, so that status validation
//! and error reporting never need to go back to the transport.

use crate::Request;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// A raw HTTP response.
///
/// # Examples
///
/// ```
/// use moya::Response;
/// use http::StatusCode;
///
/// let response = Response::new(StatusCode::OK, r#"{"id":1}"#);
///
/// assert_eq!(response.status_code, StatusCode::OK);
/// assert_eq!(&response.data[..], br#"{"id":1}"#);
/// assert!(response.request.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code of the response.
    pub status_code: StatusCode,

    /// The raw response body.
    pub data: Bytes,

    /// The response headers.
    pub headers: HeaderMap,

    /// The request that produced this response, when the transport knows it.
    pub request: Option<Request>,
}

impl Response {
    /// Creates a response with no headers and no originating request.
    pub fn new(status_code: StatusCode, data: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            data: data.into(),
            headers: HeaderMap::new(),
            request: None,
        }
    }

    /// Attaches response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches the originating request.
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Returns a reference to a header value by name.
    ///
    /// # Examples
    ///
    /// ```
    /// # use moya::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("application/json"));
    ///
    /// let response = Response::new(StatusCode::OK, "{}").with_headers(headers);
    ///
    /// assert_eq!(response.header("content-type").unwrap(), "application/json");
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl AsRef<[u8]> for Response {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
