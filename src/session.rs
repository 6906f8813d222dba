//! Transport-wide session defaults.

use crate::{MoyaError, Result};
use http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Settings shared by every request a [`Provider`](crate::Provider) sends.
///
/// The default configuration carries `Accept-Encoding`, `Accept-Language` and
/// `User-Agent` headers and defers request start until the caller awaits.
///
/// # Examples
///
/// ```
/// use moya::SessionConfig;
///
/// # fn example() -> Result<(), moya::MoyaError> {
/// let session = SessionConfig::default()
///     .default_header("X-Client", "docs")?
///     .start_requests_immediately(true);
///
/// assert!(session.starts_requests_immediately());
/// assert_eq!(session.default_headers()["x-client"], "docs");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    default_headers: HeaderMap,
    start_requests_immediately: bool,
}

impl SessionConfig {
    /// A configuration with no default headers and deferred start.
    pub fn empty() -> Self {
        Self {
            default_headers: HeaderMap::new(),
            start_requests_immediately: false,
        }
    }

    /// Adds a default header, replacing any existing value for the name.
    ///
    /// # Errors
    ///
    /// Returns [`MoyaError::Underlying`] if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref()).map_err(MoyaError::underlying)?;
        let value = HeaderValue::try_from(value.as_ref()).map_err(MoyaError::underlying)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Whether requests are started as soon as they are created.
    pub fn start_requests_immediately(mut self, immediately: bool) -> Self {
        self.start_requests_immediately = immediately;
        self
    }

    /// The headers layered underneath every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Returns `true` if requests start on creation.
    pub fn starts_requests_immediately(&self) -> bool {
        self.start_requests_immediately
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT_ENCODING,
            HeaderValue::from_static("gzip;q=1.0"),
        );
        default_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en;q=1.0"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("moya/", env!("CARGO_PKG_VERSION"))),
        );
        Self {
            default_headers,
            start_requests_immediately: false,
        }
    }
}
