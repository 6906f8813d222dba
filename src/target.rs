//! The endpoint description contract.

use crate::{Task, ValidationType};
use bytes::Bytes;
use http::Method;
use std::collections::HashMap;
use url::Url;

/// Describes one logical API endpoint.
///
/// Implement this once per API, usually on an enum with one variant per
/// endpoint.
///
/// # Examples
///
/// ```
/// use moya::{Target, Task};
/// use bytes::Bytes;
/// use http::Method;
/// use std::collections::HashMap;
/// use url::Url;
///
/// #[derive(Clone)]
/// enum GitHub {
///     Zen,
///     UserProfile(String),
/// }
///
/// impl Target for GitHub {
///     fn base_url(&self) -> Url {
///         Url::parse("https://api.github.com").unwrap()
///     }
///
///     fn path(&self) -> String {
///         match self {
///             GitHub::Zen => "/zen".to_string(),
///             GitHub::UserProfile(name) => format!("/users/{name}"),
///         }
///     }
///
///     fn method(&self) -> Method {
///         Method::GET
///     }
///
///     fn sample_data(&self) -> Bytes {
///         match self {
///             GitHub::Zen => Bytes::from_static(b"Half measures are as bad as nothing at all."),
///             GitHub::UserProfile(name) => Bytes::from(format!(r#"{{"login": "{name}"}}"#)),
///         }
///     }
///
///     fn task(&self) -> Task {
///         Task::Plain
///     }
///
///     fn headers(&self) -> Option<HashMap<String, String>> {
///         None
///     }
/// }
/// ```
pub trait Target: Send + Sync {
    /// The base URL, e.g. `https://api.example.com`.
    fn base_url(&self) -> Url;

    /// Appended to [`base_url`](Self::base_url). An absolute URL here
    /// replaces the base entirely.
    fn path(&self) -> String;

    /// The HTTP method.
    fn method(&self) -> Method;

    /// Canned response body for stubbed transports.
    fn sample_data(&self) -> Bytes;

    /// How the body and parameters are attached.
    fn task(&self) -> Task;

    /// Which status codes count as success. Defaults to accepting everything.
    fn validation_type(&self) -> ValidationType {
        ValidationType::None
    }

    /// Extra request headers.
    fn headers(&self) -> Option<HashMap<String, String>>;
}

/// Joins a base URL and a target path.
///
/// If `path` parses as an absolute URL with a host it is returned unchanged.
/// An empty path yields the base URL. Otherwise `path` is appended to the base
/// URL's path with exactly one `/` between them; the base URL's query and
/// fragment are kept.
///
/// # Examples
///
/// ```
/// use moya::target::resolve_url;
/// use url::Url;
///
/// let base = Url::parse("https://api.example.com").unwrap();
/// assert_eq!(resolve_url(&base, "/users"), "https://api.example.com/users");
/// assert_eq!(
///     resolve_url(&base, "https://cdn.example.com/a.png"),
///     "https://cdn.example.com/a.png"
/// );
/// ```
pub fn resolve_url(base_url: &Url, path: &str) -> String {
    if let Ok(absolute) = Url::parse(path) {
        if absolute.has_host() {
            return path.to_string();
        }
    }

    if path.is_empty() {
        return base_url.as_str().to_string();
    }

    let mut url = base_url.clone();
    let joined = format!(
        "{}/{}",
        base_url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.to_string()
}
