//! Resolved endpoints and the endpoint-to-request builder.
//!
//! An [`Endpoint`] is what a [`Target`] becomes once its URL is resolved. It
//! is immutable; [`Endpoint::adding_headers`] and [`Endpoint::replacing_task`]
//! return new values. [`Endpoint::url_request`] is the pure function that
//! turns it into a [`Request`].

use crate::encoding::{ParameterEncoding, Parameters, UrlEncoding};
use crate::error::BoxError;
use crate::target::resolve_url;
use crate::{MoyaError, Request, Response, Result, Target, Task};
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderValue, Method};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// What a stubbed transport should answer with.
#[derive(Debug)]
pub enum EndpointSampleResponse {
    /// A status code and body.
    NetworkResponse(u16, Bytes),
    /// A complete response.
    Response(Response),
    /// A transport failure.
    NetworkError(BoxError),
}

/// Lazily produces a sample response.
pub type SampleResponseClosure = Arc<dyn Fn() -> EndpointSampleResponse + Send + Sync>;

/// A resolved, transport-agnostic request description.
///
/// # Examples
///
/// ```
/// use moya::{Endpoint, Task};
/// use http::Method;
///
/// let endpoint = Endpoint::new(
///     "https://api.example.com/users",
///     Method::GET,
///     Task::Plain,
///     None,
/// );
///
/// let request = endpoint.url_request().unwrap();
/// assert_eq!(request.method, Method::GET);
/// assert_eq!(request.url.as_str(), "https://api.example.com/users");
/// assert!(request.body.is_none());
/// ```
#[derive(Clone)]
pub struct Endpoint {
    /// The absolute URL.
    pub url: String,
    /// Produces the stubbed response.
    pub sample_response_closure: SampleResponseClosure,
    /// The HTTP method.
    pub method: Method,
    /// How the body and parameters are attached.
    pub task: Task,
    /// Request headers.
    pub http_header_fields: Option<HashMap<String, String>>,
}

impl Endpoint {
    /// Creates an endpoint whose sample response is an empty `200`.
    pub fn new(
        url: impl Into<String>,
        method: Method,
        task: Task,
        http_header_fields: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            url: url.into(),
            sample_response_closure: Arc::new(|| {
                EndpointSampleResponse::NetworkResponse(200, Bytes::new())
            }),
            method,
            task,
            http_header_fields,
        }
    }

    /// Replaces the sample response closure.
    pub fn with_sample_response<F>(mut self, closure: F) -> Self
    where
        F: Fn() -> EndpointSampleResponse + Send + Sync + 'static,
    {
        self.sample_response_closure = Arc::new(closure);
        self
    }

    /// The default mapping from a target.
    ///
    /// The sample response is `200` with the target's
    /// [`sample_data`](Target::sample_data), computed on demand.
    pub fn from_target<T>(target: &T) -> Self
    where
        T: Target + Clone + 'static,
    {
        let url = resolve_url(&target.base_url(), &target.path());
        let sample_target = target.clone();
        Self {
            url,
            sample_response_closure: Arc::new(move || {
                EndpointSampleResponse::NetworkResponse(200, sample_target.sample_data())
            }),
            method: target.method(),
            task: target.task(),
            http_header_fields: target.headers(),
        }
    }

    /// Invokes the sample response closure.
    pub fn sample_response(&self) -> EndpointSampleResponse {
        (self.sample_response_closure)()
    }

    /// Returns a copy with `headers` added. New values win on conflict.
    ///
    /// Header names compare case-insensitively, so `authorization` replaces
    /// an existing `Authorization`.
    pub fn adding_headers(&self, headers: HashMap<String, String>) -> Endpoint {
        let mut merged = self.http_header_fields.clone().unwrap_or_default();
        merged.retain(|existing, _| {
            !headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(existing))
        });
        merged.extend(headers);
        Endpoint {
            http_header_fields: Some(merged),
            ..self.clone()
        }
    }

    /// Returns a copy with a different task.
    pub fn replacing_task(&self, task: Task) -> Endpoint {
        Endpoint {
            task,
            ..self.clone()
        }
    }

    /// Builds the concrete request.
    ///
    /// # Errors
    ///
    /// - [`MoyaError::RequestMapping`] if the URL does not parse
    /// - [`MoyaError::EncodableMapping`] if a JSON body fails to serialize
    /// - [`MoyaError::ParameterEncoding`] if a parameter encoding fails
    /// - [`MoyaError::Underlying`] for invalid header names or values
    pub fn url_request(&self) -> Result<Request> {
        let url =
            Url::parse(&self.url).map_err(|_| MoyaError::RequestMapping(self.url.clone()))?;

        let mut request = Request::new(self.method.clone(), url);
        if let Some(fields) = &self.http_header_fields {
            request = request.with_header_fields(fields)?;
        }

        match &self.task {
            Task::Plain
            | Task::UploadFile(_)
            | Task::UploadMultipart(_)
            | Task::DownloadDestination(_) => Ok(request),
            Task::Data(body) => {
                request.body = Some(body.clone());
                Ok(request)
            }
            Task::JsonEncodable(body) => {
                let encoded = body.encode().map_err(MoyaError::EncodableMapping)?;
                request.body = Some(Bytes::from(encoded));
                request.set_header_if_absent(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Ok(request)
            }
            Task::Parameters {
                parameters,
                encoding,
            }
            | Task::DownloadParameters {
                parameters,
                encoding,
                ..
            } => encode(request, encoding.as_ref(), parameters),
            Task::CompositeData {
                body,
                url_parameters,
            } => {
                request.body = Some(body.clone());
                encode(request, &UrlEncoding::query_string(), url_parameters)
            }
            Task::CompositeParameters {
                body_parameters,
                body_encoding,
                url_parameters,
            } => {
                // Body first: the URL step only appends to the query.
                let request = encode(request, body_encoding.as_ref(), body_parameters)?;
                encode(request, &UrlEncoding::query_string(), url_parameters)
            }
            Task::UploadCompositeMultipart { url_parameters, .. } => {
                encode(request, &UrlEncoding::query_string(), url_parameters)
            }
        }
    }
}

fn encode(
    request: Request,
    encoding: &dyn ParameterEncoding,
    parameters: &Parameters,
) -> Result<Request> {
    encoding
        .encode(request, parameters)
        .map_err(MoyaError::ParameterEncoding)
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("task", &self.task)
            .field("http_header_fields", &self.http_header_fields)
            .finish_non_exhaustive()
    }
}
