//! Error types for endpoint mapping, request building and response handling.
//!
//! [`MoyaError`] is a closed set: every failure that leaves the request
//! pipeline is one of its variants, and each variant carries the response
//! and/or underlying cause needed to report or recover from it.

use crate::Response;

/// A boxed error that can cross thread boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for every step between a [`Target`](crate::Target) and a
/// validated [`Response`].
///
/// # Examples
///
/// ```
/// use moya::{MoyaError, Response};
/// use http::StatusCode;
///
/// let response = Response::new(StatusCode::NOT_FOUND, "missing");
/// let err = MoyaError::StatusCode(response);
///
/// assert_eq!(err.response().unwrap().status_code.as_u16(), 404);
/// assert!(err.underlying_error().is_none());
/// assert_eq!(err.to_string(), "Status code didn't fall within the given range.");
/// ```
#[derive(thiserror::Error, Debug)]
pub enum MoyaError {
    /// A response failed to map to an image.
    #[error("Failed to map data to an Image.")]
    ImageMapping(Response),

    /// A response failed to map to a JSON structure.
    #[error("Failed to map data to JSON.")]
    JsonMapping(Response),

    /// A response failed to map to a string.
    #[error("Failed to map data to a String.")]
    StringMapping(Response),

    /// A response failed to map to a deserializable object.
    #[error("Failed to map data to a Decodable object.")]
    ObjectMapping(#[source] BoxError, Response),

    /// A request body value could not be serialized.
    #[error("Failed to encode Encodable object into data.")]
    EncodableMapping(#[source] BoxError),

    /// A response status code fell outside the target's validation range.
    #[error("Status code didn't fall within the given range.")]
    StatusCode(Response),

    /// A failure from a dependency that has no dedicated variant.
    ///
    /// The response is present when the failure happened after one arrived.
    #[error("{0}")]
    Underlying(#[source] BoxError, Option<Response>),

    /// An endpoint could not be turned into a request. Carries the offending URL.
    #[error("Failed to map Endpoint to a URLRequest.")]
    RequestMapping(String),

    /// A parameter encoding failed while building a request.
    #[error("Failed to encode parameters for URLRequest. {0}")]
    ParameterEncoding(#[source] BoxError),
}

impl MoyaError {
    /// Returns the response carried by this error, if any.
    ///
    /// `EncodableMapping`, `RequestMapping` and `ParameterEncoding` never
    /// carry one because they happen before a request is sent.
    pub fn response(&self) -> Option<&Response> {
        match self {
            MoyaError::ImageMapping(response) => Some(response),
            MoyaError::JsonMapping(response) => Some(response),
            MoyaError::StringMapping(response) => Some(response),
            MoyaError::ObjectMapping(_, response) => Some(response),
            MoyaError::EncodableMapping(_) => None,
            MoyaError::StatusCode(response) => Some(response),
            MoyaError::Underlying(_, response) => response.as_ref(),
            MoyaError::RequestMapping(_) => None,
            MoyaError::ParameterEncoding(_) => None,
        }
    }

    /// Returns the wrapped cause, if this variant has one.
    pub fn underlying_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            MoyaError::ImageMapping(_) => None,
            MoyaError::JsonMapping(_) => None,
            MoyaError::StringMapping(_) => None,
            MoyaError::ObjectMapping(error, _) => Some(error.as_ref()),
            MoyaError::EncodableMapping(error) => Some(error.as_ref()),
            MoyaError::StatusCode(_) => None,
            MoyaError::Underlying(error, _) => Some(error.as_ref()),
            MoyaError::RequestMapping(_) => None,
            MoyaError::ParameterEncoding(error) => Some(error.as_ref()),
        }
    }

    /// Human-readable description of the failure.
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Wraps any error as [`MoyaError::Underlying`] with no response.
    pub fn underlying(error: impl Into<BoxError>) -> Self {
        MoyaError::Underlying(error.into(), None)
    }
}

impl From<reqwest::Error> for MoyaError {
    fn from(error: reqwest::Error) -> Self {
        MoyaError::Underlying(Box::new(error), None)
    }
}

/// A specialized `Result` type for request mapping and dispatch.
pub type Result<T> = std::result::Result<T, MoyaError>;
