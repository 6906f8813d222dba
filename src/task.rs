//! How a request's body, parameters and files are attached.
//!
//! [`Task`] is pure data. Interpretation lives in
//! [`Endpoint::url_request`](crate::Endpoint::url_request) and
//! [`dispatch`](crate::provider::dispatch), both of which match every variant
//! explicitly.

use crate::encoding::{ParameterEncoding, Parameters};
use crate::error::BoxError;
use crate::multipart::{DownloadDestination, MultipartFormData};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Turns a JSON value into body bytes.
///
/// Implement this to customize how [`Task::JsonEncodable`] bodies are written.
pub trait JsonEncoder: fmt::Debug + Send + Sync {
    /// Serializes `value`.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError>;
}

/// Compact JSON. Used when no encoder is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJsonEncoder;

impl JsonEncoder for CompactJsonEncoder {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(value)?)
    }
}

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonEncoder;

impl JsonEncoder for PrettyJsonEncoder {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec_pretty(value)?)
    }
}

type SerializeFn = dyn Fn() -> serde_json::Result<Value> + Send + Sync;

/// A serializable value waiting to become a request body.
///
/// Serialization is deferred until the request is built so that failures
/// surface as [`MoyaError::EncodableMapping`](crate::MoyaError::EncodableMapping).
#[derive(Clone)]
pub struct JsonBody {
    serialize: Arc<SerializeFn>,
    encoder: Option<Arc<dyn JsonEncoder>>,
}

impl JsonBody {
    /// Wraps a serializable value.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self {
            serialize: Arc::new(move || serde_json::to_value(&value)),
            encoder: None,
        }
    }

    /// Uses a custom encoder instead of [`CompactJsonEncoder`].
    pub fn with_encoder(mut self, encoder: impl JsonEncoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Serializes the value with the configured encoder.
    pub fn encode(&self) -> Result<Vec<u8>, BoxError> {
        let value = (self.serialize)()?;
        match &self.encoder {
            Some(encoder) => encoder.encode(&value),
            None => CompactJsonEncoder.encode(&value),
        }
    }
}

impl fmt::Debug for JsonBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBody")
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

/// The kind of HTTP work an endpoint performs.
///
/// # Examples
///
/// ```
/// use moya::{encoding::UrlEncoding, Task};
/// use serde_json::json;
///
/// let search = Task::parameters(
///     json!({"q": "cats"}).as_object().unwrap().clone(),
///     UrlEncoding::default(),
/// );
/// assert!(matches!(search, Task::Parameters { .. }));
/// ```
#[derive(Debug, Clone)]
pub enum Task {
    /// No body.
    Plain,

    /// Raw body bytes.
    Data(Bytes),

    /// A serializable body, written as JSON.
    JsonEncodable(JsonBody),

    /// Parameters placed according to `encoding`.
    Parameters {
        /// The parameters.
        parameters: Parameters,
        /// Where and how they are written.
        encoding: Arc<dyn ParameterEncoding>,
    },

    /// A fixed body plus URL query parameters.
    CompositeData {
        /// The body, sent verbatim.
        body: Bytes,
        /// Always encoded into the URL query.
        url_parameters: Parameters,
    },

    /// Body parameters and URL parameters encoded independently.
    CompositeParameters {
        /// Encoded with `body_encoding`.
        body_parameters: Parameters,
        /// Encoding for `body_parameters`.
        body_encoding: Arc<dyn ParameterEncoding>,
        /// Always encoded into the URL query.
        url_parameters: Parameters,
    },

    /// Upload a local file as the body.
    UploadFile(PathBuf),

    /// A `multipart/form-data` upload.
    UploadMultipart(Vec<MultipartFormData>),

    /// A `multipart/form-data` upload plus URL query parameters.
    UploadCompositeMultipart {
        /// The parts.
        parts: Vec<MultipartFormData>,
        /// Always encoded into the URL query.
        url_parameters: Parameters,
    },

    /// Download the response body to a file.
    DownloadDestination(DownloadDestination),

    /// Download to a file, with parameters placed according to `encoding`.
    DownloadParameters {
        /// The parameters.
        parameters: Parameters,
        /// Where and how they are written.
        encoding: Arc<dyn ParameterEncoding>,
        /// Where the body is written.
        destination: DownloadDestination,
    },
}

impl Task {
    /// A JSON body from any serializable value.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Task::JsonEncodable(JsonBody::new(value))
    }

    /// A JSON body written with a custom encoder.
    pub fn custom_json<T>(value: T, encoder: impl JsonEncoder + 'static) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Task::JsonEncodable(JsonBody::new(value).with_encoder(encoder))
    }

    /// Parameters placed by `encoding`.
    pub fn parameters(parameters: Parameters, encoding: impl ParameterEncoding + 'static) -> Self {
        Task::Parameters {
            parameters,
            encoding: Arc::new(encoding),
        }
    }

    /// Body parameters encoded by `body_encoding`, URL parameters in the query.
    pub fn composite_parameters(
        body_parameters: Parameters,
        body_encoding: impl ParameterEncoding + 'static,
        url_parameters: Parameters,
    ) -> Self {
        Task::CompositeParameters {
            body_parameters,
            body_encoding: Arc::new(body_encoding),
            url_parameters,
        }
    }

    /// Download to `destination` with parameters placed by `encoding`.
    pub fn download_parameters(
        parameters: Parameters,
        encoding: impl ParameterEncoding + 'static,
        destination: DownloadDestination,
    ) -> Self {
        Task::DownloadParameters {
            parameters,
            encoding: Arc::new(encoding),
            destination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_json_body_round_trip() {
        let user = User {
            id: 7,
            name: "Alice".to_string(),
            tags: vec!["admin".to_string()],
        };
        let body = JsonBody::new(User {
            id: 7,
            name: "Alice".to_string(),
            tags: vec!["admin".to_string()],
        });

        let decoded: User = serde_json::from_slice(&body.encode().unwrap()).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_json_body_custom_encoder() {
        let body = JsonBody::new(HashMap::from([("a", 1)])).with_encoder(PrettyJsonEncoder);
        let encoded = String::from_utf8(body.encode().unwrap()).unwrap();
        assert_eq!(encoded, "{\n  \"a\": 1\n}");
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_json_body_serialization_failure() {
        let err = JsonBody::new(Unserializable).encode().unwrap_err();
        assert!(err.to_string().contains("refusing to serialize"));
    }
}
