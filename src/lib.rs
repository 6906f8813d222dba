//! # Moya - declarative API endpoints for Rust
//!
//! Moya lets you describe each endpoint of an API as a plain value: its base
//! URL, path, method, how the body and parameters are attached, extra headers
//! and which status codes count as success. A [`Provider`] turns those
//! descriptions into requests, sends them over a [`Transport`] and validates
//! the responses. Every failure along the way is a [`MoyaError`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use moya::{encoding::UrlEncoding, Provider, ReqwestTransport, Target, Task, ValidationType};
//! use bytes::Bytes;
//! use http::Method;
//! use serde_json::json;
//! use std::collections::HashMap;
//! use url::Url;
//!
//! #[derive(Clone)]
//! enum GitHub {
//!     User(String),
//!     SearchRepositories(String),
//! }
//!
//! impl Target for GitHub {
//!     fn base_url(&self) -> Url {
//!         Url::parse("https://api.github.com").unwrap()
//!     }
//!
//!     fn path(&self) -> String {
//!         match self {
//!             GitHub::User(name) => format!("/users/{name}"),
//!             GitHub::SearchRepositories(_) => "/search/repositories".to_string(),
//!         }
//!     }
//!
//!     fn method(&self) -> Method {
//!         Method::GET
//!     }
//!
//!     fn sample_data(&self) -> Bytes {
//!         Bytes::from_static(b"{}")
//!     }
//!
//!     fn task(&self) -> Task {
//!         match self {
//!             GitHub::User(_) => Task::Plain,
//!             GitHub::SearchRepositories(query) => Task::parameters(
//!                 json!({ "q": query }).as_object().cloned().unwrap(),
//!                 UrlEncoding::default(),
//!             ),
//!         }
//!     }
//!
//!     fn validation_type(&self) -> ValidationType {
//!         ValidationType::SuccessCodes
//!     }
//!
//!     fn headers(&self) -> Option<HashMap<String, String>> {
//!         Some(HashMap::from([(
//!             "Accept".to_string(),
//!             "application/vnd.github+json".to_string(),
//!         )]))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), moya::MoyaError> {
//!     let provider = Provider::new(ReqwestTransport::new()?);
//!
//!     let response = provider.request(GitHub::User("octocat".into())).await?;
//!     println!("{}", String::from_utf8_lossy(&response.data));
//!
//!     let response = provider
//!         .request(GitHub::SearchRepositories("moya".into()))
//!         .await?;
//!     println!("Status: {}", response.status_code);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Building requests without sending them
//!
//! [`Endpoint::url_request`] is a pure function, so the request a target
//! produces can be inspected directly:
//!
//! ```
//! use moya::{Endpoint, Task};
//! use http::Method;
//!
//! let endpoint = Endpoint::new("https://api.example.com/users", Method::GET, Task::Plain, None);
//! let request = endpoint.url_request()?;
//!
//! assert_eq!(request.url.as_str(), "https://api.example.com/users");
//! assert!(request.body.is_none());
//! # Ok::<(), moya::MoyaError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use moya::MoyaError;
//!
//! # fn report(result: Result<moya::Response, MoyaError>) {
//! match result {
//!     Ok(response) => println!("Success: {}", response.status_code),
//!     Err(MoyaError::StatusCode(response)) => {
//!         eprintln!("Rejected status {}", response.status_code);
//!     }
//!     Err(e) => {
//!         eprintln!("{}", e);
//!         if let Some(cause) = e.underlying_error() {
//!             eprintln!("  caused by: {}", cause);
//!         }
//!     }
//! }
//! # }
//! ```

pub mod encoding;
mod endpoint;
mod error;
pub mod multipart;
pub mod provider;
mod request;
mod response;
mod session;
pub mod target;
mod task;
mod transport;
mod validation;

pub use encoding::{ParameterEncoding, Parameters};
pub use endpoint::{Endpoint, EndpointSampleResponse, SampleResponseClosure};
pub use error::{BoxError, MoyaError, Result};
pub use multipart::{DownloadDestination, DownloadOptions, FormDataProvider, MultipartFormData};
pub use provider::{PendingRequest, Provider, ProviderBuilder, RequestResultClosure};
pub use request::Request;
pub use response::Response;
pub use session::SessionConfig;
pub use target::Target;
pub use task::{CompactJsonEncoder, JsonBody, JsonEncoder, PrettyJsonEncoder, Task};
pub use transport::{ReqwestTransport, Transport};
pub use validation::ValidationType;
