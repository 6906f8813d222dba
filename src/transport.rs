//! The transport seam and its `reqwest` implementation.
//!
//! A [`Transport`] moves bytes. It exposes one operation per kind of work a
//! [`Task`](crate::Task) can describe; [`dispatch`](crate::provider::dispatch)
//! picks the right one.

use crate::multipart::{DownloadDestination, FormDataProvider, MultipartFormData};
use crate::{MoyaError, Request, Response, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Sends requests and returns raw responses.
///
/// Implementations report every failure as a [`MoyaError`], normally
/// [`MoyaError::Underlying`] with the response attached when one arrived.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request whose body, if any, is already on it.
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Sends the contents of `file` as the request body.
    async fn upload_file(&self, request: Request, file: &Path) -> Result<Response>;

    /// Sends `parts` as a `multipart/form-data` body.
    async fn upload_multipart(
        &self,
        request: Request,
        parts: &[MultipartFormData],
    ) -> Result<Response>;

    /// Sends the request and writes the response body to `destination`.
    async fn download(
        &self,
        request: Request,
        destination: &DownloadDestination,
    ) -> Result<Response>;
}

/// A [`Transport`] backed by a [`reqwest::Client`].
///
/// Connection pooling, TLS and redirects are whatever the wrapped client is
/// configured to do.
///
/// # Examples
///
/// ```no_run
/// use moya::ReqwestTransport;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), moya::MoyaError> {
/// let transport = ReqwestTransport::new()?.timeout(Duration::from_secs(30));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`MoyaError::Underlying`] if the client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Sets a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn send(&self, builder: reqwest::RequestBuilder, original: Request) -> Result<Response> {
        let builder = match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };

        tracing::debug!(
            method = %original.method,
            url = %original.url,
            "Executing HTTP request"
        );

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                error = %e,
                method = %original.method,
                url = %original.url,
                "Request failed"
            );
            MoyaError::from(e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let data = match response.bytes().await {
            Ok(data) => data,
            Err(e) => {
                let partial = Response::new(status, Bytes::new())
                    .with_headers(headers)
                    .with_request(original);
                return Err(MoyaError::Underlying(Box::new(e), Some(partial)));
            }
        };

        tracing::info!(
            status = status.as_u16(),
            bytes = data.len(),
            url = %original.url,
            "Received HTTP response"
        );

        Ok(Response {
            status_code: status,
            data,
            headers,
            request: Some(original),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<Response> {
        let builder = reqwest::RequestBuilder::from_parts(self.client.clone(), request.clone().into());
        self.send(builder, request).await
    }

    async fn upload_file(&self, request: Request, file: &Path) -> Result<Response> {
        let contents = tokio::fs::read(file).await.map_err(MoyaError::underlying)?;
        let mut outgoing = request.clone();
        outgoing.body = Some(Bytes::from(contents));
        self.execute(outgoing).await.map(|mut response| {
            response.request = Some(request);
            response
        })
    }

    async fn upload_multipart(
        &self,
        request: Request,
        parts: &[MultipartFormData],
    ) -> Result<Response> {
        let form = multipart_form(parts).await?;

        let mut headers = request.headers.clone();
        headers.remove(CONTENT_TYPE);
        let builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .multipart(form);

        self.send(builder, request).await
    }

    async fn download(
        &self,
        request: Request,
        destination: &DownloadDestination,
    ) -> Result<Response> {
        let response = self.execute(request).await?;

        let written = write_download(&response.data, destination).await;
        if let Err(e) = written {
            tracing::warn!(
                error = %e,
                path = %destination.path.display(),
                "Failed to write download"
            );
            return Err(MoyaError::Underlying(Box::new(e), Some(response)));
        }

        tracing::debug!(
            path = %destination.path.display(),
            bytes = response.data.len(),
            "Download written"
        );

        Ok(Response {
            data: Bytes::new(),
            ..response
        })
    }
}

async fn multipart_form(parts: &[MultipartFormData]) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let data = match &part.provider {
            FormDataProvider::Data(data) => data.to_vec(),
            FormDataProvider::File(path) => {
                tokio::fs::read(path).await.map_err(MoyaError::underlying)?
            }
        };

        let mut field = reqwest::multipart::Part::bytes(data);
        if let Some(file_name) = &part.file_name {
            field = field.file_name(file_name.clone());
        }
        if let Some(mime_type) = &part.mime_type {
            field = field.mime_str(mime_type)?;
        }
        form = form.part(part.name.clone(), field);
    }
    Ok(form)
}

async fn write_download(data: &[u8], destination: &DownloadDestination) -> io::Result<()> {
    let path = &destination.path;

    if destination.options.create_intermediate_directories {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    if tokio::fs::try_exists(path).await? {
        if !destination.options.remove_previous_file {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("download destination {} already exists", path.display()),
            ));
        }
        tokio::fs::remove_file(path).await?;
    }

    tokio::fs::write(path, data).await
}
