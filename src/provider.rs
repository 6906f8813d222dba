//! Composes targets, endpoints, requests and a transport.
//!
//! The [`Provider`] is the entry point for sending requests described by a
//! [`Target`]. Each step is replaceable: the endpoint closure turns a target
//! into an [`Endpoint`], the request closure turns the endpoint into a
//! [`Request`], and the [`Transport`] sends it.

use crate::{
    Endpoint, MoyaError, Request, Response, Result, SessionConfig, Target, Task, Transport,
};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

/// Single-shot continuation that receives the built request.
///
/// Being `FnOnce`, it can be called at most once. Request closures must call
/// it exactly once; dropping it uncalled fails the request with
/// [`MoyaError::RequestMapping`].
pub type RequestResultClosure = Box<dyn FnOnce(Result<Request>) + Send>;

/// Maps a target to an endpoint.
pub type EndpointClosure<T> = Arc<dyn Fn(&T) -> Endpoint + Send + Sync>;

/// Maps an endpoint to a request and hands it to the continuation.
pub type RequestClosure = Arc<dyn Fn(&Endpoint, RequestResultClosure) + Send + Sync>;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The default endpoint mapping.
///
/// See [`Endpoint::from_target`].
pub fn default_endpoint_mapping<T>(target: &T) -> Endpoint
where
    T: Target + Clone + 'static,
{
    Endpoint::from_target(target)
}

/// The default request mapping.
///
/// Builds the request with [`Endpoint::url_request`] and invokes `closure`
/// exactly once, synchronously. Mapping failures pass through unchanged; any
/// other error is wrapped as [`MoyaError::Underlying`].
pub fn default_request_mapping(endpoint: &Endpoint, closure: RequestResultClosure) {
    match endpoint.url_request() {
        Ok(request) => {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                "Mapped endpoint to request"
            );
            closure(Ok(request))
        }
        Err(err) => {
            tracing::error!(error = %err, url = %endpoint.url, "Failed to map endpoint");
            let err = match err {
                MoyaError::RequestMapping(_)
                | MoyaError::ParameterEncoding(_)
                | MoyaError::EncodableMapping(_)
                | MoyaError::Underlying(_, _) => err,
                MoyaError::ImageMapping(_)
                | MoyaError::JsonMapping(_)
                | MoyaError::StringMapping(_)
                | MoyaError::ObjectMapping(_, _)
                | MoyaError::StatusCode(_) => MoyaError::Underlying(Box::new(err), None),
            };
            closure(Err(err))
        }
    }
}

/// Sends `request` through the transport operation that matches `task`.
///
/// Upload tasks go to the upload operations, download tasks to
/// [`Transport::download`], everything else to [`Transport::execute`].
pub async fn dispatch<Tr>(transport: &Tr, request: Request, task: &Task) -> Result<Response>
where
    Tr: Transport + ?Sized,
{
    match task {
        Task::Plain
        | Task::Data(_)
        | Task::JsonEncodable(_)
        | Task::Parameters { .. }
        | Task::CompositeData { .. }
        | Task::CompositeParameters { .. } => transport.execute(request).await,
        Task::UploadFile(file) => transport.upload_file(request, file).await,
        Task::UploadMultipart(parts) | Task::UploadCompositeMultipart { parts, .. } => {
            transport.upload_multipart(request, parts).await
        }
        Task::DownloadDestination(destination) | Task::DownloadParameters { destination, .. } => {
            transport.download(request, destination).await
        }
    }
}

/// Sends requests described by targets of type `T` over transport `Tr`.
///
/// Cloning a provider is cheap; clones share configuration and transport.
///
/// # Examples
///
/// ```no_run
/// use moya::{Provider, ReqwestTransport, Target, Task};
/// # use bytes::Bytes;
/// # use http::Method;
/// # use std::collections::HashMap;
/// # use url::Url;
///
/// #[derive(Clone)]
/// struct Zen;
///
/// impl Target for Zen {
///     fn base_url(&self) -> Url { Url::parse("https://api.github.com").unwrap() }
///     fn path(&self) -> String { "/zen".into() }
///     fn method(&self) -> Method { Method::GET }
///     fn sample_data(&self) -> Bytes { Bytes::new() }
///     fn task(&self) -> Task { Task::Plain }
///     fn headers(&self) -> Option<HashMap<String, String>> { None }
/// }
///
/// # async fn example() -> Result<(), moya::MoyaError> {
/// let provider = Provider::new(ReqwestTransport::new()?);
/// let response = provider.request(Zen).await?;
/// println!("{}", String::from_utf8_lossy(&response.data));
/// # Ok(())
/// # }
/// ```
pub struct Provider<T, Tr> {
    inner: Arc<ProviderInner<T, Tr>>,
}

struct ProviderInner<T, Tr> {
    endpoint_closure: EndpointClosure<T>,
    request_closure: RequestClosure,
    transport: Tr,
    session: SessionConfig,
}

impl<T, Tr> Clone for Provider<T, Tr> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, Tr> Provider<T, Tr>
where
    T: Target + Clone + 'static,
    Tr: Transport + 'static,
{
    /// Creates a provider with the default closures and session.
    pub fn new(transport: Tr) -> Self {
        ProviderBuilder::new(transport).build()
    }

    /// Creates a [`ProviderBuilder`].
    pub fn builder(transport: Tr) -> ProviderBuilder<T, Tr> {
        ProviderBuilder::new(transport)
    }

    /// Maps a target through the endpoint closure.
    pub fn endpoint(&self, target: &T) -> Endpoint {
        (self.inner.endpoint_closure)(target)
    }

    /// The session configuration.
    pub fn session(&self) -> &SessionConfig {
        &self.inner.session
    }

    /// The transport.
    pub fn transport(&self) -> &Tr {
        &self.inner.transport
    }

    /// Builds the request for a target without sending it.
    ///
    /// Session default headers are layered underneath the target's own.
    pub async fn build_request(&self, target: &T) -> Result<Request> {
        let endpoint = self.endpoint(target);
        self.inner.map_request(&endpoint).await
    }

    /// Creates a request for `target`.
    ///
    /// With the default session the work starts when the returned value is
    /// awaited. If [`SessionConfig::start_requests_immediately`] is set and a
    /// tokio runtime is available, it is spawned right away.
    pub fn request(&self, target: T) -> PendingRequest {
        let inner = Arc::clone(&self.inner);
        let pending = PendingRequest::deferred(Box::pin(async move { inner.perform(target).await }));

        if self.inner.session.starts_requests_immediately() {
            pending.start()
        } else {
            pending
        }
    }
}

impl<T, Tr> ProviderInner<T, Tr>
where
    T: Target + Clone + 'static,
    Tr: Transport + 'static,
{
    async fn map_request(&self, endpoint: &Endpoint) -> Result<Request> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (self.request_closure)(
            endpoint,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        let mut request = match rx.await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(url = %endpoint.url, "Request closure dropped its continuation");
                return Err(MoyaError::RequestMapping(endpoint.url.clone()));
            }
        };
        request.merge_default_headers(self.session.default_headers());
        Ok(request)
    }

    async fn perform(&self, target: T) -> Result<Response> {
        let endpoint = (self.endpoint_closure)(&target);
        let request = self.map_request(&endpoint).await?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Dispatching request"
        );

        let response = dispatch(&self.transport, request, &endpoint.task).await?;
        target.validation_type().validate(response)
    }
}

impl<T, Tr> fmt::Debug for Provider<T, Tr> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// A request that has been created but not necessarily started.
///
/// Await it to get the validated [`Response`].
pub struct PendingRequest {
    state: PendingState,
}

enum PendingState {
    Deferred(BoxFuture<Result<Response>>),
    Started(tokio::task::JoinHandle<Result<Response>>),
}

impl PendingRequest {
    fn deferred(future: BoxFuture<Result<Response>>) -> Self {
        Self {
            state: PendingState::Deferred(future),
        }
    }

    /// Returns `true` if the request is already running in the background.
    pub fn is_started(&self) -> bool {
        matches!(self.state, PendingState::Started(_))
    }

    /// Spawns the request on the current tokio runtime.
    ///
    /// Outside a runtime the request stays deferred and runs when awaited.
    pub fn start(self) -> Self {
        match self.state {
            PendingState::Deferred(future) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => Self {
                    state: PendingState::Started(handle.spawn(future)),
                },
                Err(_) => {
                    tracing::warn!("No tokio runtime available, request start deferred");
                    Self::deferred(future)
                }
            },
            started @ PendingState::Started(_) => Self { state: started },
        }
    }
}

impl IntoFuture for PendingRequest {
    type Output = Result<Response>;
    type IntoFuture = BoxFuture<Result<Response>>;

    fn into_future(self) -> Self::IntoFuture {
        match self.state {
            PendingState::Deferred(future) => future,
            PendingState::Started(handle) => Box::pin(async move {
                match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(MoyaError::underlying(e)),
                }
            }),
        }
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("started", &self.is_started())
            .finish()
    }
}

/// Builder for a [`Provider`].
///
/// # Examples
///
/// ```no_run
/// use moya::{Provider, ReqwestTransport, SessionConfig};
/// # use moya::{Target, Task};
/// # use bytes::Bytes;
/// # use http::Method;
/// # use std::collections::HashMap;
/// # use url::Url;
/// # #[derive(Clone)]
/// # struct Api;
/// # impl Target for Api {
/// #     fn base_url(&self) -> Url { Url::parse("https://api.example.com").unwrap() }
/// #     fn path(&self) -> String { "/".into() }
/// #     fn method(&self) -> Method { Method::GET }
/// #     fn sample_data(&self) -> Bytes { Bytes::new() }
/// #     fn task(&self) -> Task { Task::Plain }
/// #     fn headers(&self) -> Option<HashMap<String, String>> { None }
/// # }
///
/// # fn example() -> Result<(), moya::MoyaError> {
/// let provider: Provider<Api, _> = Provider::builder(ReqwestTransport::new()?)
///     .endpoint_closure(|target: &Api| {
///         moya::provider::default_endpoint_mapping(target).adding_headers(
///             [("Authorization".to_string(), "Bearer token".to_string())].into(),
///         )
///     })
///     .session(SessionConfig::default().default_header("X-Client", "example")?)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct ProviderBuilder<T, Tr> {
    transport: Tr,
    endpoint_closure: Option<EndpointClosure<T>>,
    request_closure: Option<RequestClosure>,
    session: SessionConfig,
}

impl<T, Tr> ProviderBuilder<T, Tr>
where
    T: Target + Clone + 'static,
    Tr: Transport + 'static,
{
    /// Creates a builder with the default closures and session.
    pub fn new(transport: Tr) -> Self {
        Self {
            transport,
            endpoint_closure: None,
            request_closure: None,
            session: SessionConfig::default(),
        }
    }

    /// Replaces the target-to-endpoint mapping.
    pub fn endpoint_closure<F>(mut self, closure: F) -> Self
    where
        F: Fn(&T) -> Endpoint + Send + Sync + 'static,
    {
        self.endpoint_closure = Some(Arc::new(closure));
        self
    }

    /// Replaces the endpoint-to-request mapping.
    pub fn request_closure<F>(mut self, closure: F) -> Self
    where
        F: Fn(&Endpoint, RequestResultClosure) + Send + Sync + 'static,
    {
        self.request_closure = Some(Arc::new(closure));
        self
    }

    /// Sets the session configuration.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Builds the provider.
    pub fn build(self) -> Provider<T, Tr> {
        let endpoint_closure: EndpointClosure<T> = match self.endpoint_closure {
            Some(closure) => closure,
            None => Arc::new(|target: &T| default_endpoint_mapping(target)),
        };
        let request_closure: RequestClosure = match self.request_closure {
            Some(closure) => closure,
            None => Arc::new(default_request_mapping),
        };

        Provider {
            inner: Arc::new(ProviderInner {
                endpoint_closure,
                request_closure,
                transport: self.transport,
                session: self.session,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::UrlEncoding;
    use crate::multipart::{DownloadDestination, MultipartFormData};
    use crate::ValidationType;
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use url::Url;

    #[derive(Clone)]
    enum Api {
        Users,
        Search(String),
        Missing,
        Strict,
        Broken,
    }

    impl Target for Api {
        fn base_url(&self) -> Url {
            Url::parse("https://api.example.com").unwrap()
        }

        fn path(&self) -> String {
            match self {
                Api::Users => "/users".to_string(),
                Api::Search(_) => "/search".to_string(),
                Api::Missing | Api::Strict => "/missing".to_string(),
                Api::Broken => "/broken".to_string(),
            }
        }

        fn method(&self) -> Method {
            Method::GET
        }

        fn sample_data(&self) -> Bytes {
            Bytes::new()
        }

        fn task(&self) -> Task {
            match self {
                Api::Search(query) => Task::parameters(
                    json!({ "q": query }).as_object().cloned().unwrap(),
                    UrlEncoding::default(),
                ),
                Api::Broken => Task::json(HashMap::from([(vec![0u8], 1)])),
                _ => Task::Plain,
            }
        }

        fn validation_type(&self) -> ValidationType {
            match self {
                Api::Strict => ValidationType::SuccessCodes,
                _ => ValidationType::None,
            }
        }

        fn headers(&self) -> Option<HashMap<String, String>> {
            None
        }
    }

    /// Records which operation was used and answers with a fixed status.
    struct RecordingTransport {
        status: StatusCode,
        calls: Mutex<Vec<&'static str>>,
        requests: Mutex<Vec<Request>>,
    }

    impl RecordingTransport {
        fn new(status: StatusCode) -> Self {
            Self {
                status,
                calls: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &'static str, request: Request) -> Result<Response> {
            self.calls.lock().unwrap().push(call);
            self.requests.lock().unwrap().push(request.clone());
            Ok(Response::new(self.status, "ok").with_request(request))
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(&self, request: Request) -> Result<Response> {
            self.record("execute", request)
        }

        async fn upload_file(&self, request: Request, _file: &Path) -> Result<Response> {
            self.record("upload_file", request)
        }

        async fn upload_multipart(
            &self,
            request: Request,
            _parts: &[MultipartFormData],
        ) -> Result<Response> {
            self.record("upload_multipart", request)
        }

        async fn download(
            &self,
            request: Request,
            _destination: &DownloadDestination,
        ) -> Result<Response> {
            self.record("download", request)
        }
    }

    fn request() -> Request {
        Request::new(Method::POST, Url::parse("https://api.example.com/f").unwrap())
    }

    #[tokio::test]
    async fn test_dispatch_selects_transport_operation() {
        let transport = RecordingTransport::new(StatusCode::OK);
        let empty = serde_json::Map::new();

        let cases = vec![
            (Task::Plain, "execute"),
            (Task::Data(Bytes::from_static(b"x")), "execute"),
            (Task::json(1), "execute"),
            (Task::parameters(empty.clone(), UrlEncoding::default()), "execute"),
            (
                Task::CompositeData {
                    body: Bytes::new(),
                    url_parameters: empty.clone(),
                },
                "execute",
            ),
            (
                Task::composite_parameters(empty.clone(), UrlEncoding::default(), empty.clone()),
                "execute",
            ),
            (Task::UploadFile("/tmp/f".into()), "upload_file"),
            (Task::UploadMultipart(vec![]), "upload_multipart"),
            (
                Task::UploadCompositeMultipart {
                    parts: vec![],
                    url_parameters: empty.clone(),
                },
                "upload_multipart",
            ),
            (
                Task::DownloadDestination(DownloadDestination::new("/tmp/d")),
                "download",
            ),
            (
                Task::download_parameters(
                    empty.clone(),
                    UrlEncoding::default(),
                    DownloadDestination::new("/tmp/d"),
                ),
                "download",
            ),
        ];

        for (task, expected) in cases {
            dispatch(&transport, request(), &task).await.unwrap();
            assert_eq!(transport.calls.lock().unwrap().pop(), Some(expected));
        }
    }

    #[test]
    fn test_default_request_mapping_calls_closure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let endpoint = default_endpoint_mapping(&Api::Users);
        default_request_mapping(
            &endpoint,
            Box::new(move |result| {
                assert!(result.is_ok());
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_request_mapping_failure_calls_closure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let endpoint = Endpoint::new("::not a url::", Method::GET, Task::Plain, None);
        default_request_mapping(
            &endpoint,
            Box::new(move |result| {
                assert!(matches!(result, Err(MoyaError::RequestMapping(_))));
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_request_mapping_keeps_encodable_mapping() {
        let endpoint = default_endpoint_mapping(&Api::Broken);
        let result = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);

        default_request_mapping(
            &endpoint,
            Box::new(move |r| {
                *slot.lock().unwrap() = Some(r);
            }),
        );

        let outcome = result.lock().unwrap().take().unwrap();
        assert!(matches!(outcome, Err(MoyaError::EncodableMapping(_))));
    }

    #[tokio::test]
    async fn test_request_merges_session_defaults() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .session(SessionConfig::empty().default_header("X-Client", "tests").unwrap())
            .build();

        let response = provider.request(Api::Search("cats".into())).await.unwrap();
        let sent = response.request.unwrap();

        assert_eq!(sent.url.as_str(), "https://api.example.com/search?q=cats");
        assert_eq!(sent.header("x-client"), Some("tests"));
        assert!(sent.body.is_none());
    }

    #[tokio::test]
    async fn test_target_headers_win_over_session_defaults() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .endpoint_closure(|target: &Api| {
                default_endpoint_mapping(target)
                    .adding_headers(HashMap::from([("User-Agent".to_string(), "api/2".to_string())]))
            })
            .build();

        let request = provider.build_request(&Api::Users).await.unwrap();
        assert_eq!(request.header("user-agent"), Some("api/2"));
        assert!(request.headers.contains_key("accept-language"));
    }

    #[tokio::test]
    async fn test_validation_uses_target_policy() {
        let provider = Provider::new(RecordingTransport::new(StatusCode::NOT_FOUND));

        assert!(provider.request(Api::Missing).await.is_ok());

        match provider.request(Api::Strict).await {
            Err(MoyaError::StatusCode(response)) => {
                assert_eq!(response.status_code, StatusCode::NOT_FOUND)
            }
            other => panic!("Expected StatusCode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mapping_failure_skips_transport() {
        let provider = Provider::new(RecordingTransport::new(StatusCode::OK));

        let result = provider.request(Api::Broken).await;
        assert!(matches!(result, Err(MoyaError::EncodableMapping(_))));
        assert!(provider.transport().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_continuation_is_request_mapping() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .request_closure(|_endpoint, _done| {})
            .build();

        let result = provider.request(Api::Users).await;
        match result {
            Err(MoyaError::RequestMapping(url)) => assert_eq!(url, "https://api.example.com/users"),
            other => panic!("Expected RequestMapping, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_asynchronous_continuation() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .request_closure(|endpoint, done| {
                let endpoint = endpoint.clone();
                std::thread::spawn(move || done(endpoint.url_request()));
            })
            .build();

        assert!(provider.request(Api::Users).await.is_ok());
    }

    #[tokio::test]
    async fn test_deferred_by_default() {
        let provider = Provider::new(RecordingTransport::new(StatusCode::OK));

        let pending = provider.request(Api::Users);
        assert!(!pending.is_started());
        tokio::task::yield_now().await;
        assert!(provider.transport().calls.lock().unwrap().is_empty());

        pending.await.unwrap();
        assert_eq!(provider.transport().calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_start_requests_immediately() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .session(SessionConfig::default().start_requests_immediately(true))
            .build();

        let pending = provider.request(Api::Users);
        assert!(pending.is_started());
        pending.await.unwrap();
        assert_eq!(provider.transport().calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_start_without_runtime_stays_deferred() {
        let provider: Provider<Api, _> = Provider::builder(RecordingTransport::new(StatusCode::OK))
            .session(SessionConfig::default().start_requests_immediately(true))
            .build();

        let pending = provider.request(Api::Users);
        assert!(!pending.is_started());
    }
}
