//! The request pipeline: gate, dispatch, classify, complete.
//!
//! # Design
//! [`ApiClient`] is a cheap-to-clone service object holding the config, the
//! transport and the host collaborators behind one `Arc`. Every request goes
//! through the same four stages:
//!
//! 1. **Gate**: the reachability probe runs first. When it fails the user is
//!    warned and nothing else happens: no loader, no completion.
//! 2. **Dispatch**: the loader is shown, the request is registered with the
//!    [`RequestTracker`], built (URL, headers, parameters) and sent. Build
//!    failures short-circuit into the transport-error branch.
//! 3. **Classify**: the loader is hidden exactly once, then transport errors
//!    and non-2xx statuses are reported to the user and completed as
//!    [`Outcome::Error`].
//! 4. **Complete**: 2xx bodies are decoded (typed) or normalized (generic).
//!    A failed typed decode is only logged; the outcome stays
//!    [`Outcome::Success`] with no document and no value.
//!
//! The async methods (`send`, `upload`, ...) return `None` when the gate
//! closed. The `dispatch*` methods spawn the same pipeline on the current
//! Tokio runtime and call the completion closure exactly once, or never when
//! the gate closed.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::collaborators::{
    AlwaysReachable, BusyIndicator, NoIndicator, Notifier, Reachability, Severity, TracingNotifier,
};
use crate::config::ClientConfig;
use crate::decode::decode_typed;
use crate::encoding::{encode_parameters, ParameterEncoding};
use crate::error::ApiError;
use crate::headers::{headers_with_content_type, required_headers};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use crate::multipart::MultipartForm;
use crate::normalize::{normalize_body, object_document, Document};
use crate::params::{ParamValue, Params};
use crate::status::HttpErrorKind;
use crate::tracker::{InFlight, RequestHandle, RequestTracker};
use crate::transport::{ReqwestTransport, Transport, UploadProgress};

/// Warning shown when the reachability probe fails.
pub const OFFLINE_MESSAGE: &str = "Check your internet connection.";
/// Error shown when a 2xx body fits none of the normalized shapes.
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid server response.";

/// Coarse result of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Error,
}

/// What a dispatch that passed the gate resolves to.
#[derive(Debug, Clone)]
pub struct Completion<T = ()> {
    pub outcome: Outcome,
    /// Set only when no HTTP response was obtained.
    pub error: Option<ApiError>,
    /// Generic view of the response body.
    pub document: Option<Document>,
    /// Typed value, for the `*_as` methods.
    pub value: Option<T>,
}

impl<T> Completion<T> {
    fn success(document: Option<Document>, value: Option<T>) -> Self {
        Self { outcome: Outcome::Success, error: None, document, value }
    }

    fn failure(error: Option<ApiError>, document: Option<Document>) -> Self {
        Self { outcome: Outcome::Error, error, document, value: None }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// A JSON or URL-Form request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: HttpMethod,
    endpoint: String,
    params: Params,
    headers: Vec<(String, String)>,
    encoding: Option<ParameterEncoding>,
    show_loader: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Params::new(),
            headers: Vec::new(),
            encoding: None,
            show_loader: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, endpoint)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Add a header. Headers are additive: repeating a name, including the
    /// defaults, sends both values.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Override the verb's default encoding (URL-Form for GET and DELETE,
    /// JSON otherwise).
    pub fn encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn show_loader(mut self, show: bool) -> Self {
        self.show_loader = show;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn effective_encoding(&self) -> ParameterEncoding {
        self.encoding.unwrap_or_else(|| ParameterEncoding::default_for(self.method))
    }
}

/// A `multipart/form-data` POST.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    endpoint: String,
    params: Params,
    headers: Vec<(String, String)>,
    show_loader: bool,
}

impl UploadRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), params: Params::new(), headers: Vec::new(), show_loader: true }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn show_loader(mut self, show: bool) -> Self {
        self.show_loader = show;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// How a 2xx body is turned into a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    /// Three-tier normalization, no typed value.
    Generic,
    /// Typed decode; failures are logged and completed as empty success.
    Typed,
    /// Object document first, typed decode only on top of it.
    Multipart { typed: bool },
}

/// Hides the loader once, on [`LoaderGuard::hide`] or on drop.
struct LoaderGuard {
    indicator: Option<Arc<dyn BusyIndicator>>,
}

impl LoaderGuard {
    fn show(indicator: &Arc<dyn BusyIndicator>, enabled: bool) -> Self {
        if enabled {
            indicator.show();
            Self { indicator: Some(Arc::clone(indicator)) }
        } else {
            Self { indicator: None }
        }
    }

    fn hide(&mut self) {
        if let Some(indicator) = self.indicator.take() {
            indicator.hide();
        }
    }
}

impl Drop for LoaderGuard {
    fn drop(&mut self) {
        self.hide();
    }
}

/// A dispatch that passed the gate.
struct Admitted {
    loader: LoaderGuard,
    in_flight: InFlight,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    reachability: Arc<dyn Reachability>,
    indicator: Arc<dyn BusyIndicator>,
    notifier: Arc<dyn Notifier>,
    tracker: RequestTracker,
}

/// Shared HTTP service object. Clones share the transport, the collaborators
/// and the request tracker.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.tracker.in_flight_count())
            .finish()
    }
}

impl ApiClient {
    /// Client with the given config, a reqwest transport and the headless
    /// default collaborators.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.inner.tracker
    }

    /// Cancel the most recent non-upload request, if it is still tracked.
    pub fn cancel_current(&self) -> bool {
        self.inner.tracker.cancel_current()
    }

    /// Cancel everything in flight, uploads included.
    pub fn cancel_all(&self) -> usize {
        self.inner.tracker.cancel_all()
    }

    /// Run `request` and normalize the 2xx body into a generic document.
    pub async fn send(&self, request: ApiRequest) -> Option<Completion> {
        let admitted = self.inner.admit(request.show_loader, true)?;
        Some(self.inner.run_flat(admitted, request, BodyMode::Generic).await)
    }

    /// Run `request` and decode the 2xx body into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Option<Completion<T>> {
        let admitted = self.inner.admit(request.show_loader, true)?;
        Some(self.inner.run_flat(admitted, request, BodyMode::Typed).await)
    }

    /// Run a multipart upload, reporting the fraction sent to `progress`.
    pub async fn upload(
        &self,
        request: UploadRequest,
        progress: Option<UploadProgress>,
    ) -> Option<Completion> {
        let admitted = self.inner.admit(request.show_loader, false)?;
        Some(
            self.inner
                .run_upload(admitted, request, progress, BodyMode::Multipart { typed: false })
                .await,
        )
    }

    pub async fn upload_as<T: DeserializeOwned>(
        &self,
        request: UploadRequest,
        progress: Option<UploadProgress>,
    ) -> Option<Completion<T>> {
        let admitted = self.inner.admit(request.show_loader, false)?;
        Some(
            self.inner
                .run_upload(admitted, request, progress, BodyMode::Multipart { typed: true })
                .await,
        )
    }

    /// Spawn [`ApiClient::send`] and hand its completion to `on_complete`.
    ///
    /// Returns the request handle, or `None` when the gate closed; in that
    /// case `on_complete` is dropped without being called. Must be called
    /// from within a Tokio runtime.
    pub fn dispatch<F>(&self, request: ApiRequest, on_complete: F) -> Option<RequestHandle>
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.spawn_flat::<(), F>(request, BodyMode::Generic, on_complete)
    }

    pub fn dispatch_as<T, F>(&self, request: ApiRequest, on_complete: F) -> Option<RequestHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        self.spawn_flat::<T, F>(request, BodyMode::Typed, on_complete)
    }

    pub fn dispatch_upload<F>(
        &self,
        request: UploadRequest,
        progress: Option<UploadProgress>,
        on_complete: F,
    ) -> Option<RequestHandle>
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        self.spawn_upload::<(), F>(request, progress, false, on_complete)
    }

    pub fn dispatch_upload_as<T, F>(
        &self,
        request: UploadRequest,
        progress: Option<UploadProgress>,
        on_complete: F,
    ) -> Option<RequestHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        self.spawn_upload::<T, F>(request, progress, true, on_complete)
    }

    fn spawn_flat<T, F>(&self, request: ApiRequest, mode: BodyMode, on_complete: F) -> Option<RequestHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        let admitted = self.inner.admit(request.show_loader, true)?;
        let handle = admitted.in_flight.handle().clone();
        let Ok(runtime) = Handle::try_current() else {
            on_complete(self.inner.complete_without_runtime(admitted, mode));
            return Some(handle);
        };
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let completion = inner.run_flat(admitted, request, mode).await;
            on_complete(completion);
        });
        Some(handle)
    }

    fn spawn_upload<T, F>(
        &self,
        request: UploadRequest,
        progress: Option<UploadProgress>,
        typed: bool,
        on_complete: F,
    ) -> Option<RequestHandle>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        let admitted = self.inner.admit(request.show_loader, false)?;
        let handle = admitted.in_flight.handle().clone();
        let mode = BodyMode::Multipart { typed };
        let Ok(runtime) = Handle::try_current() else {
            on_complete(self.inner.complete_without_runtime(admitted, mode));
            return Some(handle);
        };
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let completion = inner.run_upload(admitted, request, progress, mode).await;
            on_complete(completion);
        });
        Some(handle)
    }
}

impl ClientInner {
    /// Gate, then loader and registration.
    fn admit(&self, show_loader: bool, track_current: bool) -> Option<Admitted> {
        if !self.reachability.is_reachable() {
            debug!("network unreachable, request not dispatched");
            self.notifier.notify(OFFLINE_MESSAGE, Severity::Warning);
            return None;
        }
        let loader = LoaderGuard::show(&self.indicator, show_loader);
        let in_flight = self.tracker.register(track_current);
        Some(Admitted { loader, in_flight })
    }

    async fn run_flat<T: DeserializeOwned>(
        &self,
        admitted: Admitted,
        request: ApiRequest,
        mode: BodyMode,
    ) -> Completion<T> {
        let built = self.build_flat(&request);
        let result = self.exchange(&admitted, built, None).await;
        self.complete(admitted, result, mode)
    }

    async fn run_upload<T: DeserializeOwned>(
        &self,
        admitted: Admitted,
        request: UploadRequest,
        progress: Option<UploadProgress>,
        mode: BodyMode,
    ) -> Completion<T> {
        let built = self.build_upload(&request).await;
        let result = self.exchange(&admitted, built, progress).await;
        self.complete(admitted, result, mode)
    }

    fn build_flat(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let encoding = request.effective_encoding();
        let encoded = encode_parameters(request.method, encoding, &request.params)?;
        let url = build_url(&self.config.resolve(&request.endpoint), encoded.query.as_deref())?;
        debug!(
            method = %request.method,
            %url,
            ?encoding,
            params = request.params.len(),
            "built request"
        );
        Ok(HttpRequest {
            method: request.method,
            url,
            headers: required_headers(&request.headers, encoding),
            body: encoded.body,
        })
    }

    async fn build_upload(&self, request: &UploadRequest) -> Result<HttpRequest, ApiError> {
        let url = build_url(&self.config.resolve(&request.endpoint), None)?;
        let form = MultipartForm::from_params(&request.params, self.config.jpeg_quality).await;
        let body = form.encode();
        debug!(%url, parts = form.parts().len(), bytes = body.len(), "built multipart request");
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: headers_with_content_type(&request.headers, &form.content_type()),
            body: RequestBody::Multipart(body),
        })
    }

    async fn exchange(
        &self,
        admitted: &Admitted,
        built: Result<HttpRequest, ApiError>,
        progress: Option<UploadProgress>,
    ) -> Result<HttpResponse, ApiError> {
        let request = built?;
        let handle = admitted.in_flight.handle();
        let token = handle.token().clone();
        let url = request.url.clone();
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!(id = %handle.id(), %url, "request cancelled");
                Err(ApiError::Cancelled)
            }
            result = self.transport.send(request, progress) => result,
        }
    }

    /// Completes through the transport-error branch when no Tokio runtime
    /// is available to run the exchange on.
    fn complete_without_runtime<T: DeserializeOwned>(&self, admitted: Admitted, mode: BodyMode) -> Completion<T> {
        error!("dispatch called outside a Tokio runtime");
        self.complete(admitted, Err(ApiError::NoRuntime), mode)
    }

    fn complete<T: DeserializeOwned>(
        &self,
        mut admitted: Admitted,
        result: Result<HttpResponse, ApiError>,
        mode: BodyMode,
    ) -> Completion<T> {
        admitted.loader.hide();
        drop(admitted.in_flight);

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, "no response received");
                self.notify_error(HttpErrorKind::Unknown.message());
                // No body exists without a response.
                return Completion::failure(Some(error), None);
            }
        };
        debug!(status = response.status, body = %response.body, "response received");

        if !response.is_success() {
            let kind = HttpErrorKind::from_status(response.status);
            self.notify_error(kind.message());
            return Completion::failure(None, object_document(&response.body));
        }

        match mode {
            BodyMode::Generic => self.complete_generic(&response.body),
            BodyMode::Typed => match decode_typed::<T>(&response.body) {
                Ok(decoded) => Completion::success(decoded.document, Some(decoded.value)),
                Err(failure) => {
                    warn!(
                        kind = %failure.kind,
                        path = %failure.path,
                        line = failure.line,
                        column = failure.column,
                        message = %failure.message,
                        "typed decode failed"
                    );
                    Completion::success(None, None)
                }
            },
            BodyMode::Multipart { typed } => match object_document(&response.body) {
                Some(document) => {
                    let value = if typed {
                        match decode_typed::<T>(&response.body) {
                            Ok(decoded) => Some(decoded.value),
                            Err(failure) => {
                                warn!(
                                    kind = %failure.kind,
                                    path = %failure.path,
                                    message = %failure.message,
                                    "typed decode of upload response failed"
                                );
                                None
                            }
                        }
                    } else {
                        None
                    };
                    Completion::success(Some(document), value)
                }
                None => self.complete_generic(&response.body),
            },
        }
    }

    fn complete_generic<T>(&self, body: &str) -> Completion<T> {
        match normalize_body(body) {
            Some(document) => Completion::success(Some(document), None),
            None => {
                warn!(body_len = body.len(), "unparseable success body");
                self.notify_error(INVALID_RESPONSE_MESSAGE);
                Completion::failure(None, None)
            }
        }
    }

    fn notify_error(&self, message: &str) {
        self.notifier.notify(message, Severity::Error);
    }
}

/// Parse the resolved endpoint and append `query` to any existing query.
fn build_url(resolved: &str, query: Option<&str>) -> Result<String, ApiError> {
    let mut url = url::Url::parse(resolved)?;
    if let Some(query) = query {
        let joined = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
            _ => query.to_string(),
        };
        url.set_query(Some(&joined));
    }
    Ok(url.into())
}

/// Composes an [`ApiClient`]. Unset parts fall back to the headless
/// defaults and a [`ReqwestTransport`] built from the config.
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    reachability: Option<Arc<dyn Reachability>>,
    indicator: Option<Arc<dyn BusyIndicator>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn reachability(mut self, reachability: Arc<dyn Reachability>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    pub fn indicator(mut self, indicator: Arc<dyn BusyIndicator>) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };
        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                config,
                transport,
                reachability: self.reachability.unwrap_or_else(|| Arc::new(AlwaysReachable)),
                indicator: self.indicator.unwrap_or_else(|| Arc::new(NoIndicator)),
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                tracker: RequestTracker::new(),
            }),
        })
    }
}
