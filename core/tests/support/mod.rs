//! In-memory transport and recording collaborators shared by the pipeline
//! tests. Every side effect lands in one ordered event log so tests can
//! assert the loader/notify/completion sequence.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rsapi_core::{
    ApiClient, ApiError, BusyIndicator, ClientConfig, HttpRequest, HttpResponse, Notifier, Severity,
    Transport, UploadProgress,
};

pub const BASE_URL: &str = "https://api.restful-api.dev/";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Show,
    Hide,
    Sent(String),
    Notify(String, Severity),
    Complete,
}

pub type Log = Arc<Mutex<Vec<Event>>>;

/// What the fake transport does with every request.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(u16, String),
    Fail(ApiError),
    /// Never answers; only cancellation ends the request.
    Hang,
}

pub struct FakeTransport {
    reply: Reply,
    log: Log,
    requests: Mutex<Vec<HttpRequest>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: HttpRequest,
        progress: Option<UploadProgress>,
    ) -> Result<HttpResponse, ApiError> {
        self.log.lock().push(Event::Sent(request.url.clone()));
        self.requests.lock().push(request);
        if let Some(progress) = progress {
            progress(0.5);
            progress(1.0);
        }
        match &self.reply {
            Reply::Respond(status, body) => {
                Ok(HttpResponse { status: *status, headers: Vec::new(), body: body.clone() })
            }
            Reply::Fail(error) => Err(error.clone()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

struct RecordingIndicator(Log);

impl BusyIndicator for RecordingIndicator {
    fn show(&self) {
        self.0.lock().push(Event::Show);
    }

    fn hide(&self) {
        self.0.lock().push(Event::Hide);
    }
}

struct RecordingNotifier(Log);

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.0.lock().push(Event::Notify(message.to_string(), severity));
    }
}

pub struct Harness {
    pub client: ApiClient,
    pub log: Log,
    pub transport: Arc<FakeTransport>,
    pub online: Arc<AtomicBool>,
}

impl Harness {
    pub fn new(reply: Reply) -> Self {
        Self::with_base(reply, BASE_URL)
    }

    pub fn respond(status: u16, body: &str) -> Self {
        Self::new(Reply::Respond(status, body.to_string()))
    }

    pub fn with_base(reply: Reply, base_url: &str) -> Self {
        let log: Log = Arc::default();
        let transport = Arc::new(FakeTransport { reply, log: log.clone(), requests: Mutex::default() });
        let online = Arc::new(AtomicBool::new(true));
        let probe = online.clone();
        let client = ApiClient::builder()
            .config(ClientConfig::builder().base_url(base_url).build())
            .transport(transport.clone())
            .reachability(Arc::new(move || probe.load(Ordering::SeqCst)))
            .indicator(Arc::new(RecordingIndicator(log.clone())))
            .notifier(Arc::new(RecordingNotifier(log.clone())))
            .build()
            .unwrap();
        Self { client, log, transport, online }
    }

    pub fn go_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }

    pub fn record_completion(&self) {
        self.log.lock().push(Event::Complete);
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notify(message, severity) => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.transport.requests.lock().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }
}
