//! `ReqwestTransport` against a wiremock server: what actually goes over the
//! wire, and how transport failures are mapped.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use rsapi_core::multipart::{FormPart, MultipartForm};
use rsapi_core::transport::UPLOAD_CHUNK_SIZE;
use rsapi_core::{
    ApiError, ClientConfig, HttpMethod, HttpRequest, RequestBody, ReqwestTransport, Transport,
    UploadProgress,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(timeout: Duration) -> ReqwestTransport {
    ReqwestTransport::new(&ClientConfig::builder().timeout(timeout).user_agent("rsapi-tests").build())
        .unwrap()
}

fn request(method: HttpMethod, url: String, body: RequestBody) -> HttpRequest {
    HttpRequest { method, url, headers: Vec::new(), body }
}

#[tokio::test]
async fn non_success_status_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"gone"}"#))
        .mount(&server)
        .await;

    let response = transport(Duration::from_secs(5))
        .send(request(HttpMethod::Get, format!("{}/missing", server.uri()), RequestBody::Empty), None)
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.body, r#"{"error":"gone"}"#);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = transport(Duration::from_millis(200))
        .send(request(HttpMethod::Get, format!("{}/slow", server.uri()), RequestBody::Empty), None)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Timeout);
}

#[tokio::test]
async fn duplicate_headers_and_user_agent_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let mut req = request(
        HttpMethod::Post,
        format!("{}/echo", server.uri()),
        RequestBody::Json(r#"{"a":1}"#.into()),
    );
    req.headers = vec![
        ("Accept".into(), "application/json".into()),
        ("Content-Type".into(), "application/json".into()),
        ("Content-Type".into(), "text/plain".into()),
    ];
    transport(Duration::from_secs(5)).send(req, None).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let sent = &received[0];
    let content_types: Vec<_> = sent
        .headers
        .get_all("content-type")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(content_types, vec!["application/json", "text/plain"]);
    assert_eq!(sent.headers.get("user-agent").unwrap(), "rsapi-tests");
    assert_eq!(sent.body, br#"{"a":1}"#);
}

#[tokio::test]
async fn query_is_sent_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/objects"))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let response = transport(Duration::from_secs(5))
        .send(
            request(HttpMethod::Delete, format!("{}/objects?id=7", server.uri()), RequestBody::Empty),
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn multipart_body_streams_with_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&server)
        .await;

    let mut form = MultipartForm::new();
    form.push(FormPart::file(
        "blob",
        "1.000001.jpeg",
        "image/jpeg",
        Bytes::from(vec![0xAB; UPLOAD_CHUNK_SIZE * 3]),
    ));
    let encoded = form.encode();

    let seen = Arc::new(Mutex::new(Vec::<f64>::new()));
    let sink = seen.clone();
    let progress: UploadProgress = Arc::new(move |f: f64| sink.lock().push(f));

    let mut req = request(
        HttpMethod::Post,
        format!("{}/upload", server.uri()),
        RequestBody::Multipart(encoded.clone()),
    );
    req.headers = vec![("Content-Type".into(), form.content_type())];
    let response = transport(Duration::from_secs(5)).send(req, Some(progress)).await.unwrap();
    assert_eq!(response.status, 200);

    let seen = seen.lock();
    assert!(seen.len() >= 4);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*seen.last().unwrap(), 1.0);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, encoded.to_vec());
    assert_eq!(
        received[0].headers.get("content-length").unwrap().to_str().unwrap(),
        encoded.len().to_string()
    );
}

#[tokio::test]
async fn malformed_header_fails_before_sending() {
    let server = MockServer::start().await;
    let mut req = request(HttpMethod::Get, server.uri(), RequestBody::Empty);
    req.headers = vec![("Bad Header".into(), "x".into())];
    let err = transport(Duration::from_secs(5)).send(req, None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidHeader(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
