//! Integration tests for the HTTP endpoint against a real listener

use async_trait::async_trait;
use chrono::FixedOffset;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use valentine_relay::io::http::{serve, INTERNAL_ERROR_BODY};
use valentine_relay::io::{AppContext, MarkupMode, NotificationSink, SinkError};
use valentine_relay::services::VisitRelay;

/// Records every send and answers with a fixed result
struct RecordingSink {
    fail_with: Option<SinkError>,
    sent: Mutex<Vec<(String, MarkupMode)>>,
}

impl RecordingSink {
    fn new(fail_with: Option<SinkError>) -> Arc<Self> {
        Arc::new(Self { fail_with, sent: Mutex::default() })
    }

    fn sent(&self) -> Vec<(String, MarkupMode)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, _chat_id: &str, message: &str, markup: MarkupMode) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push((message.to_string(), markup));
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    async fn start(ctx: AppContext) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(serve(listener, Arc::new(ctx), shutdown_rx));
        Self { addr, shutdown, task }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        self.task.await.unwrap().unwrap();
    }
}

fn utc_plus_two() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn context(relay: VisitRelay, public_dir: &Path) -> AppContext {
    AppContext { relay, public_dir: public_dir.to_path_buf(), trust_forwarded_for: false }
}

fn relay_with(sink: &Arc<RecordingSink>) -> VisitRelay {
    let sink: Arc<dyn NotificationSink> = sink.clone();
    VisitRelay::new(Some(sink), "42", utc_plus_two())
}

/// Delivery runs detached from the request; wait for it to reach the sink
async fn wait_for_sends(sink: &RecordingSink, count: usize) -> Vec<(String, MarkupMode)> {
    for _ in 0..100 {
        let sent = sink.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    sink.sent()
}

#[tokio::test]
async fn test_ping() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(context(VisitRelay::disabled(utc_plus_two()), dir.path())).await;

    let response = reqwest::get(server.url("/ping")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");

    server.stop().await;
}

#[tokio::test]
async fn test_log_visit_without_sink() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(context(VisitRelay::disabled(utc_plus_two()), dir.path())).await;

    let response = reqwest::Client::new().post(server.url("/log-visit")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    server.stop().await;
}

#[tokio::test]
async fn test_log_visit_delivers_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new(None);
    let server = TestServer::start(context(relay_with(&sink), dir.path())).await;

    let response = reqwest::Client::new()
        .post(server.url("/log-visit"))
        .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let sent = wait_for_sends(&sink, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, MarkupMode::MarkdownV2);
    assert!(sent[0].0.contains("127\\.0\\.0\\.1"));
    assert!(sent[0].0.contains("Firefox 121\\.0"));

    server.stop().await;
}

#[tokio::test]
async fn test_log_visit_succeeds_when_sink_fails() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::new(Some(SinkError::Network("connection refused".to_string())));
    let server = TestServer::start(context(relay_with(&sink), dir.path())).await;

    let response = reqwest::Client::new().post(server.url("/log-visit")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_ne!(response.text().await.unwrap(), INTERNAL_ERROR_BODY);

    // Network failures are not retried
    let sent = wait_for_sends(&sink, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sink.sent().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css").join("site.css"), "body{}").unwrap();
    let server = TestServer::start(context(VisitRelay::disabled(utc_plus_two()), dir.path())).await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    assert_eq!(response.text().await.unwrap(), "<h1>hello</h1>");

    let response = reqwest::get(server.url("/css/site.css")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/css; charset=utf-8");

    let response = reqwest::get(server.url("/missing.png")).await.unwrap();
    assert_eq!(response.status(), 404);

    // A directory is not a file
    let response = reqwest::get(server.url("/css")).await.unwrap();
    assert_eq!(response.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_static_traversal_is_refused() {
    let root = tempfile::tempdir().unwrap();
    let public = root.path().join("public");
    std::fs::create_dir(&public).unwrap();
    std::fs::write(root.path().join("secret.txt"), "token").unwrap();
    let server = TestServer::start(context(VisitRelay::disabled(utc_plus_two()), &public)).await;

    // Sent raw: clients normalise `..` away before it reaches the server
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /../secret.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    assert!(reply.starts_with("HTTP/1.1 404"), "{reply}");
    assert!(!reply.contains("token"));

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_method_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(context(VisitRelay::disabled(utc_plus_two()), dir.path())).await;

    let response = reqwest::Client::new().delete(server.url("/ping")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    server.stop().await;
}
