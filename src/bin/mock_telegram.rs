//! Mock Telegram Bot API Server
//!
//! Stands in for api.telegram.org so the relay can be exercised locally.
//!
//! Behavior:
//! 1. Listens on configurable port (default 8081)
//! 2. Accepts `POST /bot<token>/sendMessage` with a JSON body
//! 3. Prints every message it receives, with its parse mode
//! 4. Replies `{"ok":true}` unless told to fail:
//!    - `--reject-markdown`: MarkdownV2 messages get the API's
//!      "can't parse entities" 400, plain ones succeed
//!    - `--fail-with <code>`: every message fails with that error code
//!
//! Usage:
//!   cargo run --bin mock_telegram -- --port 8081 --reject-markdown
//!   TELEGRAM_BOT_TOKEN=1:test TELEGRAM_CHAT_ID=42 cargo run -- -c config/mock.toml

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "mock_telegram")]
#[command(about = "Mock Telegram Bot API for local relay testing")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8081")]
    port: u16,

    /// Reject MarkdownV2 messages with a parse error
    #[arg(long)]
    reject_markdown: bool,

    /// Fail every message with this API error code (401, 429, 500, ...)
    #[arg(long)]
    fail_with: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SendMessage {
    chat_id: serde_json::Value,
    text: String,
    #[serde(default)]
    parse_mode: Option<String>,
}

struct MockState {
    reject_markdown: bool,
    fail_with: Option<u16>,
    received: AtomicU64,
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn api_error(code: u16, description: &str) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, json!({ "ok": false, "error_code": code, "description": description }))
}

fn description_for(code: u16) -> &'static str {
    match code {
        400 => "Bad Request: chat not found",
        401 => "Unauthorized",
        403 => "Forbidden: bot was blocked by the user",
        404 => "Not Found",
        429 => "Too Many Requests: retry after 5",
        _ => "Internal Server Error",
    }
}

async fn handle(req: Request<Incoming>, state: Arc<MockState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    if *req.method() != Method::POST || !path.starts_with("/bot") || !path.ends_with("/sendMessage") {
        println!("[MOCK] {} {} -> 404", req.method(), path);
        return Ok(api_error(404, "Not Found"));
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            eprintln!("[MOCK] Failed to read body: {}", e);
            return Ok(api_error(400, "Bad Request: unreadable body"));
        }
    };

    let message: SendMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("[MOCK] Invalid JSON: {}", e);
            return Ok(api_error(400, "Bad Request: message text is empty"));
        }
    };

    let n = state.received.fetch_add(1, Ordering::Relaxed) + 1;
    let parse_mode = message.parse_mode.as_deref().unwrap_or("plain");
    println!("[MOCK] ---------------- message #{} ----------------", n);
    println!("[MOCK] chat_id={} parse_mode={}", message.chat_id, parse_mode);
    for line in message.text.lines() {
        println!("[MOCK] | {}", line);
    }

    if let Some(code) = state.fail_with {
        println!("[MOCK] -> {} (forced)", code);
        return Ok(api_error(code, description_for(code)));
    }

    if state.reject_markdown && message.parse_mode.as_deref() == Some("MarkdownV2") {
        println!("[MOCK] -> 400 (markdown rejected)");
        return Ok(api_error(
            400,
            "Bad Request: can't parse entities: Character '.' is reserved and must be escaped",
        ));
    }

    println!("[MOCK] -> ok");
    Ok(json_response(
        StatusCode::OK,
        json!({ "ok": true, "result": { "message_id": n, "text": message.text } }),
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fail_with = args.fail_with.map(|code| code.to_string()).unwrap_or_else(|| "-".to_string());
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              Mock Telegram Bot API                       ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║ Port:            {:>5}                                   ║", args.port);
    println!("║ Reject markdown: {:<5}                                   ║", args.reject_markdown);
    println!("║ Fail with:       {:<5}                                   ║", fail_with);
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let state = Arc::new(MockState {
        reject_markdown: args.reject_markdown,
        fail_with: args.fail_with,
        received: AtomicU64::new(0),
    });

    let listener = TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    println!("[MOCK] Waiting for sendMessage calls...");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("[MOCK] Connection error from {}: {}", peer, e);
            }
        });
    }
}
