//! HTTP endpoint
//!
//! Routes:
//! - `GET /ping` - liveness probe, always `200 OK`
//! - `POST /log-visit` - hands the visit to the relay and answers `200`
//!   without waiting for the notification
//! - `GET /<path>` - static files from the public directory (`/` → `index.html`)
//!
//! Uses hyper for the HTTP server. Handler errors become a generic `500`.

use crate::domain::visit::VisitEvent;
use crate::infra::config::Config;
use crate::services::relay::VisitRelay;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Body of every unexpected-failure response
pub const INTERNAL_ERROR_BODY: &str = "Извините, что-то пошло не так.";

/// Everything a request handler needs, built once at startup
pub struct AppContext {
    pub relay: VisitRelay,
    pub public_dir: PathBuf,
    pub trust_forwarded_for: bool,
}

impl AppContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            relay: VisitRelay::from_config(config),
            public_dir: config.public_dir().to_path_buf(),
            trust_forwarded_for: config.trust_forwarded_for(),
        }
    }
}

type HttpResponse = Response<Full<Bytes>>;

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

fn not_found() -> HttpResponse {
    text_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Log a failed request (cold path)
#[cold]
fn log_request_failed(method: &Method, path: &str, peer: SocketAddr, e: &anyhow::Error) {
    error!(
        method = %method,
        path = %path,
        peer = %peer,
        error = %e,
        chain = ?e.chain().skip(1).map(|cause| cause.to_string()).collect::<Vec<_>>(),
        "http_request_failed"
    );
}

/// Visitor address: first `X-Forwarded-For` hop when trusted, else the peer
pub fn client_address(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }
    peer.ip().to_string()
}

/// Map a request path onto a file under `public_dir`.
/// Anything other than plain path segments (`..`, roots, prefixes) is refused.
pub fn resolve_static_path(public_dir: &Path, uri_path: &str) -> Option<PathBuf> {
    let relative = uri_path.trim_start_matches('/');
    let relative = if relative.is_empty() { "index.html" } else { relative };

    let mut resolved = public_dir.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn serve_static(public_dir: &Path, uri_path: &str) -> anyhow::Result<HttpResponse> {
    let Some(path) = resolve_static_path(public_dir, uri_path) else {
        return Ok(not_found());
    };

    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Ok(not_found()),
    }

    let contents = tokio::fs::read(&path).await?;
    let mut response = Response::new(Full::new(Bytes::from(contents)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type_for(&path)));
    Ok(response)
}

fn log_visit(headers: &HeaderMap, peer: SocketAddr, ctx: &AppContext) -> HttpResponse {
    let address = client_address(headers, peer, ctx.trust_forwarded_for);
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok()).map(str::to_string);

    // Delivery continues on its own task; the handle is not awaited
    let _delivery = ctx.relay.handle_visit(VisitEvent::new(address, user_agent));

    text_response(StatusCode::OK, "OK")
}

async fn route(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    peer: SocketAddr,
    ctx: &AppContext,
) -> anyhow::Result<HttpResponse> {
    match (method, path) {
        (&Method::GET, "/ping") => Ok(text_response(StatusCode::OK, "OK")),
        (&Method::POST, "/log-visit") => Ok(log_visit(headers, peer, ctx)),
        (&Method::GET, _) => serve_static(&ctx.public_dir, path).await,
        _ => Ok(not_found()),
    }
}

/// Route one request; never fails, errors become a 500
pub async fn handle_request<B>(
    req: Request<B>,
    peer: SocketAddr,
    ctx: Arc<AppContext>,
) -> Result<HttpResponse, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = route(&method, &path, req.headers(), peer, &ctx).await;
    Ok(finish_request(&method, &path, peer, result))
}

/// Turn a handler result into the response; failures become a logged 500
fn finish_request(
    method: &Method,
    path: &str,
    peer: SocketAddr,
    result: anyhow::Result<HttpResponse>,
) -> HttpResponse {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            log_request_failed(method, path, peer, &e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
        }
    };

    debug!(method = %method, path = %path, status = %response.status().as_u16(), "http_request");
    response
}

/// Accept connections on an already-bound listener until shutdown
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<AppContext>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        let ctx = ctx.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let ctx = ctx.clone();
                                async move { handle_request(req, peer, ctx).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                debug!(error = %e, peer = %peer, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Bind the configured address and serve
pub async fn start_http_server(
    config: &Config,
    ctx: Arc<AppContext>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.bind_address(), config.port());
    let listener = TcpListener::bind(&addr).await?;

    info!(addr = %addr, public_dir = %ctx.public_dir.display(), "http_server_started");

    serve(listener, ctx, shutdown).await
}
