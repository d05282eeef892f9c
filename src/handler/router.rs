//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method check, path dispatch,
//! CORS header injection and access logging.

use crate::config::AppState;
use crate::handler::{proxy, static_files};
use crate::http::{self, cors, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::body::Body;
use hyper::header::{REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
}

/// Main entry point for HTTP request handling.
///
/// The request body is never read; any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();

    let response = route_request(&parts.method, &parts.uri, &state).await;
    let response = cors::with_cors(response);

    if state.access_log_enabled() {
        let mut entry = AccessLogEntry::new(
            remote_addr.to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact();
        entry.referer = header_string(&parts.headers, REFERER);
        entry.user_agent = header_string(&parts.headers, USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request(
    method: &Method,
    uri: &hyper::Uri,
    state: &AppState,
) -> Response<ResponseBody> {
    let ctx = RequestContext {
        path: uri.path(),
        query: uri.query(),
        is_head: *method == Method::HEAD,
    };

    match *method {
        // Preflight: answered before any routing
        Method::OPTIONS => http::build_options_response(),
        Method::GET => match proxy::endpoint(ctx.path) {
            Some(kind) => proxy::serve(kind, state, ctx.query).await,
            None => static_files::serve(&ctx, &state.root).await,
        },
        Method::HEAD => static_files::serve(&ctx, &state.root).await,
        _ => {
            logger::log_warning(&format!("Method not implemented: {method}"));
            http::build_501_response(method)
        }
    }
}

fn header_string(headers: &hyper::HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
