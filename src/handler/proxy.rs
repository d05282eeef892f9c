//! Proxy endpoints
//!
//! `/proxy/html` buffers the upstream document and relays it as HTML.
//! `/proxy/image` relays the upstream body chunk by chunk, keeping its
//! content type. Failures never escape: they become 400/500 text responses.

use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Response;
use url::form_urlencoded;

use crate::config::AppState;
use crate::error::{ProxyError, ProxyKind};
use crate::http::response::{build_html_response, build_stream_response, build_text_response};
use crate::http::{body, ResponseBody};
use crate::logger;

pub const HTML_PATH: &str = "/proxy/html";
pub const IMAGE_PATH: &str = "/proxy/image";

/// Map a request path to the proxy endpoint it names
pub fn endpoint(path: &str) -> Option<ProxyKind> {
    match path {
        HTML_PATH => Some(ProxyKind::Html),
        IMAGE_PATH => Some(ProxyKind::Image),
        _ => None,
    }
}

/// Run a proxy endpoint and convert any failure into a response
pub async fn serve(
    kind: ProxyKind,
    state: &AppState,
    query: Option<&str>,
) -> Response<ResponseBody> {
    let result = match kind {
        ProxyKind::Html => proxy_html(state, query).await,
        ProxyKind::Image => proxy_image(state, query).await,
    };
    result.unwrap_or_else(|err| error_response(&err, query))
}

/// Extract the `url` query parameter.
///
/// Values are percent-decoded; blank values are ignored and the first
/// non-blank one wins.
pub fn target_url(query: Option<&str>) -> Result<String, ProxyError> {
    let query = query.ok_or(ProxyError::MissingParameter)?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "url" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .ok_or(ProxyError::MissingParameter)
}

pub async fn proxy_html(
    state: &AppState,
    query: Option<&str>,
) -> Result<Response<ResponseBody>, ProxyError> {
    let target = target_url(query)?;
    let upstream = fetch(&state.client, &target, ProxyKind::Html).await?;
    let content = read_body(upstream, state.config.proxy.max_html_bytes).await?;
    Ok(build_html_response(content, false))
}

pub async fn proxy_image(
    state: &AppState,
    query: Option<&str>,
) -> Result<Response<ResponseBody>, ProxyError> {
    let proxy = &state.config.proxy;
    let target = target_url(query)?;
    let upstream = fetch(&state.client, &target, ProxyKind::Image).await?;

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .or_else(|| HeaderValue::from_str(&proxy.default_image_type).ok())
        .unwrap_or_else(|| HeaderValue::from_static("image/jpeg"));

    let body = body::relay(upstream.bytes_stream(), proxy.chunk_size);
    Ok(build_stream_response(content_type, body)?)
}

/// GET `target`, treating non-2xx statuses as failures
async fn fetch(
    client: &reqwest::Client,
    target: &str,
    kind: ProxyKind,
) -> Result<reqwest::Response, ProxyError> {
    client
        .get(target)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|source| ProxyError::upstream(kind, source))
}

/// Buffer the whole upstream body, enforcing `limit` when set
async fn read_body(
    mut upstream: reqwest::Response,
    limit: Option<u64>,
) -> Result<Bytes, ProxyError> {
    let kind = ProxyKind::Html;
    let Some(limit) = limit else {
        return upstream
            .bytes()
            .await
            .map_err(|source| ProxyError::upstream(kind, source));
    };

    if upstream.content_length().is_some_and(|len| len > limit) {
        return Err(ProxyError::UpstreamTooLarge { kind, limit });
    }

    let mut buf = Vec::new();
    while let Some(chunk) = upstream
        .chunk()
        .await
        .map_err(|source| ProxyError::upstream(kind, source))?
    {
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(ProxyError::UpstreamTooLarge { kind, limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn error_response(err: &ProxyError, query: Option<&str>) -> Response<ResponseBody> {
    match err {
        ProxyError::MissingParameter => {
            logger::log_warning(&format!("Proxy request rejected: {err}"));
        }
        _ => logger::log_error(&format!(
            "Proxy request failed ({}): {err}",
            query.unwrap_or("")
        )),
    }
    build_text_response(err.status(), &err.to_string())
}
