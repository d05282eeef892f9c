//! Static file serving module
//!
//! Serves files below the configured root: index files and generated listings
//! for directories, trailing-slash redirects, and 403 for any path that would
//! leave the root.

use crate::error::StaticFileError;
use crate::handler::router::RequestContext;
use crate::http::response::{build_file_response, build_html_response, build_text_response};
use crate::http::{build_redirect_response, mime, ResponseBody};
use crate::logger;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};
use tokio::fs;

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Characters left unescaped in listing links
const LINK_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Serve the request path from `root`
pub async fn serve(ctx: &RequestContext<'_>, root: &Path) -> Response<ResponseBody> {
    match serve_path(ctx, root).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                StaticFileError::Forbidden => {
                    logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
                }
                StaticFileError::Io(e) => {
                    logger::log_error(&format!("Failed to read '{}': {e}", ctx.path));
                }
                StaticFileError::NotFound => {}
            }
            build_text_response(err.status(), err.client_message())
        }
    }
}

async fn serve_path(
    ctx: &RequestContext<'_>,
    root: &Path,
) -> Result<Response<ResponseBody>, StaticFileError> {
    let file_path = resolve_path(root, ctx.path)?;
    let metadata = fs::metadata(&file_path).await?;

    if metadata.is_dir() {
        if !ctx.path.ends_with('/') {
            // A leading `//` would make the Location protocol-relative
            let path = ctx.path.trim_start_matches('/');
            let location = match ctx.query {
                Some(q) => format!("/{path}/?{q}"),
                None => format!("/{path}/"),
            };
            return Ok(build_redirect_response(&location));
        }
        for index in INDEX_FILES {
            let index_path = file_path.join(index);
            if let Ok(index_meta) = fs::metadata(&index_path).await {
                if index_meta.is_file() {
                    return serve_file(&index_path, &index_meta, ctx.is_head).await;
                }
            }
        }
        let listing = render_listing(&file_path, &decode_path(ctx.path)).await?;
        return Ok(build_html_response(Bytes::from(listing), ctx.is_head));
    }

    // A trailing slash names a directory, never a file
    if ctx.path.ends_with('/') {
        return Err(StaticFileError::NotFound);
    }
    serve_file(&file_path, &metadata, ctx.is_head).await
}

async fn serve_file(
    path: &Path,
    metadata: &std::fs::Metadata,
    is_head: bool,
) -> Result<Response<ResponseBody>, StaticFileError> {
    let content = fs::read(path).await?;
    let content_type = mime::content_type_for(path);
    let last_modified = metadata.modified().ok().map(http_date);

    Ok(build_file_response(
        Bytes::from(content),
        content_type,
        last_modified.as_deref(),
        is_head,
    ))
}

/// Map a request path onto the filesystem, confined to `root`.
///
/// `root` must already be canonical.
pub fn resolve_path(root: &Path, request_path: &str) -> Result<PathBuf, StaticFileError> {
    let decoded = decode_path(request_path);

    let mut file_path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(StaticFileError::Forbidden),
            s if s.contains('\0') || s.contains('\\') => return Err(StaticFileError::Forbidden),
            s => file_path.push(s),
        }
    }

    // Symlinks may still point outside the root
    let canonical = file_path.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StaticFileError::NotFound,
        _ => StaticFileError::Io(e),
    })?;
    if !canonical.starts_with(root) {
        return Err(StaticFileError::Forbidden);
    }
    Ok(canonical)
}

fn decode_path(request_path: &str) -> String {
    percent_decode_str(request_path)
        .decode_utf8_lossy()
        .into_owned()
}

/// Render an HTML index of `dir`, entries sorted case-insensitively
async fn render_listing(dir: &Path, display_path: &str) -> Result<String, StaticFileError> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_link = entry.file_type().await.is_ok_and(|t| t.is_symlink());
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        entries.push((name, is_dir, is_link));
    }
    entries.sort_by_key(|(name, _, _)| name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (name, is_dir, is_link) in entries {
        let mut link = name.clone();
        if is_dir {
            link.push('/');
        }
        let display = if is_link {
            format!("{name}@")
        } else {
            link.clone()
        };
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            utf8_percent_encode(&link, LINK_SAFE),
            escape_html(&display)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
fn http_date(time: std::time::SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_TYPE, LAST_MODIFIED, LOCATION};
    use hyper::StatusCode;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("hello.txt"), "hello world").unwrap();
        std::fs::write(root.join("Logo.PNG"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::create_dir(root.join("site")).unwrap();
        std::fs::write(root.join("site").join("index.html"), "<h1>site</h1>").unwrap();
        std::fs::create_dir(root.join("assets")).unwrap();
        std::fs::write(root.join("assets").join("b & c.css"), "body{}").unwrap();
        std::fs::write(root.join("assets").join("A.js"), "1").unwrap();
        std::fs::create_dir(root.join("assets").join("img")).unwrap();
        (dir, root)
    }

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            query: None,
            is_head: false,
        }
    }

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_dir, root) = fixture();
        assert!(matches!(
            resolve_path(&root, "/../etc/passwd"),
            Err(StaticFileError::Forbidden)
        ));
        assert!(matches!(
            resolve_path(&root, "/site/%2e%2e/%2e%2e/secret"),
            Err(StaticFileError::Forbidden)
        ));
        assert!(matches!(
            resolve_path(&root, "/a%00b"),
            Err(StaticFileError::Forbidden)
        ));
    }

    #[test]
    fn test_resolve_existing_and_missing() {
        let (_dir, root) = fixture();
        assert_eq!(
            resolve_path(&root, "/hello.txt").unwrap(),
            root.join("hello.txt")
        );
        assert_eq!(resolve_path(&root, "/").unwrap(), root);
        assert!(matches!(
            resolve_path(&root, "/missing.txt"),
            Err(StaticFileError::NotFound)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (_dir, root) = fixture();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "nope").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("escape")).unwrap();

        assert!(matches!(
            resolve_path(&root, "/escape/secret.txt"),
            Err(StaticFileError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_serve_file_with_content_type() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/hello.txt"), &root).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert!(response.headers()[LAST_MODIFIED]
            .to_str()
            .unwrap()
            .ends_with(" GMT"));
        assert_eq!(body_string(response).await, "hello world");

        let response = serve(&ctx("/Logo.PNG"), &root).await;
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/nope.html"), &root).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = serve(&ctx("/hello.txt/"), &root).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_403() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/../../etc/passwd"), &root).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_directory_redirects_to_slash() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/site"), &root).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/site/");

        let with_query = RequestContext {
            path: "/site",
            query: Some("v=2"),
            is_head: false,
        };
        let response = serve(&with_query, &root).await;
        assert_eq!(response.headers()[LOCATION], "/site/?v=2");
    }

    #[tokio::test]
    async fn test_redirect_collapses_leading_slashes() {
        let (_dir, root) = fixture();
        std::fs::create_dir(root.join("evil.example")).unwrap();

        let response = serve(&ctx("//evil.example"), &root).await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/evil.example/");

        let with_query = RequestContext {
            path: "///site",
            query: Some("v=2"),
            is_head: false,
        };
        let response = serve(&with_query, &root).await;
        assert_eq!(response.headers()[LOCATION], "/site/?v=2");
    }

    #[tokio::test]
    async fn test_directory_serves_index() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/site/"), &root).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(response).await, "<h1>site</h1>");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let (_dir, root) = fixture();
        let response = serve(&ctx("/assets/"), &root).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;

        assert!(html.contains("<title>Directory listing for /assets/</title>"));
        assert!(html.contains("<a href=\"b%20%26%20c.css\">b &amp; c.css</a>"));
        assert!(html.contains("<a href=\"img/\">img/</a>"));
        // Case-insensitive ordering: A.js, b & c.css, img/
        let a = html.find("A.js").unwrap();
        let b = html.find("b &amp; c.css").unwrap();
        let img = html.find("img/").unwrap();
        assert!(a < b && b < img);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_listing_marks_symlinks() {
        let (_dir, root) = fixture();
        let assets = root.join("assets");
        std::os::unix::fs::symlink(assets.join("img"), assets.join("pics")).unwrap();
        std::os::unix::fs::symlink(assets.join("A.js"), assets.join("main.js")).unwrap();

        let html = body_string(serve(&ctx("/assets/"), &root).await).await;
        assert!(html.contains("<a href=\"pics/\">pics@</a>"));
        assert!(html.contains("<a href=\"main.js\">main.js@</a>"));
        assert!(html.contains("<a href=\"img/\">img/</a>"));
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, root) = fixture();
        let head = RequestContext {
            path: "/hello.txt",
            query: None,
            is_head: true,
        };
        let response = serve(&head, &root).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-length"], "11");
        assert!(body_string(response).await.is_empty());
    }

    #[test]
    fn test_http_date_format() {
        let epoch = std::time::UNIX_EPOCH + std::time::Duration::from_secs(784_111_777);
        assert_eq!(http_date(epoch), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
