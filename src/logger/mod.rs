//! Logger module
//!
//! Provides logging utilities for the dev server including:
//! - Startup banner and shutdown message
//! - Per-request access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    let host = if addr.ip().is_unspecified() {
        "localhost".to_string()
    } else {
        addr.ip().to_string()
    };
    let base = format!("http://{host}:{}", addr.port());

    write_info("============================================================");
    write_info("CORS dev server");
    write_info("============================================================");
    write_info(&format!("Server running at: {base}"));
    write_info(&format!("Listening on: {addr}"));
    write_info(&format!("Serving files from: {}", root.display()));
    write_info("");
    write_info("Open your browser and navigate to:");
    write_info(&format!("   {base}/index.html"));
    write_info("");
    write_info("Proxy endpoints available:");
    write_info("   - /proxy/html?url=<URL>  (Fetch HTML content)");
    write_info("   - /proxy/image?url=<URL> (Fetch images)");
    write_info(&format!(
        "   upstream timeout: {} ms, max redirects: {}",
        config.proxy.timeout_ms, config.proxy.max_redirects
    ));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("");
    write_info("Press Ctrl+C to stop the server");
    write_info("============================================================\n");
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[{signal}] Server stopped. Goodbye!"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_info(&format.render(entry));
}
