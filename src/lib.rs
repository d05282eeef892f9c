//! Local development HTTP server.
//!
//! Serves static files from a root directory and proxies HTML and image
//! fetches to external URLs, adding permissive CORS headers to every response
//! so a browser app can use it without same-origin restrictions.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
