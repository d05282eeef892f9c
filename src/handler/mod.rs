//! Request handler module
//!
//! Responsible for request routing dispatch: static file serving plus the
//! HTML and image proxy endpoints.

pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
