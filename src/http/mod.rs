//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality shared by the static file
//! server and the proxy endpoints.

pub mod body;
pub mod cors;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use response::{
    build_501_response, build_options_response, build_redirect_response, build_text_response,
};
