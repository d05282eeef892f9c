//! Access log line rendering
//!
//! `combined` and `common` follow the Apache/Nginx layouts, `json` emits one
//! object per line and anything else is treated as a `$variable` pattern.

use chrono::Local;
use serde::Deserialize;
use serde_json::json;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request, captured after the response has been built
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub http_version: String,
    pub status: u16,
    /// `None` for streamed bodies of unknown length
    pub body_bytes: Option<u64>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create an entry stamped with the current local time
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: None,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn request_line(&self) -> String {
        format!(
            "{} {} HTTP/{}",
            self.method,
            self.request_uri(),
            self.http_version
        )
    }

    fn body_bytes_display(&self) -> String {
        self.body_bytes
            .map_or_else(|| "-".to_string(), |n| n.to_string())
    }

    #[allow(clippy::cast_precision_loss)]
    fn request_time_secs(&self) -> f64 {
        self.request_time_us as f64 / 1_000_000.0
    }

    /// Value of a single `$variable`, `None` when the name is unknown
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(CLF_TIME).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => self.request_line(),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes_display(),
            "http_referer" => self.referer.clone().unwrap_or_else(|| "-".to_string()),
            "http_user_agent" => self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            "request_time" => format!("{:.3}", self.request_time_secs()),
            _ => return None,
        };
        Some(value)
    }
}

/// Access log layout, parsed once from `logging.access_log_format`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogFormat {
    #[default]
    Combined,
    Common,
    Json,
    /// Pattern with `$remote_addr`, `$request`, `$status`, ... placeholders
    Custom(String),
}

impl From<String> for LogFormat {
    fn from(value: String) -> Self {
        match value.as_str() {
            "combined" => Self::Combined,
            "common" => Self::Common,
            "json" => Self::Json,
            _ => Self::Custom(value),
        }
    }
}

impl LogFormat {
    pub fn render(&self, entry: &AccessLogEntry) -> String {
        match self {
            Self::Common => render_common(entry),
            Self::Combined => format!(
                "{} \"{}\" \"{}\"",
                render_common(entry),
                entry.referer.as_deref().unwrap_or("-"),
                entry.user_agent.as_deref().unwrap_or("-"),
            ),
            Self::Json => json!({
                "remote_addr": entry.remote_addr,
                "time": entry.time.to_rfc3339(),
                "method": entry.method,
                "path": entry.path,
                "query": entry.query,
                "http_version": entry.http_version,
                "status": entry.status,
                "body_bytes": entry.body_bytes,
                "referer": entry.referer,
                "user_agent": entry.user_agent,
                "request_time_us": entry.request_time_us,
            })
            .to_string(),
            Self::Custom(pattern) => render_pattern(pattern, entry),
        }
    }
}

fn render_common(entry: &AccessLogEntry) -> String {
    format!(
        "{} - - [{}] \"{}\" {} {}",
        entry.remote_addr,
        entry.time.format(CLF_TIME),
        entry.request_line(),
        entry.status,
        entry.body_bytes_display(),
    )
}

/// Expand `$name` placeholders, taking the longest run of `[a-z0-9_]` as the
/// name. Unknown names are copied through unchanged.
fn render_pattern(pattern: &str, entry: &AccessLogEntry) -> String {
    let mut out = String::with_capacity(pattern.len() + 64);
    let mut rest = pattern;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];

        match entry.variable(name) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/proxy/html".to_string(),
        );
        entry.query = Some("url=https%3A%2F%2Fexample.com".to_string());
        entry.status = 200;
        entry.body_bytes = Some(1234);
        entry.referer = Some("http://localhost:8000/".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1_250_000;
        entry
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!(LogFormat::from("combined".to_string()), LogFormat::Combined);
        assert_eq!(LogFormat::from("common".to_string()), LogFormat::Common);
        assert_eq!(LogFormat::from("json".to_string()), LogFormat::Json);
        assert_eq!(
            LogFormat::from("$status".to_string()),
            LogFormat::Custom("$status".to_string())
        );
    }

    #[test]
    fn test_combined() {
        let log = LogFormat::Combined.render(&proxy_entry());
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"GET /proxy/html?url=https%3A%2F%2Fexample.com HTTP/1.1\" 200 1234"));
        assert!(log.ends_with("\"http://localhost:8000/\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_common_omits_headers() {
        let log = LogFormat::Common.render(&proxy_entry());
        assert!(log.ends_with("HTTP/1.1\" 200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_streamed_body_size_unknown() {
        let mut entry = proxy_entry();
        entry.body_bytes = None;
        assert!(LogFormat::Common.render(&entry).ends_with("200 -"));
        assert!(LogFormat::Json.render(&entry).contains(r#""body_bytes":null"#));
    }

    #[test]
    fn test_json_is_valid() {
        let log = LogFormat::Json.render(&proxy_entry());
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "192.168.1.1");
        assert_eq!(value["status"], 200);
        assert_eq!(value["body_bytes"], 1234);
        assert_eq!(value["query"], "url=https%3A%2F%2Fexample.com");
    }

    #[test]
    fn test_custom_pattern() {
        let format =
            LogFormat::Custom("$remote_addr $request_method $status $request_time".to_string());
        assert_eq!(format.render(&proxy_entry()), "192.168.1.1 GET 200 1.250");
    }

    #[test]
    fn test_custom_pattern_longest_name_and_unknown() {
        let format = LogFormat::Custom("[$request] $request_uri $nope $".to_string());
        assert_eq!(
            format.render(&proxy_entry()),
            "[GET /proxy/html?url=https%3A%2F%2Fexample.com HTTP/1.1] \
             /proxy/html?url=https%3A%2F%2Fexample.com $nope $"
        );
    }
}
