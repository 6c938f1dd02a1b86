//! Classified result of one probe request.

use std::fmt;

use super::transport::{Exchange, TimeoutKind};

/// Key whose presence marks a body as an RDAP response.
pub const CONFORMANCE_KEY: &str = "rdapConformance";

/// Status column of an outcome: an HTTP status or a transport sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusMarker {
    Http(u16),
    Timeout,
    Error,
}

impl fmt::Display for StatusMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMarker::Http(code) => write!(f, "{code}"),
            StatusMarker::Timeout => f.write_str("Timeout"),
            StatusMarker::Error => f.write_str("Error"),
        }
    }
}

/// Outcome of one variant request against one server.
///
/// `content` holds at most the configured preview length of the body; for
/// timeouts and transport errors it holds a short description instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: StatusMarker,
    /// Which phase timed out, for `StatusMarker::Timeout`.
    pub timeout: Option<TimeoutKind>,
    pub content: String,
    pub content_type: Option<String>,
    pub is_json: bool,
    pub has_conformance: bool,
}

impl ProbeOutcome {
    /// Classify a transport exchange, keeping `preview_bytes` of the body.
    pub fn from_exchange(exchange: Exchange, preview_bytes: usize) -> Self {
        match exchange {
            Exchange::Response {
                status,
                body,
                content_type,
            } => {
                let (is_json, has_conformance) = inspect_json(&body);
                Self {
                    status: StatusMarker::Http(status),
                    timeout: None,
                    content: preview(&String::from_utf8_lossy(&body), preview_bytes),
                    content_type,
                    is_json,
                    has_conformance,
                }
            }
            Exchange::Timeout(kind) => Self {
                status: StatusMarker::Timeout,
                timeout: Some(kind),
                content: preview(&format!("{kind} timeout"), preview_bytes),
                content_type: None,
                is_json: false,
                has_conformance: false,
            },
            Exchange::Failed(detail) => Self {
                status: StatusMarker::Error,
                timeout: None,
                content: preview(&detail, preview_bytes),
                content_type: None,
                is_json: false,
                has_conformance: false,
            },
        }
    }

    /// HTTP 200 with an RDAP conformance declaration.
    pub fn is_healthy(&self) -> bool {
        self.status == StatusMarker::Http(200) && self.has_conformance
    }
}

/// Parse the body as JSON and look for the conformance key. Fails closed.
fn inspect_json(body: &[u8]) -> (bool, bool) {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => {
            let conformant = value
                .as_object()
                .is_some_and(|o| o.contains_key(CONFORMANCE_KEY));
            (true, conformant)
        }
        Err(_) => (false, false),
    }
}

/// At most `max_bytes` of `text`, cut on a character boundary.
pub(crate) fn preview(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Exchange {
        Exchange::Response {
            status,
            body: body.as_bytes().to_vec(),
            content_type: Some("application/rdap+json".to_string()),
        }
    }

    #[test]
    fn conformant_json_response() {
        let o = ProbeOutcome::from_exchange(
            response(200, r#"{"rdapConformance":["rdap_level_0"],"notices":[]}"#),
            1000,
        );
        assert_eq!(o.status, StatusMarker::Http(200));
        assert!(o.is_json);
        assert!(o.has_conformance);
        assert!(o.is_healthy());
        assert_eq!(o.content_type.as_deref(), Some("application/rdap+json"));
    }

    #[test]
    fn json_without_marker_and_nested_marker_do_not_conform() {
        let o = ProbeOutcome::from_exchange(response(200, r#"{"errorCode":404}"#), 1000);
        assert!(o.is_json);
        assert!(!o.has_conformance);
        let nested = ProbeOutcome::from_exchange(
            response(200, r#"{"inner":{"rdapConformance":[]}}"#),
            1000,
        );
        assert!(!nested.has_conformance);
        let array = ProbeOutcome::from_exchange(response(200, r#"["rdapConformance"]"#), 1000);
        assert!(array.is_json);
        assert!(!array.has_conformance);
    }

    #[test]
    fn non_json_body_fails_closed() {
        let o = ProbeOutcome::from_exchange(response(406, "<html>Not Acceptable</html>"), 1000);
        assert_eq!(o.status, StatusMarker::Http(406));
        assert!(!o.is_json);
        assert!(!o.has_conformance);
        assert!(!o.is_healthy());
    }

    #[test]
    fn conformant_but_not_200_is_unhealthy() {
        let o = ProbeOutcome::from_exchange(response(404, r#"{"rdapConformance":[]}"#), 1000);
        assert!(o.has_conformance);
        assert!(!o.is_healthy());
    }

    #[test]
    fn content_is_truncated_but_json_checked_on_full_body() {
        let body = format!(r#"{{"rdapConformance":["rdap_level_0"],"pad":"{}"}}"#, "x".repeat(50));
        let o = ProbeOutcome::from_exchange(response(200, &body), 20);
        assert_eq!(o.content.len(), 20);
        assert!(o.is_json);
        assert!(o.has_conformance);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "h");
        assert_eq!(preview("héllo", 3), "hé");
        assert_eq!(preview("abc", 10), "abc");
    }

    #[test]
    fn timeouts_and_errors_use_sentinels() {
        let t = ProbeOutcome::from_exchange(Exchange::Timeout(TimeoutKind::Connect), 1000);
        assert_eq!(t.status, StatusMarker::Timeout);
        assert_eq!(t.timeout, Some(TimeoutKind::Connect));
        assert_eq!(t.content, "connect timeout");
        assert!(!t.is_json);
        assert_eq!(t.status.to_string(), "Timeout");

        let e = ProbeOutcome::from_exchange(
            Exchange::Failed("Couldn't resolve host name".to_string()),
            1000,
        );
        assert_eq!(e.status, StatusMarker::Error);
        assert_eq!(e.status.to_string(), "Error");
        assert!(e.content_type.is_none());
        assert!(!e.has_conformance);
    }
}
