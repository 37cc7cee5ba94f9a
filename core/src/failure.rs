//! Classification of failed round-trips.
//!
//! A round-trip either produced a response or failed in transport. Non-2xx
//! responses and transport failures are turned into a [`Failure`] tagged
//! with a [`FailureKind`]. The checks run in a fixed order: the dedicated
//! status codes first, then any `message` field the server supplied, then
//! the catch-all.

use serde_json::Value;

use crate::http::HttpResponse;
use crate::transport::TransportError;

/// Category a failed round-trip falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received (connection refused, timeout, ...).
    Transport,
    /// 401
    Authentication,
    /// 403
    Authorization,
    /// 404
    NotFound,
    /// 5xx
    Server,
    /// Any other status whose body carries a `message` field.
    Application,
    Unclassified,
}

/// A classified failure, keeping enough of the raw response for callers to
/// branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    /// Server-supplied `message`, or the transport error text.
    pub message: Option<String>,
    pub body: String,
}

/// The body's `message` field, if it holds something worth showing.
/// Empty strings, `null`, `false` and `0` count as absent; other non-string
/// values are shown as their JSON text.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Classify the outcome of a round-trip. Returns `None` for 2xx responses.
pub fn classify(outcome: &Result<HttpResponse, TransportError>) -> Option<Failure> {
    match outcome {
        Ok(response) if response.is_success() => None,
        Ok(response) => Some(classify_response(response)),
        Err(err) => Some(Failure {
            kind: FailureKind::Transport,
            status: None,
            message: Some(err.to_string()),
            body: String::new(),
        }),
    }
}

fn classify_response(response: &HttpResponse) -> Failure {
    let message = server_message(&response.body);
    let kind = match response.status {
        401 => FailureKind::Authentication,
        403 => FailureKind::Authorization,
        404 => FailureKind::NotFound,
        s if s >= 500 => FailureKind::Server,
        _ if message.is_some() => FailureKind::Application,
        _ => FailureKind::Unclassified,
    };
    Failure {
        kind,
        status: Some(response.status),
        message,
        body: response.body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(status: u16, body: &str) -> Failure {
        classify(&Ok(HttpResponse::new(status, body))).unwrap()
    }

    #[test]
    fn success_is_not_a_failure() {
        assert!(classify(&Ok(HttpResponse::new(200, "{}"))).is_none());
        assert!(classify(&Ok(HttpResponse::new(204, ""))).is_none());
    }

    #[test]
    fn dedicated_statuses_win_over_message() {
        let body = r#"{"message":"nope"}"#;
        assert_eq!(failure(401, body).kind, FailureKind::Authentication);
        assert_eq!(failure(403, body).kind, FailureKind::Authorization);
        assert_eq!(failure(404, body).kind, FailureKind::NotFound);
        assert_eq!(failure(500, body).kind, FailureKind::Server);
        assert_eq!(failure(503, "").kind, FailureKind::Server);
    }

    #[test]
    fn message_field_makes_application_failure() {
        let f = failure(400, r#"{"message":"El plan ya existe"}"#);
        assert_eq!(f.kind, FailureKind::Application);
        assert_eq!(f.message.as_deref(), Some("El plan ya existe"));
        assert_eq!(f.status, Some(400));
    }

    #[test]
    fn empty_message_falls_back_to_generic_notice() {
        for body in [r#"{"message":""}"#, r#"{"message":null}"#, r#"{"message":false}"#] {
            let f = failure(400, body);
            assert_eq!(f.kind, FailureKind::Unclassified, "{body}");
            assert_eq!(f.message, None);
            assert_eq!(crate::notify::notice_for(&f), crate::notify::UNEXPECTED);
        }
    }

    #[test]
    fn non_string_message_is_shown_as_json() {
        let f = failure(409, r#"{"message":["nombre","duplicado"]}"#);
        assert_eq!(f.kind, FailureKind::Application);
        assert_eq!(crate::notify::notice_for(&f), r#"["nombre","duplicado"]"#);
        assert_eq!(failure(400, r#"{"message":42}"#).message.as_deref(), Some("42"));
    }

    #[test]
    fn anything_else_is_unclassified() {
        assert_eq!(failure(400, "").kind, FailureKind::Unclassified);
        assert_eq!(failure(422, r#"{"detail":"x"}"#).kind, FailureKind::Unclassified);
        assert_eq!(failure(302, "").kind, FailureKind::Unclassified);
    }

    #[test]
    fn transport_error_has_no_status() {
        let f = classify(&Err(TransportError::new("connection refused"))).unwrap();
        assert_eq!(f.kind, FailureKind::Transport);
        assert_eq!(f.status, None);
    }
}
