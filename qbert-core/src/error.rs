use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Possible errors when building requests
#[derive(Error, Debug)]
pub enum Error {
    /// Http based error
    #[error("HttpError: {0}")]
    HttpError(#[from] http::Error),

    /// Failed to serialize a request body
    #[error("Error serializing request body: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// An error response from the Qbert API.
///
/// Qbert reports failures as a JSON document with a top-level `error` field,
/// sometimes alongside a success status code.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message} (status {status})")]
pub struct ErrorResponse {
    /// The message supplied by the server, verbatim
    pub message: String,
    /// The HTTP status code the error arrived with
    pub status: u16,
}

impl ErrorResponse {
    /// Extract the error carried by a decoded response body.
    ///
    /// Returns `None` when the body is not an object or has no `error` field.
    pub fn from_body(body: &Value, status: u16) -> Option<Self> {
        let error = body.as_object()?.get("error")?;
        let message = match error {
            Value::Object(obj) => match obj.get("message") {
                Some(Value::String(msg)) => msg.clone(),
                _ => error.to_string(),
            },
            Value::String(msg) => msg.clone(),
            other => other.to_string(),
        };
        Some(Self { message, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_is_taken_verbatim() {
        let body = json!({"error": {"message": "Cluster name already in use", "code": 409}});
        let err = ErrorResponse::from_body(&body, 200).unwrap();
        assert_eq!(err.message, "Cluster name already in use");
        assert_eq!(err.status, 200);
    }

    #[test]
    fn string_error_field() {
        let body = json!({"error": "boom"});
        assert_eq!(ErrorResponse::from_body(&body, 500).unwrap().message, "boom");
    }

    #[test]
    fn structured_error_without_message() {
        let body = json!({"error": {"code": 7}});
        assert_eq!(ErrorResponse::from_body(&body, 400).unwrap().message, r#"{"code":7}"#);
    }

    #[test]
    fn bodies_without_error() {
        assert!(ErrorResponse::from_body(&json!({"uuid": "1"}), 200).is_none());
        assert!(ErrorResponse::from_body(&json!([{"error": "x"}]), 200).is_none());
        assert!(ErrorResponse::from_body(&Value::Null, 500).is_none());
    }
}
