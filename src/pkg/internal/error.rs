use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every failure the relay can surface. The message is what callers see.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The ledger node (or the relay, seen from a client) could not be reached.
    #[error("{0}")]
    Connectivity(String),

    /// The contract client has not finished initializing, or failed to.
    #[error("{0}")]
    Unready(String),

    /// The contract reverted or the node refused the transaction.
    #[error("{0}")]
    ContractRejected(String),

    #[error("{0}")]
    InvalidInput(String),

    /// The wallet owner declined the account request.
    #[error("{0}")]
    ConsentDeclined(String),

    /// No wallet provider is available.
    #[error("{0}")]
    ExtensionAbsent(String),

    /// A submission was not confirmed in time. It may still be included.
    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Connectivity(_) => "connectivity",
            RelayError::Unready(_) => "unready",
            RelayError::ContractRejected(_) => "contract_rejected",
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::ConsentDeclined(_) => "consent_declined",
            RelayError::ExtensionAbsent(_) => "extension_absent",
            RelayError::Timeout(_) => "timeout",
            RelayError::Internal(_) => "internal",
        }
    }

    /// Only connectivity failures are safe to retry: nothing reached the node.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Connectivity(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Connectivity(_) => StatusCode::BAD_GATEWAY,
            RelayError::Unready(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::ContractRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::ConsentDeclined(_) => StatusCode::FORBIDDEN,
            RelayError::ExtensionAbsent(_) => StatusCode::PRECONDITION_FAILED,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Inverse of [`RelayError::status`], used by HTTP clients of the relay.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_GATEWAY => RelayError::Connectivity(message),
            StatusCode::SERVICE_UNAVAILABLE => RelayError::Unready(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                RelayError::InvalidInput(message)
            }
            StatusCode::FORBIDDEN => RelayError::ConsentDeclined(message),
            StatusCode::PRECONDITION_FAILED => RelayError::ExtensionAbsent(message),
            StatusCode::GATEWAY_TIMEOUT => RelayError::Timeout(message),
            _ => RelayError::ContractRejected(message),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        tracing::warn!(kind = self.kind(), "request failed: {}", &self);
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for RelayError {
    fn from(rejection: JsonRejection) -> Self {
        RelayError::InvalidInput(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for RelayError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RelayError::InvalidInput(errors.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RelayError::Connectivity(format!("endpoint unreachable: {}", e))
        } else if e.is_timeout() {
            RelayError::Timeout(format!("request timed out: {}", e))
        } else if e.is_decode() {
            RelayError::Internal(format!("could not decode response: {}", e))
        } else {
            RelayError::Internal(format!("request failed after it was sent: {}", e))
        }
    }
}

impl From<alloy_sol_types::Error> for RelayError {
    fn from(e: alloy_sol_types::Error) -> Self {
        RelayError::Internal(format!("could not decode contract output: {}", e))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Internal(format!("malformed json: {}", e))
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(e: config::ConfigError) -> Self {
        RelayError::Internal(format!("improperly configured: {}", e))
    }
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        RelayError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::RelayError;

    #[test]
    fn only_connectivity_is_retryable() {
        assert!(RelayError::Connectivity("down".into()).is_retryable());
        assert!(!RelayError::ContractRejected("revert".into()).is_retryable());
        assert!(!RelayError::InvalidInput("bad".into()).is_retryable());
        assert!(!RelayError::Timeout("slow".into()).is_retryable());
    }

    #[test]
    fn status_mapping_round_trips() {
        for err in [
            RelayError::Connectivity("a".into()),
            RelayError::Unready("b".into()),
            RelayError::ContractRejected("c".into()),
            RelayError::InvalidInput("d".into()),
            RelayError::ConsentDeclined("e".into()),
            RelayError::ExtensionAbsent("f".into()),
            RelayError::Timeout("g".into()),
        ] {
            let back = RelayError::from_status(err.status(), err.to_string());
            assert_eq!(back, err);
        }
    }

    #[tokio::test]
    async fn response_body_is_only_the_error() {
        let res = RelayError::ContractRejected("Job does not exist".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Job does not exist" }));
    }
}
