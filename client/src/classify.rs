use serde::Serialize;
use serde_json::Value;
use strum_macros::Display;

use crate::intake::ValidationError;
use crate::normalize::{self, InferenceResult};
use crate::transport::{RawResponse, TransportFailure};

pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze image. Please try again.";
pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Invalid response from server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum ErrorKind {
    Validation,
    NoResponse,
    ServerRejected,
    MalformedResponse,
    Unknown,
}

/// A failure the user gets to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct WorkflowError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WorkflowError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(err: &ValidationError) -> Self {
        Self::new(ErrorKind::Validation, err.to_string())
    }

    pub fn no_response() -> Self {
        Self::new(ErrorKind::NoResponse, NO_RESPONSE_MESSAGE)
    }

    pub fn server_rejected(detail: Option<&str>) -> Self {
        Self::new(ErrorKind::ServerRejected, or_generic(detail))
    }

    pub fn malformed_response() -> Self {
        Self::new(ErrorKind::MalformedResponse, MALFORMED_RESPONSE_MESSAGE)
    }

    pub fn unknown(cause: Option<&str>) -> Self {
        Self::new(ErrorKind::Unknown, or_generic(cause))
    }
}

impl From<ValidationError> for WorkflowError {
    fn from(err: ValidationError) -> Self {
        Self::validation(&err)
    }
}

fn or_generic(message: Option<&str>) -> &str {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(GENERIC_FAILURE_MESSAGE)
}

/// Transport failures first, then the response status, then the payload
/// shape. The first match decides the kind.
pub fn classify(
    outcome: Result<RawResponse, TransportFailure>,
) -> Result<InferenceResult, WorkflowError> {
    let response = match outcome {
        Ok(response) => response,
        Err(TransportFailure::NoResponse(cause)) => {
            log::warn!("No response from inference service: {}", cause);
            return Err(WorkflowError::no_response());
        }
        Err(TransportFailure::Construction(cause)) => {
            log::error!("Failed to send inference request: {}", cause);
            return Err(WorkflowError::unknown(Some(&cause)));
        }
    };

    if !response.is_success() {
        let detail = response
            .body
            .as_ref()
            .and_then(|body| body.get("detail"))
            .and_then(Value::as_str);
        log::warn!(
            "Inference service rejected the upload with status {}: {:?}",
            response.status,
            detail
        );
        return Err(WorkflowError::server_rejected(detail));
    }

    normalize::normalize(response.body.as_ref()).map_err(|err| {
        log::error!("Invalid response format ({}): {:?}", err, response.body);
        WorkflowError::malformed_response()
    })
}
