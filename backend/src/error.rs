use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorDetail;

/// Failures of a prediction request. Rendered as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("File provided is not an image")]
    NotAnImage,
    #[error("file too large")]
    TooLarge,
    #[error("Invalid image format: {0}")]
    InvalidImage(String),
    #[error("Invalid multipart payload: {0}")]
    Multipart(String),
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorDetail::new(self.to_string()))
    }
}
