use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Route that requires `Authorization: Bearer <token>`.
pub const AUTHENTICATED_PREDICT_PATH: &str = "/api/predictions/crop-disease";
/// Route open to anonymous callers.
pub const PUBLIC_PREDICT_PATH: &str = "/api/public/predict-disease";
/// Multipart field carrying the uploaded image on both routes.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Endpoint {
    #[strum(serialize = "authenticated")]
    AuthenticatedDisease,
    #[strum(serialize = "public")]
    PublicDisease,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::AuthenticatedDisease => AUTHENTICATED_PREDICT_PATH,
            Endpoint::PublicDisease => PUBLIC_PREDICT_PATH,
        }
    }

    pub fn requires_auth(self) -> bool {
        matches!(self, Endpoint::AuthenticatedDisease)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionResponse {
    #[serde(default)]
    pub filename: Option<String>,
    pub prediction: String,
    pub confidence: f64,
    pub possible_treatments: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of every non-2xx response from the inference service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_distinct_routes() {
        assert_eq!(Endpoint::AuthenticatedDisease.path(), AUTHENTICATED_PREDICT_PATH);
        assert_eq!(Endpoint::PublicDisease.path(), PUBLIC_PREDICT_PATH);
        assert!(Endpoint::AuthenticatedDisease.requires_auth());
        assert!(!Endpoint::PublicDisease.requires_auth());
    }

    #[test]
    fn prediction_response_tolerates_missing_optional_fields() {
        let parsed: PredictionResponse = serde_json::from_str(
            r#"{"prediction":"Rust","confidence":0.9,"possible_treatments":[]}"#,
        )
        .unwrap();
        assert_eq!(parsed.filename, None);
        assert_eq!(parsed.image_url, None);
        assert_eq!(Endpoint::PublicDisease.to_string(), "public");
    }
}
