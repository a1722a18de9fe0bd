use serde::Serialize;
use serde_json::Value;

pub const NO_TREATMENTS_FALLBACK: &str = "No specific treatments available";

/// Canonical prediction. The only shape the workflow accepts as success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceResult {
    pub disease_label: String,
    /// As received. `None` when the service omitted it or sent something
    /// that is not a number.
    pub confidence: Option<f64>,
    pub treatments: Vec<String>,
    pub source_filename: Option<String>,
    pub rendered_image_ref: Option<String>,
}

impl InferenceResult {
    /// Confidence for display purposes; absent or non-finite values show as 0.
    pub fn display_confidence(&self) -> f64 {
        self.confidence.filter(|c| c.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedResponse {
    #[error("response body is empty or not JSON")]
    MissingPayload,
    #[error("response has no disease label")]
    MissingLabel,
}

pub fn normalize(payload: Option<&Value>) -> Result<InferenceResult, MalformedResponse> {
    let payload = payload.ok_or(MalformedResponse::MissingPayload)?;

    let disease_label = payload
        .get("prediction")
        .and_then(Value::as_str)
        .filter(|label| !label.is_empty())
        .ok_or(MalformedResponse::MissingLabel)?
        .to_string();

    Ok(InferenceResult {
        disease_label,
        confidence: coerce_confidence(payload.get("confidence")),
        treatments: coerce_treatments(payload.get("possible_treatments")),
        source_filename: optional_string(payload.get("filename")),
        rendered_image_ref: optional_string(payload.get("image_url")),
    })
}

fn coerce_confidence(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// A missing or non-array field falls back to a single placeholder entry
// instead of failing; the result view always has something to list.
fn coerce_treatments(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => vec![NO_TREATMENTS_FALLBACK.to_string()],
    }
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn well_formed_payload() {
        let payload = json!({
            "prediction": "Powdery",
            "confidence": 0.85,
            "possible_treatments": ["A", "B"],
            "filename": "leaf.jpg",
            "image_url": null
        });
        let result = normalize(Some(&payload)).unwrap();
        assert_eq!(
            result,
            InferenceResult {
                disease_label: "Powdery".into(),
                confidence: Some(0.85),
                treatments: vec!["A".into(), "B".into()],
                source_filename: Some("leaf.jpg".into()),
                rendered_image_ref: None,
            }
        );
    }

    #[test]
    fn missing_or_empty_label_is_malformed() {
        let missing = json!({"confidence": 0.9, "possible_treatments": []});
        assert_eq!(normalize(Some(&missing)), Err(MalformedResponse::MissingLabel));

        let empty = json!({"prediction": ""});
        assert_eq!(normalize(Some(&empty)), Err(MalformedResponse::MissingLabel));

        let not_a_string = json!({"prediction": ["Rust"]});
        assert_eq!(normalize(Some(&not_a_string)), Err(MalformedResponse::MissingLabel));

        assert_eq!(normalize(Some(&json!([1, 2]))), Err(MalformedResponse::MissingLabel));
        assert_eq!(normalize(None), Err(MalformedResponse::MissingPayload));
    }

    #[test]
    fn absent_treatments_use_fallback() {
        let payload = json!({"prediction": "Rust", "confidence": 0.7});
        let result = normalize(Some(&payload)).unwrap();
        assert_eq!(result.treatments, vec![NO_TREATMENTS_FALLBACK.to_string()]);
    }

    #[test]
    fn non_array_treatments_use_fallback() {
        let payload = json!({"prediction": "Rust", "possible_treatments": "spray"});
        let result = normalize(Some(&payload)).unwrap();
        assert_eq!(result.treatments, vec![NO_TREATMENTS_FALLBACK.to_string()]);
    }

    #[test]
    fn empty_treatment_list_is_kept_empty() {
        let payload = json!({"prediction": "Healthy", "possible_treatments": []});
        assert!(normalize(Some(&payload)).unwrap().treatments.is_empty());
    }

    #[test]
    fn treatment_entries_are_stringified() {
        let payload = json!({
            "prediction": "Rust",
            "possible_treatments": ["Rotate crops", 3, true],
        });
        let result = normalize(Some(&payload)).unwrap();
        assert_eq!(result.treatments, vec!["Rotate crops", "3", "true"]);
    }

    #[test]
    fn confidence_passes_through_without_defaulting() {
        let missing = normalize(Some(&json!({"prediction": "Rust"}))).unwrap();
        assert_eq!(missing.confidence, None);
        assert_eq!(missing.display_confidence(), 0.0);

        let textual =
            normalize(Some(&json!({"prediction": "Rust", "confidence": "0.42"}))).unwrap();
        assert_eq!(textual.confidence, Some(0.42));

        let garbage =
            normalize(Some(&json!({"prediction": "Rust", "confidence": "high"}))).unwrap();
        assert_eq!(garbage.confidence, None);

        let out_of_range =
            normalize(Some(&json!({"prediction": "Rust", "confidence": 1.7}))).unwrap();
        assert_eq!(out_of_range.confidence, Some(1.7));
    }
}
