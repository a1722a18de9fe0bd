use std::fmt::Write;

use crate::normalize::InferenceResult;

const HIGH_CONFIDENCE: f64 = 0.7;

/// `"leaf_blast"` becomes `"Leaf Blast"`.
pub fn format_disease_name(label: &str) -> String {
    let mut formatted = String::with_capacity(label.len());
    let mut word_start = true;
    for c in label.chars() {
        let c = if c == '_' { ' ' } else { c };
        if word_start && c.is_alphanumeric() {
            formatted.extend(c.to_uppercase());
        } else {
            formatted.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '\'');
    }
    formatted
}

pub fn confidence_percent(result: &InferenceResult) -> String {
    format!("{:.1}%", result.display_confidence() * 100.0)
}

pub fn is_healthy(result: &InferenceResult) -> bool {
    result.disease_label.eq_ignore_ascii_case("healthy")
}

pub fn is_high_confidence(result: &InferenceResult) -> bool {
    result.display_confidence() > HIGH_CONFIDENCE
}

/// Plain-text report suitable for printing.
pub fn render_report(result: &InferenceResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Crop Disease Report");
    let _ = writeln!(out, "===================");
    if let Some(filename) = &result.source_filename {
        let _ = writeln!(out, "Image: {}", filename);
    }
    let _ = writeln!(
        out,
        "Diagnosis: {}{}",
        format_disease_name(&result.disease_label),
        if is_healthy(result) { " (healthy)" } else { "" }
    );
    let _ = writeln!(
        out,
        "Confidence: {} ({})",
        confidence_percent(result),
        if is_high_confidence(result) { "high" } else { "medium" }
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Recommended Treatments:");
    if result.treatments.is_empty() {
        let _ = writeln!(out, "No treatments needed.");
    }
    for (index, treatment) in result.treatments.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, treatment);
    }
    out
}
