//! The canonical fact-check prompt.

use crate::verdict::{VerdictStatus, MAX_SOURCES};

/// Build the prompt sent upstream for `claim`.
///
/// The claim is embedded as a JSON string literal so quotes and newlines in
/// user input cannot break out of it.
pub fn build_prompt(claim: &str) -> String {
    let quoted = serde_json::Value::String(claim.to_string()).to_string();
    let labels = VerdictStatus::MODEL_LABELS
        .iter()
        .map(|s| format!("\"{}\"", s.as_str()))
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        r#"Act as Veritas, a rigorous fact-checking protocol. Analyze this claim: {quoted}

Provide a verdict based on well-established evidence.
Return ONLY a JSON object, with no prose before or after it:
{{
    "status": {labels},
    "explanation": "2 sentences max of evidence.",
    "credibility": 0.0 to 1.0,
    "sources": ["up to {max} URLs of reputable sources"]
}}"#,
        quoted = quoted,
        labels = labels,
        max = MAX_SOURCES,
    )
}
