//! Verdict normalization - decodes an extracted candidate and coerces every
//! field into the `ClaimVerdict` schema.
//!
//! Only the decode itself can fail. Once the candidate is a JSON object, bad
//! fields are corrected in place (clamped, defaulted, discarded) and the parse
//! goes through.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::verdict::{ClaimVerdict, VerdictStatus, DEFAULT_CREDIBILITY, DEFAULT_EXPLANATION};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("candidate is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// Parse `candidate` into a verdict for `claim`.
pub fn normalize(candidate: &str, claim: &str) -> Result<ClaimVerdict, ParseError> {
    let value: Value = serde_json::from_str(candidate)?;
    let fields = match value {
        Value::Object(map) => map,
        other => {
            return Err(ParseError::NotAnObject {
                kind: json_kind(&other),
            })
        }
    };

    let status = fields
        .get("status")
        .and_then(Value::as_str)
        .map(VerdictStatus::from_model_label)
        .unwrap_or(VerdictStatus::Unverifiable);

    let explanation = fields
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EXPLANATION);

    let credibility = read_credibility(&fields);
    let sources = read_sources(&fields);

    Ok(ClaimVerdict::new(claim, status, explanation, credibility, sources))
}

fn read_credibility(fields: &Map<String, Value>) -> f64 {
    let raw = match fields.get("credibility") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(v) if v.is_nan() => DEFAULT_CREDIBILITY,
        Some(v) => {
            if !(0.0..=1.0).contains(&v) {
                tracing::debug!(credibility = v, "Clamping out-of-range credibility");
            }
            v
        }
        None => DEFAULT_CREDIBILITY,
    }
}

fn read_sources(fields: &Map<String, Value>) -> Vec<String> {
    let Some(value) = fields.get("sources") else {
        return Vec::new();
    };

    let strings: Option<Vec<String>> = value.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    });

    strings.unwrap_or_else(|| {
        tracing::debug!("Discarding malformed sources field");
        Vec::new()
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_candidate;
    use serde_json::json;

    const CLAIM: &str = "Water boils at 100 degrees Celsius at sea level";

    fn normalize_json(value: Value) -> ClaimVerdict {
        normalize(&value.to_string(), CLAIM).expect("object payload should normalize")
    }

    #[test]
    fn test_well_formed_payload() {
        let v = normalize_json(json!({
            "status": "Verified",
            "explanation": "Standard physics.",
            "credibility": 0.95,
            "sources": ["https://en.wikipedia.org/wiki/Boiling_point"]
        }));
        assert_eq!(v.claim(), CLAIM);
        assert_eq!(v.status(), VerdictStatus::Verified);
        assert_eq!(v.explanation(), "Standard physics.");
        assert_eq!(v.credibility(), 0.95);
        assert_eq!(v.sources(), ["https://en.wikipedia.org/wiki/Boiling_point"]);
    }

    #[test]
    fn test_credibility_clamped_to_nearest_bound() {
        assert_eq!(normalize_json(json!({"credibility": -3})).credibility(), 0.0);
        assert_eq!(normalize_json(json!({"credibility": 7.5})).credibility(), 1.0);
    }

    #[test]
    fn test_credibility_defaults_when_unusable() {
        assert_eq!(normalize_json(json!({})).credibility(), 0.5);
        assert_eq!(normalize_json(json!({"credibility": null})).credibility(), 0.5);
        assert_eq!(normalize_json(json!({"credibility": "high"})).credibility(), 0.5);
        assert_eq!(normalize_json(json!({"credibility": [0.2]})).credibility(), 0.5);
        assert_eq!(normalize_json(json!({"credibility": "NaN"})).credibility(), 0.5);
    }

    #[test]
    fn test_credibility_numeric_string_accepted() {
        assert_eq!(normalize_json(json!({"credibility": " 0.25 "})).credibility(), 0.25);
        assert_eq!(normalize_json(json!({"credibility": "3"})).credibility(), 1.0);
    }

    #[test]
    fn test_sources_truncated_to_first_three_in_order() {
        let v = normalize_json(json!({"sources": ["s1", "s2", "s3", "s4", "s5"]}));
        assert_eq!(v.sources(), ["s1", "s2", "s3"]);
    }

    #[test]
    fn test_malformed_sources_discarded() {
        assert!(normalize_json(json!({"sources": "https://x"})).sources().is_empty());
        assert!(normalize_json(json!({"sources": ["ok", 7]})).sources().is_empty());
        assert!(normalize_json(json!({"sources": {"url": "x"}})).sources().is_empty());
        assert!(normalize_json(json!({"sources": null})).sources().is_empty());
    }

    #[test]
    fn test_unrecognized_status_coerced() {
        assert_eq!(
            normalize_json(json!({"status": "Maybe"})).status(),
            VerdictStatus::Unverifiable
        );
        assert_eq!(
            normalize_json(json!({"status": "false"})).status(),
            VerdictStatus::Unverifiable
        );
        assert_eq!(normalize_json(json!({"status": 1})).status(), VerdictStatus::Unverifiable);
        assert_eq!(normalize_json(json!({})).status(), VerdictStatus::Unverifiable);
    }

    #[test]
    fn test_missing_or_blank_explanation_gets_placeholder() {
        assert_eq!(normalize_json(json!({})).explanation(), DEFAULT_EXPLANATION);
        assert_eq!(
            normalize_json(json!({"explanation": "  "})).explanation(),
            DEFAULT_EXPLANATION
        );
        assert_eq!(
            normalize_json(json!({"explanation": 42})).explanation(),
            DEFAULT_EXPLANATION
        );
    }

    #[test]
    fn test_claim_comes_from_caller_not_payload() {
        let v = normalize_json(json!({"claim": "something else", "status": "False"}));
        assert_eq!(v.claim(), CLAIM);
    }

    #[test]
    fn test_invalid_json_is_parse_failure() {
        assert!(matches!(
            normalize("{status: Verified", CLAIM),
            Err(ParseError::Decode(_))
        ));
        assert!(matches!(
            normalize("VERDICT: True\nEXPLANATION: yes", CLAIM),
            Err(ParseError::Decode(_))
        ));
    }

    #[test]
    fn test_non_object_is_parse_failure() {
        assert!(matches!(
            normalize("[1, 2, 3]", CLAIM),
            Err(ParseError::NotAnObject { kind: "array" })
        ));
        assert!(matches!(
            normalize("\"Verified\"", CLAIM),
            Err(ParseError::NotAnObject { kind: "string" })
        ));
    }

    #[test]
    fn test_normalizing_a_normalized_verdict_is_identity() {
        let first = normalize_json(json!({
            "status": "Misleading",
            "explanation": "Partly true.",
            "credibility": 1.7,
            "sources": ["a", "b", "c", "d"]
        }));
        let reserialized = serde_json::to_string(&first).unwrap();
        let second = normalize(&reserialized, CLAIM).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fenced_payload_end_to_end() {
        let raw = "```json\n{\"status\":\"Verified\",\"explanation\":\"x\",\"credibility\":1.4,\"sources\":[\"a\",\"b\",\"c\",\"d\"]}\n```";
        let candidate = extract_candidate(raw).unwrap();
        let v = normalize(candidate, CLAIM).unwrap();
        assert_eq!(v.status(), VerdictStatus::Verified);
        assert_eq!(v.credibility(), 1.0);
        assert_eq!(v.sources(), ["a", "b", "c"]);
    }
}
