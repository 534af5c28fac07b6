//! Response Sanitizer
//!
//! Normalizes model output that should be JSON but often is not quite:
//! - Markdown code fence wrapping (```json ... ```)
//! - Single-quoted object keys (`'total': 80`)
//! - Trailing commas before `}` or `]`
//!
//! This is a best-effort regex repair, not a JSON5 parser. A string value
//! holding `'...':` will be rewritten as if it were a key.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{FitError, Result};

static SINGLE_QUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'\s*:").expect("key pattern is valid"));

static TRAILING_COMMA_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\}").expect("brace pattern is valid"));

static TRAILING_COMMA_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("bracket pattern is valid"));

/// Strip fences and surrounding whitespace
pub fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Apply the key-quoting and trailing-comma rewrites to fence-free text
pub fn normalize(cleaned: &str) -> String {
    let quoted = SINGLE_QUOTED_KEY.replace_all(cleaned, "\"$1\":");
    let braces = TRAILING_COMMA_BRACE.replace_all(&quoted, "}");
    TRAILING_COMMA_BRACKET.replace_all(&braces, "]").into_owned()
}

/// Sanitize and parse model output into a JSON value
///
/// On failure the fence-stripped text is carried in
/// [`FitError::InvalidResponse`] for diagnostics.
pub fn sanitize(raw: &str) -> Result<Value> {
    let cleaned = strip_fences(raw);
    let fixed = normalize(&cleaned);

    match serde_json::from_str::<Value>(&fixed) {
        Ok(value) => {
            if fixed != cleaned {
                debug!("Model response required repair before parsing");
            }
            Ok(value)
        }
        Err(e) => {
            warn!(error = %e, cleaned = %cleaned, "Model response is not valid JSON");
            Err(FitError::InvalidResponse {
                raw: cleaned,
                reason: e.to_string(),
            })
        }
    }
}

/// Sanitize and decode model output into a typed value
pub fn sanitize_into<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let value = sanitize(raw)?;
    serde_json::from_value(value.clone()).map_err(|e| FitError::InvalidResponse {
        raw: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnalysisResult;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_json() {
        let value = sanitize(r#"{"key": "value"}"#).unwrap();
        assert_eq!(value["key"], "value");
    }

    #[test]
    fn test_fenced_single_quoted_trailing_comma() {
        let value = sanitize("```json\n{'total': 80,}\n```").unwrap();
        assert_eq!(value, json!({"total": 80}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"total":80}"#);
    }

    #[test]
    fn test_bare_fence() {
        let value = sanitize("```\n[1, 2, 3,]\n```").unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn test_nested_trailing_commas() {
        let value = sanitize(r#"{"a": [{"b": 1,},], "c": {"d": [true,],},}"#).unwrap();
        assert_eq!(value, json!({"a": [{"b": 1}], "c": {"d": [true]}}));
    }

    #[test]
    fn test_single_quoted_string_values_are_left_alone() {
        // values are not rewritten, so single-quoted values stay invalid
        let err = sanitize("{'verdict': 'strong'}").unwrap_err();
        assert!(matches!(err, FitError::InvalidResponse { .. }));
    }

    #[test]
    fn test_invalid_carries_cleaned_text() {
        let err = sanitize("```json\nnot json at all\n```").unwrap_err();
        match err {
            FitError::InvalidResponse { raw, .. } => assert_eq!(raw, "not json at all"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_apostrophe_before_colon_limitation() {
        // a quoted run followed by a colon inside a string value is rewritten as a key
        let raw = r#"{"note": "it's 'odd': really"}"#;
        assert_eq!(normalize(raw), r#"{"note": "it's "odd": really"}"#);
        assert!(matches!(
            sanitize(raw),
            Err(FitError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_sanitize_into_analysis() {
        let raw = "```json\n{'matchScore': {'total': 80, 'hardSkills': 70,}, 'missingKeywords': [\"docker\",],}\n```";
        let result: AnalysisResult = sanitize_into(raw).unwrap();
        assert_eq!(result.match_score.total, 80);
        assert_eq!(result.match_score.hard_skills, 70);
        assert_eq!(result.missing_keywords, vec!["docker".to_string()]);
    }

    fn analysis_value(total: u8, keywords: Vec<String>, reject: bool) -> Value {
        json!({
            "matchScore": {
                "total": total,
                "hardSkills": total / 2,
                "softSkills": 100 - total,
                "roleAlignment": total,
                "atsCompatibility": 3
            },
            "missingKeywords": keywords,
            "actionPlan": ["Quantify impact", "Add cloud experience"],
            "recruiterLens": {
                "positives": ["Relevant stack"],
                "redFlags": [],
                "shortlistProbability": total,
                "verdict": "Potential candidate"
            },
            "atsVerdict": { "willAutoReject": reject, "reason": "keyword density" },
            "rewriteSuggestions": {
                "headline": "Senior Engineer",
                "summary": "Builds things",
                "experienceBullet": "Cut latency by 40%"
            },
            "coverLetter": "Dear hiring manager"
        })
    }

    /// Render a value the way a sloppy model would: single-quoted keys and a
    /// trailing comma after every object and array, wrapped in a fence.
    fn sloppy(value: &Value) -> String {
        fn render(value: &Value, out: &mut String) {
            match value {
                Value::Object(map) => {
                    out.push('{');
                    for (k, v) in map {
                        out.push_str(&format!("'{}': ", k));
                        render(v, out);
                        out.push_str(", ");
                    }
                    out.push('}');
                }
                Value::Array(items) => {
                    out.push('[');
                    for v in items {
                        render(v, out);
                        out.push_str(",\n");
                    }
                    out.push(']');
                }
                other => out.push_str(&other.to_string()),
            }
        }
        let mut out = String::from("```json\n");
        render(value, &mut out);
        out.push_str("\n```");
        out
    }

    proptest! {
        #[test]
        fn prop_sloppy_json_recovers_canonical(
            total in 0u8..=100,
            keywords in proptest::collection::vec("[a-z][a-z0-9 ]{0,12}", 0..5),
            reject in any::<bool>(),
        ) {
            let canonical = analysis_value(total, keywords, reject);
            let recovered = sanitize(&sloppy(&canonical)).unwrap();
            prop_assert_eq!(&recovered, &canonical);

            let clean = sanitize(&canonical.to_string()).unwrap();
            prop_assert_eq!(recovered, clean);
        }
    }
}
