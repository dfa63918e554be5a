//! Analysis report parsing from generation service output.

use clinrx_core::models::AnalysisResult;
use clinrx_core::schema::{analysis_response_schema, json_type_name, Violation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AnalysisError, ClientResult};

const FENCE: &str = "```";

/// Strip surrounding whitespace and an optional markdown code fence.
pub fn clean_response_text(raw: &str) -> ClientResult<&str> {
    let mut text = raw.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text)
}

/// Parse service output into an analysis report.
///
/// Type mismatches against the response schema reject the document. Strings outside
/// a closed set are logged and accepted.
pub fn parse_analysis(raw: &str) -> ClientResult<AnalysisResult> {
    let text = clean_response_text(raw)?;
    let value = parse_document(text)?;

    if !value.is_object() {
        return Err(AnalysisError::invalid(format!(
            "expected a JSON object at top level, found {}",
            json_type_name(&value)
        )));
    }

    let (structural, advisory): (Vec<Violation>, Vec<Violation>) = analysis_response_schema()
        .validate(&value)
        .into_iter()
        .partition(Violation::is_structural);

    for violation in &advisory {
        warn!(%violation, "Response value outside declared schema");
    }
    if !structural.is_empty() {
        let detail = structural
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AnalysisError::invalid(detail));
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::invalid(e.to_string()))
}

fn parse_document(text: &str) -> ClientResult<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(err) => {
            // Prose around the object: retry on the outermost braces
            let start = text.find('{');
            let end = text.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start > 0 && start < end => {
                    debug!("Retrying parse on embedded JSON object");
                    serde_json::from_str(&text[start..=end])
                        .map_err(|_| AnalysisError::invalid(format!("JSON parse error: {}", err)))
                }
                _ => Err(AnalysisError::invalid(format!("JSON parse error: {}", err))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisErrorKind;
    use clinrx_core::models::Severity;

    const MINIMAL: &str = r#"{"summary":{"highest_severity_found":"major","interaction_count":2,"red_flags":["chest pain"]},"markdown_summary":"**ok**"}"#;

    #[test]
    fn test_clean_plain_and_fenced() {
        assert_eq!(clean_response_text("  {\"a\":1}\n").unwrap(), "{\"a\":1}");
        assert_eq!(
            clean_response_text("```json\n{\"a\":1}\n```").unwrap(),
            "{\"a\":1}"
        );
        assert_eq!(clean_response_text("```JSON {\"a\":1}```").unwrap(), "{\"a\":1}");
        assert_eq!(clean_response_text("```\n{\"a\":1}\n```").unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_clean_empty() {
        assert!(matches!(clean_response_text(""), Err(AnalysisError::EmptyResponse)));
        assert!(matches!(clean_response_text(" \n\t"), Err(AnalysisError::EmptyResponse)));
        assert!(matches!(
            clean_response_text("```json\n```"),
            Err(AnalysisError::EmptyResponse)
        ));
    }

    #[test]
    fn test_parse_fenced_document() {
        let raw = format!("```json\n{}\n```", MINIMAL);
        let result = parse_analysis(&raw).unwrap();
        assert_eq!(result.highest_severity_found(), Some(&Severity::Major));
        assert_eq!(result.red_flags(), ["chest pain"]);
        assert_eq!(result.markdown_summary, "**ok**");
    }

    #[test]
    fn test_parse_empty() {
        let err = parse_analysis("   ").unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::EmptyResponse);
        assert_eq!(err.user_message(), "The analysis produced no result.");
    }

    #[test]
    fn test_parse_not_json() {
        let err = parse_analysis("not json").unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::InvalidResponseFormat);
        assert_eq!(
            err.user_message(),
            "The AI returned an invalid JSON response. Please try again or adjust your inputs."
        );
    }

    #[test]
    fn test_parse_non_object_top_level() {
        for (raw, found) in [
            ("[1, 2]", "array"),
            ("\"report\"", "string"),
            ("42", "integer"),
            ("4.2", "number"),
            ("null", "null"),
        ] {
            match parse_analysis(raw).unwrap_err() {
                AnalysisError::InvalidResponseFormat { detail } => {
                    assert!(detail.ends_with(&format!("found {}", found)), "{}", detail);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parse_structural_violation() {
        let err = parse_analysis(r#"{"summary":{"red_flags":"chest pain"}}"#).unwrap_err();
        match err {
            AnalysisError::InvalidResponseFormat { detail } => {
                assert!(detail.contains("/summary/red_flags"), "{}", detail);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_accepts_unknown_severity() {
        let result = parse_analysis(r#"{"summary":{"highest_severity_found":"catastrophic"}}"#)
            .unwrap();
        assert_eq!(
            result.highest_severity_found(),
            Some(&Severity::Unrecognized("catastrophic".into()))
        );
    }

    #[test]
    fn test_parse_embedded_in_prose() {
        let raw = format!("Here is the analysis:\n{}\nLet me know if you need more.", MINIMAL);
        let result = parse_analysis(&raw).unwrap();
        assert_eq!(result.summary.unwrap().interaction_count, Some(2));
    }

    #[test]
    fn test_parse_tolerates_out_of_range_integers() {
        for raw in [
            r#"{"patient_context":{"age":-1}}"#,
            r#"{"summary":{"interaction_count":-1}}"#,
            r#"{"summary":{"interaction_count":5000000000}}"#,
        ] {
            let result = parse_analysis(raw).unwrap();
            assert_eq!(result.patient_context.and_then(|p| p.age), None, "{}", raw);
            assert_eq!(result.summary.and_then(|s| s.interaction_count), None, "{}", raw);
        }

        let err = parse_analysis(r#"{"patient_context":{"age":"seventy"}}"#).unwrap_err();
        assert_eq!(err.kind(), AnalysisErrorKind::InvalidResponseFormat);
    }

    #[test]
    fn test_parse_empty_object() {
        let result = parse_analysis("{}").unwrap();
        assert!(result.summary.is_none());
        assert!(result.top_risks().is_empty());
    }
}
