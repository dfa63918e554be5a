//! Property tests for response cleaning and parsing.

use clinrx_llm::{clean_response_text, parse_analysis, AnalysisErrorKind};
use proptest::prelude::*;

fn body() -> impl Strategy<Value = String> {
    "[a-z0-9{}\\[\\]\":, ]{1,60}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn padding() -> impl Strategy<Value = String> {
    "[ \t\r\n]{0,4}"
}

proptest! {
    #[test]
    fn fences_and_padding_are_stripped(
        text in body(),
        lead in padding(),
        trail in padding(),
        tag in prop::sample::select(vec!["json", "JSON", "Json", ""]),
    ) {
        let fenced = format!("{}```{}\n{}\n```{}", lead, tag, text, trail);
        prop_assert_eq!(clean_response_text(&fenced).unwrap(), text.trim());
    }

    #[test]
    fn unfenced_text_is_only_trimmed(text in body(), lead in padding(), trail in padding()) {
        let padded = format!("{}{}{}", lead, text, trail);
        prop_assert_eq!(clean_response_text(&padded).unwrap(), text.trim());
    }

    #[test]
    fn parse_never_panics(text in ".{0,200}") {
        match parse_analysis(&text) {
            Ok(_) => prop_assert!(text.contains('{'), "parsed text must contain an opening brace"),
            Err(e) => prop_assert!(matches!(
                e.kind(),
                AnalysisErrorKind::EmptyResponse | AnalysisErrorKind::InvalidResponseFormat
            )),
        }
    }
}
