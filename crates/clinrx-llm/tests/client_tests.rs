//! Analysis client tests against an in-process transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clinrx_core::models::{RegimenInput, Severity};
use clinrx_core::report::{combined_findings, ReportOverview, SeverityCategory};
use clinrx_llm::{
    AnalysisClient, AnalysisErrorKind, AnalysisRequest, AnalysisSession, SessionState,
    Transport, TransportError, SYSTEM_INSTRUCTION,
};

const REPORT: &str = r#"{
  "summary": {
    "highest_severity_found": "contraindicated",
    "interaction_count": 2,
    "top_risks": [{"pair_or_cluster": "linezolid + sertraline", "severity": "contraindicated"}],
    "red_flags": ["Agitation, fever, clonus"]
  },
  "detailed_findings": {
    "drug_drug": [
      {"pair_or_cluster": "linezolid + sertraline", "severity": "contraindicated", "monitoring": ["temperature"]}
    ],
    "drug_food": [
      {"pair_or_cluster": "linezolid + aged cheese", "severity": "moderate"}
    ]
  },
  "markdown_summary": "**Avoid** linezolid with sertraline."
}"#;

enum Reply {
    Text(String),
    Status(u16, &'static str),
    Pending,
}

/// Transport double that records requests and returns a canned reply.
struct FakeTransport {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<AnalysisRequest>>,
}

impl FakeTransport {
    fn text(body: &str) -> Self {
        Self::with_reply(Reply::Text(body.to_string()))
    }

    fn status(status: u16, message: &'static str) -> Self {
        Self::with_reply(Reply::Status(status, message))
    }

    fn pending() -> Self {
        Self::with_reply(Reply::Pending)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FakeTransport {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status, message) => Err(TransportError::Status {
                status: *status,
                message: message.to_string(),
            }),
            Reply::Pending => std::future::pending().await,
        }
    }
}

#[tokio::test]
async fn test_analyze_parses_report() {
    let client = AnalysisClient::new(FakeTransport::text(REPORT));
    let result = client.analyze(&RegimenInput::default()).await.unwrap();

    assert_eq!(
        result.highest_severity_found(),
        Some(&Severity::Contraindicated)
    );
    assert_eq!(combined_findings(&result).len(), 2);

    let overview = ReportOverview::from_result(&result);
    assert_eq!(overview.highest_severity, SeverityCategory::Critical);
    assert_eq!(overview.red_flag_count, 1);
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn test_analyze_sends_assembled_request() {
    let mut input = RegimenInput::default();
    input.drug_list = "linezolid 600 mg BID; sertraline 50 mg daily".into();
    input.weight_bmi = String::new();

    let client = AnalysisClient::new(FakeTransport::text(REPORT));
    client.analyze(&input).await.unwrap();

    let sent = client.transport().last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent.system_instruction, SYSTEM_INSTRUCTION);
    assert!(sent.user_prompt.contains("linezolid 600 mg BID; sertraline 50 mg daily"));
    assert!(sent.user_prompt.contains("Weight/BMI: Not provided"));
    assert_eq!(sent, AnalysisRequest::for_regimen(&input));
}

#[tokio::test]
async fn test_analyze_fenced_response() {
    let fenced = format!("```json\n{}\n```", REPORT);
    let client = AnalysisClient::new(FakeTransport::text(&fenced));
    let result = client.analyze(&RegimenInput::default()).await.unwrap();
    assert_eq!(result.markdown_summary, "**Avoid** linezolid with sertraline.");
}

#[tokio::test]
async fn test_analyze_empty_and_invalid_responses() {
    let client = AnalysisClient::new(FakeTransport::text("  \n "));
    let err = client.analyze(&RegimenInput::default()).await.unwrap_err();
    assert_eq!(err.kind(), AnalysisErrorKind::EmptyResponse);

    let client = AnalysisClient::new(FakeTransport::text("not json"));
    let err = client.analyze(&RegimenInput::default()).await.unwrap_err();
    assert_eq!(err.kind(), AnalysisErrorKind::InvalidResponseFormat);

    let client = AnalysisClient::new(FakeTransport::text(r#"{"alternatives": {"x": 1}}"#));
    let err = client.analyze(&RegimenInput::default()).await.unwrap_err();
    assert_eq!(err.kind(), AnalysisErrorKind::InvalidResponseFormat);
}

#[tokio::test]
async fn test_transport_error_surfaces_upstream_message() {
    let client = AnalysisClient::new(FakeTransport::status(403, "API key not valid."));
    let err = client.analyze(&RegimenInput::default()).await.unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::TransportFailure);
    assert_eq!(err.user_message(), "API key not valid.");
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let client = AnalysisClient::new(FakeTransport::status(503, ""));
    assert!(client.analyze(&RegimenInput::default()).await.is_err());
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn test_concurrent_analyses_are_independent() {
    let client = Arc::new(AnalysisClient::new(FakeTransport::text(REPORT)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.analyze(&RegimenInput::default()).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(client.transport().calls(), 4);
}

#[tokio::test]
async fn test_session_submit() {
    let client = AnalysisClient::new(FakeTransport::text(REPORT));
    let mut session = AnalysisSession::new();

    let state = session
        .submit(&client, &RegimenInput::default())
        .await
        .unwrap();
    assert!(matches!(state, SessionState::Ready(_)));
    assert!(session.result().is_some());

    let failing = AnalysisClient::new(FakeTransport::text("not json"));
    session.submit(&failing, &RegimenInput::default()).await.unwrap();
    assert_eq!(
        session.error_message(),
        Some("The AI returned an invalid JSON response. Please try again or adjust your inputs.")
    );
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_abandoned_submission_releases_session() {
    let client = AnalysisClient::new(FakeTransport::pending());
    let mut session = AnalysisSession::new();

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        session.submit(&client, &RegimenInput::default()),
    )
    .await;
    assert!(outcome.is_err());
    assert_eq!(client.transport().calls(), 1);

    assert!(!session.is_loading());
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.begin().is_ok());
}
