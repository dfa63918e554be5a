//! Analysis client for the generation service.
//!
//! One analysis is one request: build the prompt, await a single `generateContent`
//! call, then clean and parse the returned text. There is no retry.

use std::future::Future;

use clinrx_core::models::{AnalysisResult, RegimenInput};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientResult, TransportError};
use crate::prompts::AnalysisRequest;
use crate::response::parse_analysis;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sends an assembled request and returns the raw generated text.
pub trait Transport: Send + Sync {
    fn generate(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

// =========================================================================
// Gemini wire types
// =========================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// =========================================================================
// Gemini transport
// =========================================================================

/// HTTP transport for the Gemini `generateContent` endpoint.
pub struct GeminiTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl GeminiTransport {
    /// Build the HTTP client with the configured timeouts.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        info!(
            model = config.model(),
            base_url = config.base_url(),
            "Gemini transport created"
        );
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        )
    }
}

impl Transport for GeminiTransport {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String, TransportError> {
        let api_key = self
            .config
            .api_key()
            .ok_or(TransportError::MissingCredential)?;

        let url = self.endpoint();
        debug!("Generating with model {} at {}", self.config.model(), url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&body);
            error!("Generation request failed: {} - {}", status, message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        extract_text(&body)
    }
}

/// `generateContent` request body.
fn request_body(request: &AnalysisRequest) -> Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.user_prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema
        }
    })
}

/// Concatenate the text parts of the first candidate. No candidates yields "".
fn extract_text(body: &str) -> Result<String, TransportError> {
    let envelope: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| TransportError::MalformedEnvelope(e.to_string()))?;

    let Some(candidate) = envelope.candidates.into_iter().next() else {
        if let Some(reason) = envelope.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(block_reason = reason.as_str(), "Prompt was blocked by the service");
        }
        return Ok(String::new());
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            warn!(finish_reason = reason, "Generation finished early");
        }
    }

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default())
}

/// Upstream `error.message`, else the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// =========================================================================
// Analysis client
// =========================================================================

/// Runs regimen analyses over a transport.
pub struct AnalysisClient<T: Transport> {
    transport: T,
}

impl AnalysisClient<GeminiTransport> {
    /// Client backed by the Gemini HTTP transport.
    pub fn from_config(config: ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(GeminiTransport::new(config)?))
    }
}

impl<T: Transport> AnalysisClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Analyze a submitted regimen.
    pub async fn analyze(&self, input: &RegimenInput) -> ClientResult<AnalysisResult> {
        self.analyze_request(&AnalysisRequest::for_regimen(input))
            .await
    }

    /// Send a prepared request and parse the report.
    pub async fn analyze_request(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", %request_id);

        async move {
            info!(
                prompt_chars = request.user_prompt.len(),
                "Submitting regimen for analysis"
            );

            let text = self.transport.generate(request).await.map_err(|e| {
                error!(error = %e, "Analysis transport failed");
                e
            })?;

            match parse_analysis(&text) {
                Ok(result) => {
                    info!(
                        highest_severity = result
                            .highest_severity_found()
                            .map(|s| s.as_str())
                            .unwrap_or("unknown"),
                        top_risks = result.top_risks().len(),
                        "Analysis complete"
                    );
                    Ok(result)
                }
                Err(e) => {
                    warn!(error = ?e, "Analysis response rejected");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}
