//! ClinRx LLM Integration
//!
//! Sends regimens to a generative-AI service and turns its output into analysis
//! reports.
//!
//! # Flow
//!
//! 1. `ClientConfig` is resolved once at startup (environment or `.env`)
//! 2. `AnalysisRequest` pairs the system instruction with the user prompt and
//!    response schema
//! 3. A `Transport` performs the single network call
//! 4. `parse_analysis` cleans fences, validates against the schema and deserializes
//!
//! Errors come back as `AnalysisError`, whose `user_message()` is safe to display.

pub mod client;
pub mod config;
pub mod error;
pub mod prompts;
pub mod response;
pub mod session;

pub use client::{AnalysisClient, GeminiTransport, Transport};
pub use config::{ClientConfig, ConfigError};
pub use error::{AnalysisError, AnalysisErrorKind, ClientResult, TransportError};
pub use prompts::{AnalysisRequest, SYSTEM_INSTRUCTION};
pub use response::{clean_response_text, parse_analysis};
pub use session::{AnalysisSession, SessionBusy, SessionState};
