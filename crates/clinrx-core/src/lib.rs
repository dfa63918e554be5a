//! ClinRx Core Library
//!
//! Request construction and response presentation for AI-assisted drug interaction
//! analysis.
//!
//! # Architecture
//!
//! ```text
//! Field Schema → FormState (user edits) → snapshot: RegimenInput
//!                                                │
//!                                          Prompt Builder
//!                                                │
//!                       ┌────────────────────────▼────────────────────────┐
//!                       │ Analysis Client (clinrx-llm)                    │
//!                       │  system instruction + user prompt + schema      │
//!                       │  → generation service → clean → validate → parse│
//!                       └────────────────────────┬────────────────────────┘
//!                                                │ AnalysisResult
//!                                                ▼
//!                                   Result Normalizer / Presenter
//!                                                │
//!                                          Native front end
//! ```
//!
//! # Modules
//!
//! - [`models`]: Regimen input, form state and the analysis report types
//! - [`prompt`]: User prompt template and builder
//! - [`schema`]: Declarative response schema and validator
//! - [`report`]: Combined findings, severity categories, section state
//! - [`markdown`]: Markdown-lite renderer for the report summary

pub mod markdown;
pub mod models;
pub mod prompt;
pub mod report;
pub mod schema;

// Re-export commonly used types
pub use markdown::{render_markdown_lite, Span, TextBlock};
pub use models::{
    AnalysisResult, Audience, FormState, Interaction, RegimenError, RegimenField, RegimenInput,
    Severity, SummaryLevel,
};
pub use prompt::build_user_prompt;
pub use report::{combined_findings, FindingCategory, ReportOverview, SeverityCategory};
pub use schema::{analysis_response_schema, SchemaNode, Violation};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinRxError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<RegimenError> for ClinRxError {
    fn from(e: RegimenError) -> Self {
        ClinRxError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for ClinRxError {
    fn from(e: serde_json::Error) -> Self {
        ClinRxError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Exported Functions
// =========================================================================

/// Describe every form field, in form order.
#[uniffi::export]
pub fn regimen_fields() -> Vec<FfiFieldSpec> {
    RegimenField::ALL.iter().map(|f| (*f).into()).collect()
}

/// Form values a new session starts with.
#[uniffi::export]
pub fn default_regimen() -> FfiRegimenInput {
    RegimenInput::default().into()
}

/// Build the user prompt for a submitted regimen.
#[uniffi::export]
pub fn build_prompt(regimen: FfiRegimenInput) -> Result<String, ClinRxError> {
    let input = RegimenInput::try_from(regimen)?;
    Ok(build_user_prompt(&input))
}

/// Render a report's markdown summary into display blocks.
#[uniffi::export]
pub fn render_markdown(text: String) -> Vec<FfiTextBlock> {
    render_markdown_lite(&text)
        .into_iter()
        .map(|b| b.into())
        .collect()
}

/// Presentation category for a raw severity value.
#[uniffi::export]
pub fn severity_category(value: Option<String>) -> FfiSeverityCategory {
    match value {
        Some(v) => SeverityCategory::from_str_lenient(&v).into(),
        None => SeverityCategory::Unknown.into(),
    }
}

/// Summarize a report previously produced by the analysis client.
#[uniffi::export]
pub fn summarize_report(result_json: String) -> Result<FfiReportOverview, ClinRxError> {
    let result: AnalysisResult = serde_json::from_str(&result_json)?;
    let overview = ReportOverview::from_result(&result);
    tracing::debug!(
        highest = overview.highest_severity_label.as_str(),
        findings = overview.detailed_finding_count,
        "Summarized analysis report"
    );
    Ok(overview.into())
}

/// Response schema in the generation service's wire form.
#[uniffi::export]
pub fn response_schema_json() -> String {
    analysis_response_schema().to_json().to_string()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe field description.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldSpec {
    pub name: String,
    pub label: String,
    pub example: String,
    pub hint: Option<String>,
    pub group: String,
    pub is_choice: bool,
    pub options: Vec<String>,
}

impl From<RegimenField> for FfiFieldSpec {
    fn from(field: RegimenField) -> Self {
        Self {
            name: field.name().to_string(),
            label: field.label().to_string(),
            example: field.example().to_string(),
            hint: field.hint().map(String::from),
            group: field.group().title().to_string(),
            is_choice: field.kind() == models::FieldKind::Choice,
            options: field.options().iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// FFI-safe regimen input. Choice fields travel as strings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegimenInput {
    pub drug_list: String,
    pub otc_herbal: String,
    pub indications: String,
    pub age: String,
    pub sex: String,
    pub pregnancy_lactation: String,
    pub weight_bmi: String,
    pub renal_function: String,
    pub hepatic_function: String,
    pub comorbidities: String,
    pub allergies: String,
    pub baseline_tests: String,
    pub region: String,
    pub audience: String,
    pub summary_level: String,
    pub language: String,
}

impl From<RegimenInput> for FfiRegimenInput {
    fn from(input: RegimenInput) -> Self {
        Self {
            drug_list: input.drug_list,
            otc_herbal: input.otc_herbal,
            indications: input.indications,
            age: input.age,
            sex: input.sex,
            pregnancy_lactation: input.pregnancy_lactation,
            weight_bmi: input.weight_bmi,
            renal_function: input.renal_function,
            hepatic_function: input.hepatic_function,
            comorbidities: input.comorbidities,
            allergies: input.allergies,
            baseline_tests: input.baseline_tests,
            region: input.region,
            audience: input.audience.to_string(),
            summary_level: input.summary_level.to_string(),
            language: input.language,
        }
    }
}

impl TryFrom<FfiRegimenInput> for RegimenInput {
    type Error = RegimenError;

    fn try_from(input: FfiRegimenInput) -> Result<Self, Self::Error> {
        Ok(RegimenInput {
            drug_list: input.drug_list,
            otc_herbal: input.otc_herbal,
            indications: input.indications,
            age: input.age,
            sex: input.sex,
            pregnancy_lactation: input.pregnancy_lactation,
            weight_bmi: input.weight_bmi,
            renal_function: input.renal_function,
            hepatic_function: input.hepatic_function,
            comorbidities: input.comorbidities,
            allergies: input.allergies,
            baseline_tests: input.baseline_tests,
            region: input.region,
            audience: input.audience.parse()?,
            summary_level: input.summary_level.parse()?,
            language: input.language,
        })
    }
}

/// FFI-safe text span.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSpan {
    pub text: String,
    pub emphasized: bool,
}

/// FFI-safe rendered line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTextBlock {
    pub bullet: bool,
    pub spans: Vec<FfiSpan>,
}

impl From<TextBlock> for FfiTextBlock {
    fn from(block: TextBlock) -> Self {
        Self {
            bullet: block.bullet,
            spans: block
                .spans
                .into_iter()
                .map(|s| FfiSpan {
                    text: s.text,
                    emphasized: s.emphasized,
                })
                .collect(),
        }
    }
}

/// FFI-safe severity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSeverityCategory {
    Critical,
    High,
    Elevated,
    Low,
    Clear,
    Unknown,
}

impl From<SeverityCategory> for FfiSeverityCategory {
    fn from(category: SeverityCategory) -> Self {
        match category {
            SeverityCategory::Critical => FfiSeverityCategory::Critical,
            SeverityCategory::High => FfiSeverityCategory::High,
            SeverityCategory::Elevated => FfiSeverityCategory::Elevated,
            SeverityCategory::Low => FfiSeverityCategory::Low,
            SeverityCategory::Clear => FfiSeverityCategory::Clear,
            SeverityCategory::Unknown => FfiSeverityCategory::Unknown,
        }
    }
}

/// FFI-safe report overview.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportOverview {
    pub highest_severity: FfiSeverityCategory,
    pub highest_severity_label: String,
    pub tone: String,
    pub interaction_count: u32,
    pub red_flag_count: u32,
    pub top_risk_count: u32,
    pub detailed_finding_count: u32,
    pub alternative_count: u32,
    pub summary_understates_risk: bool,
}

impl From<ReportOverview> for FfiReportOverview {
    fn from(overview: ReportOverview) -> Self {
        Self {
            highest_severity: overview.highest_severity.into(),
            tone: overview.highest_severity.tone().to_string(),
            highest_severity_label: overview.highest_severity_label,
            interaction_count: overview.interaction_count,
            red_flag_count: overview.red_flag_count as u32,
            top_risk_count: overview.top_risk_count as u32,
            detailed_finding_count: overview.detailed_finding_count as u32,
            alternative_count: overview.alternative_count as u32,
            summary_understates_risk: overview.summary_understates_risk,
        }
    }
}
