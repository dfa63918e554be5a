//! Structured interaction report returned by the analysis service.
//!
//! Every nested object and list may be missing or `null` on the wire. Missing data
//! deserializes to `None` or an empty value, never to an error.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire values of the closed severity set, highest first.
pub const SEVERITY_VALUES: [&str; 5] = ["contraindicated", "major", "moderate", "minor", "none"];

/// Interaction risk level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Do not coadminister
    Contraindicated,
    /// Avoid or use with specialist oversight
    Major,
    /// Adjust or monitor
    Moderate,
    /// Minimal clinical relevance
    Minor,
    /// No interaction found
    None,
    /// Any value outside the closed set, kept verbatim
    Unrecognized(String),
}

impl Severity {
    /// Parse a wire value. Never fails; unknown text becomes `Unrecognized`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "contraindicated" => Severity::Contraindicated,
            "major" => Severity::Major,
            "moderate" => Severity::Moderate,
            "minor" => Severity::Minor,
            "none" => Severity::None,
            _ => Severity::Unrecognized(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Contraindicated => "contraindicated",
            Severity::Major => "major",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
            Severity::None => "none",
            Severity::Unrecognized(raw) => raw,
        }
    }

    /// Ordering key: contraindicated is highest, unrecognized lowest.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Contraindicated => 5,
            Severity::Major => 4,
            Severity::Moderate => 3,
            Severity::Minor => 2,
            Severity::None => 1,
            Severity::Unrecognized(_) => 0,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Severity::Unrecognized(_))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Severity::parse(&raw))
    }
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integer fields accept any JSON integer; values that do not fit `u32` become `None`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

/// One flagged interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Agents or cluster involved (e.g. "sertraline + sumatriptan")
    #[serde(default, deserialize_with = "null_as_default")]
    pub pair_or_cluster: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Free text: high, moderate, low, insufficient
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mechanism: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_clinical_effect: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_course: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub management: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monitoring: Vec<String>,
}

/// A suggested substitution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_issue: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_drug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proposed_alternative: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rationale: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Demographics echoed back by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub pregnancy_lactation: Option<String>,
    #[serde(default)]
    pub renal_function: Option<String>,
    #[serde(default)]
    pub hepatic_function: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comorbidities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Parsed drug, substance and indication lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimenEcho {
    #[serde(default, deserialize_with = "null_as_default")]
    pub drugs: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub otc_herbal_substances: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indications: Vec<String>,
}

/// Headline figures of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub highest_severity_found: Option<Severity>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub interaction_count: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_risks: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub red_flags: Vec<String>,
}

/// Interactions grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedFindings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_drug: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_disease: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_food: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub drug_herbal_otc: Vec<Interaction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duplicate_therapy: Vec<Interaction>,
}

/// Follow-up monitoring recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPlan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub labs: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vitals_ecg: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symptoms_to_watch: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub follow_up: String,
}

impl MonitoringPlan {
    /// True when no labs, vitals or symptoms are listed.
    pub fn is_empty(&self) -> bool {
        self.labs.is_empty() && self.vitals_ecg.is_empty() && self.symptoms_to_watch.is_empty()
    }
}

/// Complete analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub patient_context: Option<PatientContext>,
    #[serde(default)]
    pub inputs: Option<RegimenEcho>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub detailed_findings: Option<DetailedFindings>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub monitoring_plan: Option<MonitoringPlan>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub patient_counseling_points: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources_to_verify: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disclaimer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub markdown_summary: String,
}

impl AnalysisResult {
    pub fn top_risks(&self) -> &[Interaction] {
        self.summary.as_ref().map(|s| s.top_risks.as_slice()).unwrap_or(&[])
    }

    pub fn red_flags(&self) -> &[String] {
        self.summary.as_ref().map(|s| s.red_flags.as_slice()).unwrap_or(&[])
    }

    pub fn highest_severity_found(&self) -> Option<&Severity> {
        self.summary.as_ref().and_then(|s| s.highest_severity_found.as_ref())
    }
}
