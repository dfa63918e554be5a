//! Regimen input models and the fixed form field schema.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Regimen input errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimenError {
    #[error("Invalid value for {field}: {value}")]
    InvalidChoice { field: String, value: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

pub type RegimenResult<T> = Result<T, RegimenError>;

/// Intended reader of the generated report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Clinician,
    Patient,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Clinician => "clinician",
            Audience::Patient => "patient",
        }
    }
}

impl FromStr for Audience {
    type Err = RegimenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clinician" => Ok(Audience::Clinician),
            "patient" => Ok(Audience::Patient),
            _ => Err(RegimenError::InvalidChoice {
                field: RegimenField::Audience.name().into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much detail the report summary should carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLevel {
    Brief,
    #[default]
    Detailed,
}

impl SummaryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLevel::Brief => "brief",
            SummaryLevel::Detailed => "detailed",
        }
    }
}

impl FromStr for SummaryLevel {
    type Err = RegimenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(SummaryLevel::Brief),
            "detailed" => Ok(SummaryLevel::Detailed),
            _ => Err(RegimenError::InvalidChoice {
                field: RegimenField::SummaryLevel.name().into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SummaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field takes free text or one of a fixed set of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Choice,
}

/// Form section a field is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Medications,
    ClinicalContext,
    Demographics,
    AdditionalFactors,
    AudienceOutput,
}

impl FieldGroup {
    pub fn title(&self) -> &'static str {
        match self {
            FieldGroup::Medications => "Medications & Substances",
            FieldGroup::ClinicalContext => "Clinical Context",
            FieldGroup::Demographics => "Patient Demographics & Vitals",
            FieldGroup::AdditionalFactors => "Additional Patient Factors",
            FieldGroup::AudienceOutput => "Audience & Output",
        }
    }
}

/// One input field of the regimen form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegimenField {
    DrugList,
    OtcHerbal,
    Indications,
    Age,
    Sex,
    PregnancyLactation,
    WeightBmi,
    RenalFunction,
    HepaticFunction,
    Comorbidities,
    Allergies,
    BaselineTests,
    Region,
    Audience,
    SummaryLevel,
    Language,
}

impl RegimenField {
    /// All fields in form order.
    pub const ALL: [RegimenField; 16] = [
        RegimenField::DrugList,
        RegimenField::OtcHerbal,
        RegimenField::Indications,
        RegimenField::Age,
        RegimenField::Sex,
        RegimenField::PregnancyLactation,
        RegimenField::WeightBmi,
        RegimenField::RenalFunction,
        RegimenField::HepaticFunction,
        RegimenField::Comorbidities,
        RegimenField::Allergies,
        RegimenField::BaselineTests,
        RegimenField::Region,
        RegimenField::Audience,
        RegimenField::SummaryLevel,
        RegimenField::Language,
    ];

    /// Field identifier, shared by the wire format and the prompt template.
    pub fn name(&self) -> &'static str {
        match self {
            RegimenField::DrugList => "drug_list",
            RegimenField::OtcHerbal => "otc_herbal",
            RegimenField::Indications => "indications",
            RegimenField::Age => "age",
            RegimenField::Sex => "sex",
            RegimenField::PregnancyLactation => "pregnancy_lactation",
            RegimenField::WeightBmi => "weight_bmi",
            RegimenField::RenalFunction => "renal_function",
            RegimenField::HepaticFunction => "hepatic_function",
            RegimenField::Comorbidities => "comorbidities",
            RegimenField::Allergies => "allergies",
            RegimenField::BaselineTests => "baseline_tests",
            RegimenField::Region => "region",
            RegimenField::Audience => "audience",
            RegimenField::SummaryLevel => "summary_level",
            RegimenField::Language => "language",
        }
    }

    pub fn from_name(name: &str) -> RegimenResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == name)
            .ok_or_else(|| RegimenError::UnknownField(name.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegimenField::DrugList => "Prescription Drugs",
            RegimenField::OtcHerbal => "OTC / Herbal / Substances",
            RegimenField::Indications => "Indications / Goals",
            RegimenField::Age => "Age",
            RegimenField::Sex => "Sex",
            RegimenField::PregnancyLactation => "Pregnancy / Lactation",
            RegimenField::WeightBmi => "Weight / BMI",
            RegimenField::RenalFunction => "Renal Function",
            RegimenField::HepaticFunction => "Hepatic Function",
            RegimenField::Comorbidities => "Comorbidities",
            RegimenField::Allergies => "Allergies / Intolerances",
            RegimenField::BaselineTests => "Vitals / Baseline Tests",
            RegimenField::Region => "Region / Locale",
            RegimenField::Audience => "Audience",
            RegimenField::SummaryLevel => "Detail Level",
            RegimenField::Language => "Language",
        }
    }

    /// Illustrative value the form starts with.
    pub fn example(&self) -> &'static str {
        match self {
            RegimenField::DrugList => {
                "sertraline 100 mg daily; sumatriptan 50 mg PRN; ibuprofen 400 mg TID; omeprazole 20 mg daily"
            }
            RegimenField::OtcHerbal => "caffeine ~300 mg/day, melatonin 3 mg HS",
            RegimenField::Indications => "migraine, generalized anxiety, GERD",
            RegimenField::Age => "29",
            RegimenField::Sex => "Female",
            RegimenField::PregnancyLactation => "none",
            RegimenField::WeightBmi => "",
            RegimenField::RenalFunction => "eGFR 100",
            RegimenField::HepaticFunction => "normal",
            RegimenField::Comorbidities => "none",
            RegimenField::Allergies => "NKDA",
            RegimenField::BaselineTests => "QTc 430 ms",
            RegimenField::Region => "US",
            RegimenField::Audience => "clinician",
            RegimenField::SummaryLevel => "detailed",
            RegimenField::Language => "English",
        }
    }

    /// Input hint shown once the example has been cleared.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            RegimenField::DrugList => Some("e.g., sertraline 100 mg daily..."),
            RegimenField::OtcHerbal => Some("e.g., St. John's wort, melatonin..."),
            RegimenField::Indications => Some("e.g., migraine, GAD, GERD"),
            RegimenField::Comorbidities => Some("e.g., CAD, HF, CKD3"),
            RegimenField::RenalFunction => Some("e.g., eGFR 100"),
            RegimenField::HepaticFunction => Some("e.g., normal"),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            RegimenField::Audience | RegimenField::SummaryLevel => FieldKind::Choice,
            _ => FieldKind::Text,
        }
    }

    /// Allowed values for choice fields.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            RegimenField::Audience => &["clinician", "patient"],
            RegimenField::SummaryLevel => &["detailed", "brief"],
            _ => &[],
        }
    }

    pub fn group(&self) -> FieldGroup {
        match self {
            RegimenField::DrugList | RegimenField::OtcHerbal => FieldGroup::Medications,
            RegimenField::Indications | RegimenField::Comorbidities => FieldGroup::ClinicalContext,
            RegimenField::Age
            | RegimenField::Sex
            | RegimenField::RenalFunction
            | RegimenField::HepaticFunction => FieldGroup::Demographics,
            RegimenField::Audience | RegimenField::SummaryLevel => FieldGroup::AudienceOutput,
            RegimenField::PregnancyLactation
            | RegimenField::WeightBmi
            | RegimenField::Allergies
            | RegimenField::BaselineTests
            | RegimenField::Region
            | RegimenField::Language => FieldGroup::AdditionalFactors,
        }
    }
}

impl fmt::Display for RegimenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Patient and medication details submitted for analysis.
///
/// All values are free text except `audience` and `summary_level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimenInput {
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
    pub audience: Audience,
    pub summary_level: SummaryLevel,
    pub language: String,
}

impl Default for RegimenInput {
    fn default() -> Self {
        let ex = |f: RegimenField| f.example().to_string();
        Self {
            drug_list: ex(RegimenField::DrugList),
            otc_herbal: ex(RegimenField::OtcHerbal),
            indications: ex(RegimenField::Indications),
            age: ex(RegimenField::Age),
            sex: ex(RegimenField::Sex),
            pregnancy_lactation: ex(RegimenField::PregnancyLactation),
            weight_bmi: ex(RegimenField::WeightBmi),
            renal_function: ex(RegimenField::RenalFunction),
            hepatic_function: ex(RegimenField::HepaticFunction),
            comorbidities: ex(RegimenField::Comorbidities),
            allergies: ex(RegimenField::Allergies),
            baseline_tests: ex(RegimenField::BaselineTests),
            region: ex(RegimenField::Region),
            audience: Audience::Clinician,
            summary_level: SummaryLevel::Detailed,
            language: ex(RegimenField::Language),
        }
    }
}

impl RegimenInput {
    /// A regimen with every text field empty.
    pub fn blank() -> Self {
        Self {
            drug_list: String::new(),
            otc_herbal: String::new(),
            indications: String::new(),
            age: String::new(),
            sex: String::new(),
            pregnancy_lactation: String::new(),
            weight_bmi: String::new(),
            renal_function: String::new(),
            hepatic_function: String::new(),
            comorbidities: String::new(),
            allergies: String::new(),
            baseline_tests: String::new(),
            region: String::new(),
            audience: Audience::default(),
            summary_level: SummaryLevel::default(),
            language: String::new(),
        }
    }

    /// Current value of a field.
    pub fn value(&self, field: RegimenField) -> Cow<'_, str> {
        match field {
            RegimenField::Audience => Cow::Borrowed(self.audience.as_str()),
            RegimenField::SummaryLevel => Cow::Borrowed(self.summary_level.as_str()),
            other => Cow::Borrowed(self.text_slot(other).map(String::as_str).unwrap_or("")),
        }
    }

    /// Set a field from its string form. Choice fields must hold a known option.
    pub fn set(&mut self, field: RegimenField, value: impl Into<String>) -> RegimenResult<()> {
        let value = value.into();
        match field {
            RegimenField::Audience => self.audience = value.parse()?,
            RegimenField::SummaryLevel => self.summary_level = value.parse()?,
            other => {
                if let Some(slot) = self.text_slot_mut(other) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }

    /// Set a field by its identifier.
    pub fn set_by_name(&mut self, name: &str, value: impl Into<String>) -> RegimenResult<()> {
        let field = RegimenField::from_name(name)?;
        self.set(field, value)
    }

    fn text_slot(&self, field: RegimenField) -> Option<&String> {
        Some(match field {
            RegimenField::DrugList => &self.drug_list,
            RegimenField::OtcHerbal => &self.otc_herbal,
            RegimenField::Indications => &self.indications,
            RegimenField::Age => &self.age,
            RegimenField::Sex => &self.sex,
            RegimenField::PregnancyLactation => &self.pregnancy_lactation,
            RegimenField::WeightBmi => &self.weight_bmi,
            RegimenField::RenalFunction => &self.renal_function,
            RegimenField::HepaticFunction => &self.hepatic_function,
            RegimenField::Comorbidities => &self.comorbidities,
            RegimenField::Allergies => &self.allergies,
            RegimenField::BaselineTests => &self.baseline_tests,
            RegimenField::Region => &self.region,
            RegimenField::Language => &self.language,
            RegimenField::Audience | RegimenField::SummaryLevel => return None,
        })
    }

    fn text_slot_mut(&mut self, field: RegimenField) -> Option<&mut String> {
        Some(match field {
            RegimenField::DrugList => &mut self.drug_list,
            RegimenField::OtcHerbal => &mut self.otc_herbal,
            RegimenField::Indications => &mut self.indications,
            RegimenField::Age => &mut self.age,
            RegimenField::Sex => &mut self.sex,
            RegimenField::PregnancyLactation => &mut self.pregnancy_lactation,
            RegimenField::WeightBmi => &mut self.weight_bmi,
            RegimenField::RenalFunction => &mut self.renal_function,
            RegimenField::HepaticFunction => &mut self.hepatic_function,
            RegimenField::Comorbidities => &mut self.comorbidities,
            RegimenField::Allergies => &mut self.allergies,
            RegimenField::BaselineTests => &mut self.baseline_tests,
            RegimenField::Region => &mut self.region,
            RegimenField::Language => &mut self.language,
            RegimenField::Audience | RegimenField::SummaryLevel => return None,
        })
    }
}

/// Editable form state with per-field "still showing the example" tracking.
///
/// The modified set only drives styling and the clear-on-focus behaviour. Submission
/// always sends the current values, example text included.
#[derive(Debug, Clone, Default)]
pub struct FormState {
    values: RegimenInput,
    modified: BTreeSet<RegimenField>,
}

impl FormState {
    /// Create a form holding the example values, nothing modified.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a keystroke or selection.
    pub fn edit(&mut self, field: RegimenField, value: impl Into<String>) -> RegimenResult<()> {
        self.values.set(field, value)?;
        self.modified.insert(field);
        Ok(())
    }

    /// Handle focus on a field. Untouched example text is cleared.
    ///
    /// Returns true if the field was cleared.
    pub fn focus(&mut self, field: RegimenField) -> bool {
        if field.kind() == FieldKind::Choice || !self.shows_example(field) {
            return false;
        }
        if let Some(slot) = self.values.text_slot_mut(field) {
            slot.clear();
        }
        self.modified.insert(field);
        true
    }

    pub fn is_modified(&self, field: RegimenField) -> bool {
        self.modified.contains(&field)
    }

    /// True while the field still displays untouched example text.
    pub fn shows_example(&self, field: RegimenField) -> bool {
        !self.modified.contains(&field) && !self.values.value(field).is_empty()
    }

    pub fn values(&self) -> &RegimenInput {
        &self.values
    }

    /// Immutable copy of the current values for submission.
    pub fn snapshot(&self) -> RegimenInput {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_unique() {
        let names: BTreeSet<&str> = RegimenField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), RegimenField::ALL.len());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(RegimenField::from_name("otc_herbal").unwrap(), RegimenField::OtcHerbal);
        assert!(matches!(
            RegimenField::from_name("dose"),
            Err(RegimenError::UnknownField(_))
        ));
    }

    #[test]
    fn test_defaults_are_examples() {
        let input = RegimenInput::default();
        for field in RegimenField::ALL {
            assert_eq!(input.value(field), field.example(), "field {}", field);
        }
    }

    #[test]
    fn test_set_choice_fields() {
        let mut input = RegimenInput::default();
        input.set(RegimenField::Audience, "Patient").unwrap();
        assert_eq!(input.audience, Audience::Patient);

        let err = input.set(RegimenField::SummaryLevel, "verbose").unwrap_err();
        assert_eq!(
            err,
            RegimenError::InvalidChoice {
                field: "summary_level".into(),
                value: "verbose".into()
            }
        );
        assert_eq!(input.summary_level, SummaryLevel::Detailed);
    }

    #[test]
    fn test_serde_uses_field_names() {
        let json = serde_json::to_value(RegimenInput::default()).unwrap();
        for field in RegimenField::ALL {
            assert!(json.get(field.name()).is_some(), "missing {}", field);
        }
        assert_eq!(json["audience"], "clinician");

        let parsed: RegimenInput =
            serde_json::from_str(r#"{"drug_list":"warfarin","audience":"patient"}"#).unwrap();
        assert_eq!(parsed.drug_list, "warfarin");
        assert_eq!(parsed.audience, Audience::Patient);
        // Missing keys fall back to the examples
        assert_eq!(parsed.region, "US");
    }

    #[test]
    fn test_focus_clears_untouched_example() {
        let mut form = FormState::new();
        assert!(form.shows_example(RegimenField::Age));

        assert!(form.focus(RegimenField::Age));
        assert_eq!(form.values().age, "");
        assert!(form.is_modified(RegimenField::Age));

        // Second focus leaves user text alone
        form.edit(RegimenField::Age, "64").unwrap();
        assert!(!form.focus(RegimenField::Age));
        assert_eq!(form.values().age, "64");
    }

    #[test]
    fn test_focus_ignores_choices_and_empty_fields() {
        let mut form = FormState::new();
        assert!(!form.focus(RegimenField::Audience));
        assert!(!form.focus(RegimenField::WeightBmi));
        assert!(!form.is_modified(RegimenField::WeightBmi));
    }

    #[test]
    fn test_snapshot_keeps_untouched_examples() {
        let mut form = FormState::new();
        form.edit(RegimenField::DrugList, "warfarin 5 mg daily").unwrap();

        let snapshot = form.snapshot();
        assert_eq!(snapshot.drug_list, "warfarin 5 mg daily");
        assert_eq!(snapshot.renal_function, "eGFR 100");
    }
}
