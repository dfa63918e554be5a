//! Result normalizer and presenter.
//!
//! Derives display-ready aggregates from a parsed [`AnalysisResult`]. Every function
//! here is total: absent nested objects are treated as empty.

use std::collections::BTreeSet;

use crate::models::{AnalysisResult, DetailedFindings, Interaction, Severity};

/// Detailed finding category, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FindingCategory {
    DrugDrug,
    DrugDisease,
    DrugFood,
    DrugHerbalOtc,
    DuplicateTherapy,
}

impl FindingCategory {
    pub const ALL: [FindingCategory; 5] = [
        FindingCategory::DrugDrug,
        FindingCategory::DrugDisease,
        FindingCategory::DrugFood,
        FindingCategory::DrugHerbalOtc,
        FindingCategory::DuplicateTherapy,
    ];

    /// Key of the category in `detailed_findings`.
    pub fn key(&self) -> &'static str {
        match self {
            FindingCategory::DrugDrug => "drug_drug",
            FindingCategory::DrugDisease => "drug_disease",
            FindingCategory::DrugFood => "drug_food",
            FindingCategory::DrugHerbalOtc => "drug_herbal_otc",
            FindingCategory::DuplicateTherapy => "duplicate_therapy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FindingCategory::DrugDrug => "Drug–Drug",
            FindingCategory::DrugDisease => "Drug–Disease",
            FindingCategory::DrugFood => "Drug–Food/Alcohol",
            FindingCategory::DrugHerbalOtc => "Drug–Herbal/OTC",
            FindingCategory::DuplicateTherapy => "Duplicate Therapy",
        }
    }

    fn findings<'a>(&self, detailed: &'a DetailedFindings) -> &'a [Interaction] {
        match self {
            FindingCategory::DrugDrug => &detailed.drug_drug,
            FindingCategory::DrugDisease => &detailed.drug_disease,
            FindingCategory::DrugFood => &detailed.drug_food,
            FindingCategory::DrugHerbalOtc => &detailed.drug_herbal_otc,
            FindingCategory::DuplicateTherapy => &detailed.duplicate_therapy,
        }
    }
}

/// Detailed findings with their category, in category order.
pub fn categorized_findings(result: &AnalysisResult) -> Vec<(FindingCategory, &Interaction)> {
    let Some(detailed) = result.detailed_findings.as_ref() else {
        return Vec::new();
    };

    FindingCategory::ALL
        .iter()
        .flat_map(|category| {
            category
                .findings(detailed)
                .iter()
                .map(move |finding| (*category, finding))
        })
        .collect()
}

/// All detailed findings concatenated in category order.
pub fn combined_findings(result: &AnalysisResult) -> Vec<&Interaction> {
    categorized_findings(result)
        .into_iter()
        .map(|(_, finding)| finding)
        .collect()
}

/// Number of findings in one category.
pub fn category_count(result: &AnalysisResult, category: FindingCategory) -> usize {
    result
        .detailed_findings
        .as_ref()
        .map(|d| category.findings(d).len())
        .unwrap_or(0)
}

/// Presentation category for a severity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityCategory {
    Critical,
    High,
    Elevated,
    Low,
    Clear,
    Unknown,
}

impl SeverityCategory {
    /// Map a parsed severity. Absent and unrecognized values map to `Unknown`.
    pub fn from_severity(severity: Option<&Severity>) -> Self {
        match severity {
            Some(Severity::Contraindicated) => SeverityCategory::Critical,
            Some(Severity::Major) => SeverityCategory::High,
            Some(Severity::Moderate) => SeverityCategory::Elevated,
            Some(Severity::Minor) => SeverityCategory::Low,
            Some(Severity::None) => SeverityCategory::Clear,
            Some(Severity::Unrecognized(_)) | None => SeverityCategory::Unknown,
        }
    }

    /// Map a raw wire string.
    pub fn from_str_lenient(value: &str) -> Self {
        Self::from_severity(Some(&Severity::parse(value)))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityCategory::Critical => "Contraindicated",
            SeverityCategory::High => "Major",
            SeverityCategory::Elevated => "Moderate",
            SeverityCategory::Low => "Minor",
            SeverityCategory::Clear => "None",
            SeverityCategory::Unknown => "Unknown",
        }
    }

    /// Colour family used by the front end.
    pub fn tone(&self) -> &'static str {
        match self {
            SeverityCategory::Critical => "red",
            SeverityCategory::High => "orange",
            SeverityCategory::Elevated => "yellow",
            SeverityCategory::Low => "blue",
            SeverityCategory::Clear => "green",
            SeverityCategory::Unknown => "gray",
        }
    }

    /// Whether the banner should draw attention.
    pub fn is_alarming(&self) -> bool {
        matches!(self, SeverityCategory::Critical | SeverityCategory::High)
    }
}

/// Highest severity among top risks and detailed findings.
///
/// Used to detect a summary that disagrees with its own findings.
pub fn observed_highest_severity(result: &AnalysisResult) -> Option<&Severity> {
    result
        .top_risks()
        .iter()
        .chain(combined_findings(result))
        .filter_map(|i| i.severity.as_ref())
        .filter(|s| s.is_recognized())
        .max_by_key(|s| s.rank())
}

/// Figures shown in the status banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOverview {
    pub highest_severity: SeverityCategory,
    /// Display label, "Unknown" when the summary has no severity
    pub highest_severity_label: String,
    /// As reported by the service, 0 when absent
    pub interaction_count: u32,
    pub red_flag_count: usize,
    pub top_risk_count: usize,
    pub detailed_finding_count: usize,
    pub alternative_count: usize,
    /// Findings list a higher severity than the summary reports
    pub summary_understates_risk: bool,
}

impl ReportOverview {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let reported = result.highest_severity_found();
        let highest_severity = SeverityCategory::from_severity(reported);
        let reported_rank = reported.map(Severity::rank).unwrap_or(0);
        let observed_rank = observed_highest_severity(result)
            .map(Severity::rank)
            .unwrap_or(0);

        Self {
            highest_severity,
            highest_severity_label: highest_severity.label().to_string(),
            interaction_count: result
                .summary
                .as_ref()
                .and_then(|s| s.interaction_count)
                .unwrap_or(0),
            red_flag_count: result.red_flags().len(),
            top_risk_count: result.top_risks().len(),
            detailed_finding_count: combined_findings(result).len(),
            alternative_count: result.alternatives.len(),
            summary_understates_risk: observed_rank > reported_rank,
        }
    }
}

/// Sections of the results view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportSection {
    Summary,
    RedFlags,
    PriorityInteractions,
    DetailedFindings,
    Alternatives,
    MonitoringPlan,
    CounselingPoints,
    Sources,
    Disclaimer,
}

impl ReportSection {
    pub const ALL: [ReportSection; 9] = [
        ReportSection::Summary,
        ReportSection::RedFlags,
        ReportSection::PriorityInteractions,
        ReportSection::DetailedFindings,
        ReportSection::Alternatives,
        ReportSection::MonitoringPlan,
        ReportSection::CounselingPoints,
        ReportSection::Sources,
        ReportSection::Disclaimer,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ReportSection::Summary => "Clinical Summary",
            ReportSection::RedFlags => "Red Flags – Urgent Attention Required",
            ReportSection::PriorityInteractions => "Priority Interactions",
            ReportSection::DetailedFindings => "Detailed Findings",
            ReportSection::Alternatives => "Proposed Alternatives",
            ReportSection::MonitoringPlan => "Monitoring Plan",
            ReportSection::CounselingPoints => "Counseling Points",
            ReportSection::Sources => "Reference Sources to Verify",
            ReportSection::Disclaimer => "Disclaimer",
        }
    }

    /// Number of entries shown in the section header.
    pub fn count(&self, result: &AnalysisResult) -> usize {
        match self {
            ReportSection::Summary | ReportSection::Disclaimer => 0,
            ReportSection::RedFlags => result.red_flags().len(),
            ReportSection::PriorityInteractions => result.top_risks().len(),
            ReportSection::DetailedFindings => combined_findings(result).len(),
            ReportSection::Alternatives => result.alternatives.len(),
            ReportSection::MonitoringPlan => result
                .monitoring_plan
                .as_ref()
                .map(|p| p.labs.len() + p.vitals_ecg.len() + p.symptoms_to_watch.len())
                .unwrap_or(0),
            ReportSection::CounselingPoints => result.patient_counseling_points.len(),
            ReportSection::Sources => result.sources_to_verify.len(),
        }
    }

    /// Whether the section is rendered at all.
    ///
    /// Sections with an empty-state message are always shown.
    pub fn visible(&self, result: &AnalysisResult) -> bool {
        match self {
            ReportSection::Summary
            | ReportSection::PriorityInteractions
            | ReportSection::MonitoringPlan
            | ReportSection::CounselingPoints
            | ReportSection::Disclaimer => true,
            ReportSection::RedFlags
            | ReportSection::DetailedFindings
            | ReportSection::Alternatives
            | ReportSection::Sources => self.count(result) > 0,
        }
    }

    /// Text shown when a visible section has nothing to list.
    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            ReportSection::PriorityInteractions => Some("No priority interactions identified."),
            ReportSection::MonitoringPlan => Some("No specific monitoring plan provided."),
            ReportSection::CounselingPoints => Some("No specific counseling points provided."),
            _ => None,
        }
    }

    /// Whether the user can collapse the section.
    pub fn collapsible(&self) -> bool {
        matches!(
            self,
            ReportSection::Summary
                | ReportSection::PriorityInteractions
                | ReportSection::DetailedFindings
                | ReportSection::Alternatives
        )
    }
}

/// Open/closed state of collapsible sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionToggles {
    open: BTreeSet<ReportSection>,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            open: [
                ReportSection::Summary,
                ReportSection::PriorityInteractions,
                ReportSection::Alternatives,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl SectionToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a collapsible section. Returns the new open state.
    pub fn toggle(&mut self, section: ReportSection) -> bool {
        if !section.collapsible() {
            return true;
        }
        if !self.open.remove(&section) {
            self.open.insert(section);
        }
        self.is_open(section)
    }

    /// Non-collapsible sections are always open.
    pub fn is_open(&self, section: ReportSection) -> bool {
        !section.collapsible() || self.open.contains(&section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Summary, SEVERITY_VALUES};

    fn interaction(name: &str, severity: Option<Severity>) -> Interaction {
        Interaction {
            pair_or_cluster: name.into(),
            severity,
            ..Default::default()
        }
    }

    #[test]
    fn test_combined_findings_absent() {
        let result = AnalysisResult::default();
        assert!(combined_findings(&result).is_empty());
        assert_eq!(category_count(&result, FindingCategory::DrugFood), 0);
    }

    #[test]
    fn test_combined_findings_order() {
        let result = AnalysisResult {
            detailed_findings: Some(DetailedFindings {
                duplicate_therapy: vec![interaction("dup", None)],
                drug_drug: vec![interaction("dd1", None), interaction("dd2", None)],
                drug_herbal_otc: vec![interaction("herb", None)],
                ..Default::default()
            }),
            ..Default::default()
        };

        let names: Vec<&str> = combined_findings(&result)
            .iter()
            .map(|i| i.pair_or_cluster.as_str())
            .collect();
        assert_eq!(names, ["dd1", "dd2", "herb", "dup"]);

        let categories: Vec<FindingCategory> =
            categorized_findings(&result).iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            [
                FindingCategory::DrugDrug,
                FindingCategory::DrugDrug,
                FindingCategory::DrugHerbalOtc,
                FindingCategory::DuplicateTherapy
            ]
        );
    }

    #[test]
    fn test_severity_category_mapping() {
        let expected = [
            SeverityCategory::Critical,
            SeverityCategory::High,
            SeverityCategory::Elevated,
            SeverityCategory::Low,
            SeverityCategory::Clear,
        ];
        for (value, category) in SEVERITY_VALUES.iter().zip(expected) {
            assert_eq!(SeverityCategory::from_str_lenient(value), category);
        }
        assert_eq!(
            SeverityCategory::from_str_lenient("catastrophic"),
            SeverityCategory::Unknown
        );
        assert_eq!(SeverityCategory::from_severity(None), SeverityCategory::Unknown);
        assert_eq!(SeverityCategory::Unknown.tone(), "gray");
    }

    #[test]
    fn test_overview_defaults() {
        let overview = ReportOverview::from_result(&AnalysisResult::default());
        assert_eq!(overview.highest_severity, SeverityCategory::Unknown);
        assert_eq!(overview.highest_severity_label, "Unknown");
        assert_eq!(overview.interaction_count, 0);
        assert_eq!(overview.red_flag_count, 0);
        assert!(!overview.summary_understates_risk);
    }

    #[test]
    fn test_overview_counts() {
        let result = AnalysisResult {
            summary: Some(Summary {
                highest_severity_found: Some(Severity::Moderate),
                interaction_count: Some(4),
                top_risks: vec![interaction("a", Some(Severity::Moderate))],
                red_flags: vec!["chest pain".into(), "syncope".into()],
            }),
            detailed_findings: Some(DetailedFindings {
                drug_drug: vec![interaction("b", Some(Severity::Major))],
                ..Default::default()
            }),
            ..Default::default()
        };

        let overview = ReportOverview::from_result(&result);
        assert_eq!(overview.highest_severity, SeverityCategory::Elevated);
        assert_eq!(overview.interaction_count, 4);
        assert_eq!(overview.red_flag_count, 2);
        assert_eq!(overview.top_risk_count, 1);
        assert_eq!(overview.detailed_finding_count, 1);
        assert!(overview.summary_understates_risk);
        assert_eq!(observed_highest_severity(&result), Some(&Severity::Major));
    }

    #[test]
    fn test_section_visibility() {
        let result = AnalysisResult::default();
        assert!(ReportSection::PriorityInteractions.visible(&result));
        assert!(!ReportSection::RedFlags.visible(&result));
        assert!(!ReportSection::Alternatives.visible(&result));
        assert_eq!(
            ReportSection::MonitoringPlan.empty_message(),
            Some("No specific monitoring plan provided.")
        );
    }

    #[test]
    fn test_section_toggles() {
        let mut toggles = SectionToggles::new();
        assert!(toggles.is_open(ReportSection::Summary));
        assert!(!toggles.is_open(ReportSection::DetailedFindings));
        assert!(toggles.is_open(ReportSection::MonitoringPlan));

        assert!(toggles.toggle(ReportSection::DetailedFindings));
        assert!(!toggles.toggle(ReportSection::Summary));
        assert!(toggles.toggle(ReportSection::MonitoringPlan));
        assert!(toggles.is_open(ReportSection::MonitoringPlan));
    }
}
