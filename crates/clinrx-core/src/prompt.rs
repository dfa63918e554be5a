//! User prompt template and builder.
//!
//! The template carries one `{{field_name}}` placeholder per [`RegimenField`].

use crate::models::{RegimenField, RegimenInput};

/// Substituted for any field whose value is empty.
pub const NOT_PROVIDED: &str = "Not provided";

/// User prompt template for regimen analysis.
pub const USER_PROMPT_TEMPLATE: &str = r#"
Task: Analyze interaction risks and propose safer alternatives.

Drugs (generic if possible):
{{drug_list}}

OTC / Herbal / Substances:
{{otc_herbal}}

Indication / Goals:
{{indications}}

Patient factors:
Age: {{age}}
Sex: {{sex}}
Pregnancy/Lactation: {{pregnancy_lactation}}
Weight/BMI: {{weight_bmi}}
Renal function: {{renal_function}}
Hepatic function: {{hepatic_function}}
Comorbidities: {{comorbidities}}
Allergies/intolerances: {{allergies}}
Vitals/baseline tests: {{baseline_tests}}

Region/Locale:
{{region}}

Audience & Detail:
audience={{audience}}
summary_level={{summary_level}}
language={{language}}

Constraints:
- Prefer generics; show brand in parentheses when helpful.
- Show top 5 interactions by severity first.
- Always include red-flag symptoms and monitoring plan.
- Include 3–5 safer alternatives with rationale.
"#;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Build the user prompt for a regimen snapshot.
pub fn build_user_prompt(input: &RegimenInput) -> String {
    debug_assert!(
        placeholders_match_fields(USER_PROMPT_TEMPLATE),
        "prompt template placeholders do not match regimen fields"
    );
    render_template(USER_PROMPT_TEMPLATE, input)
}

/// True when `template` names every regimen field exactly once, in form order.
pub fn placeholders_match_fields(template: &str) -> bool {
    template_placeholders(template)
        .into_iter()
        .eq(RegimenField::ALL.iter().map(|f| f.name()))
}

/// Substitute regimen values into `template`.
///
/// Placeholders naming a regimen field are replaced by its value, or by
/// [`NOT_PROVIDED`] when the value is empty. Unknown placeholders are left as-is.
/// Substituted values are never scanned for further placeholders.
pub fn render_template(template: &str, input: &RegimenInput) -> String {
    let mut out = String::with_capacity(template.len() + 512);
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(len) = after_open.find(CLOSE) else {
            break;
        };

        out.push_str(&rest[..start]);
        let name = &after_open[..len];
        match RegimenField::from_name(name) {
            Ok(field) => {
                let value = input.value(field);
                if value.is_empty() {
                    out.push_str(NOT_PROVIDED);
                } else {
                    out.push_str(&value);
                }
            }
            Err(_) => {
                out.push_str(OPEN);
                out.push_str(name);
                out.push_str(CLOSE);
            }
        }
        rest = &after_open[len + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Placeholder names in `template`, in order of appearance.
pub fn template_placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(len) = after_open.find(CLOSE) else {
            break;
        };
        names.push(&after_open[..len]);
        rest = &after_open[len + CLOSE.len()..];
    }

    names
}
