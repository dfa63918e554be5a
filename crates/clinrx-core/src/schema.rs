//! Declarative response schema for the analysis report.
//!
//! The same descriptor is sent to the generation service as an output constraint and
//! used to validate the parsed JSON, independent of how the request was transmitted.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::models::SEVERITY_VALUES;

/// A node in the response schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        properties: Vec<(&'static str, SchemaNode)>,
        nullable: bool,
    },
    Array {
        items: Box<SchemaNode>,
    },
    String {
        nullable: bool,
        allowed: Option<&'static [&'static str]>,
        description: Option<&'static str>,
    },
    Integer {
        nullable: bool,
    },
}

impl SchemaNode {
    pub fn object(properties: Vec<(&'static str, SchemaNode)>) -> Self {
        SchemaNode::Object {
            properties,
            nullable: false,
        }
    }

    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
        }
    }

    pub fn string() -> Self {
        SchemaNode::String {
            nullable: false,
            allowed: None,
            description: None,
        }
    }

    pub fn integer() -> Self {
        SchemaNode::Integer { nullable: false }
    }

    /// String restricted to a closed set of values.
    pub fn one_of(values: &'static [&'static str]) -> Self {
        SchemaNode::String {
            nullable: false,
            allowed: Some(values),
            description: None,
        }
    }

    /// Mark this node as accepting `null`.
    pub fn nullable(mut self) -> Self {
        match &mut self {
            SchemaNode::Object { nullable, .. }
            | SchemaNode::String { nullable, .. }
            | SchemaNode::Integer { nullable } => *nullable = true,
            SchemaNode::Array { .. } => {}
        }
        self
    }

    /// Attach a description (strings only).
    pub fn described(mut self, text: &'static str) -> Self {
        if let SchemaNode::String { description, .. } = &mut self {
            *description = Some(text);
        }
        self
    }

    /// Look up a direct child property of an object node.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object { properties, .. } => properties
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Wire form accepted by the Gemini `responseSchema` field.
    pub fn to_json(&self) -> Value {
        match self {
            SchemaNode::Object {
                properties,
                nullable,
            } => {
                let mut props = Map::new();
                for (name, node) in properties {
                    props.insert((*name).to_string(), node.to_json());
                }
                let mut out = json!({ "type": "OBJECT", "properties": props });
                if *nullable {
                    out["nullable"] = json!(true);
                }
                out
            }
            SchemaNode::Array { items } => json!({ "type": "ARRAY", "items": items.to_json() }),
            SchemaNode::String {
                nullable,
                allowed,
                description,
            } => {
                let mut out = json!({ "type": "STRING" });
                if *nullable {
                    out["nullable"] = json!(true);
                }
                if let Some(values) = allowed {
                    out["format"] = json!("enum");
                    out["enum"] = json!(values);
                }
                if let Some(text) = description {
                    out["description"] = json!(text);
                }
                out
            }
            SchemaNode::Integer { nullable } => {
                let mut out = json!({ "type": "INTEGER" });
                if *nullable {
                    out["nullable"] = json!(true);
                }
                out
            }
        }
    }

    /// Check a parsed document against this schema.
    ///
    /// Missing properties and `null` values are accepted. Extra properties are ignored.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.walk(value, String::new(), &mut violations);
        violations
    }

    fn walk(&self, value: &Value, path: String, out: &mut Vec<Violation>) {
        if value.is_null() {
            return;
        }

        match self {
            SchemaNode::Object { properties, .. } => {
                let Some(map) = value.as_object() else {
                    out.push(Violation::mismatch(path, "object", value));
                    return;
                };
                for (name, node) in properties {
                    if let Some(child) = map.get(*name) {
                        node.walk(child, format!("{}/{}", path, name), out);
                    }
                }
            }
            SchemaNode::Array { items } => {
                let Some(list) = value.as_array() else {
                    out.push(Violation::mismatch(path, "array", value));
                    return;
                };
                for (idx, item) in list.iter().enumerate() {
                    items.walk(item, format!("{}/{}", path, idx), out);
                }
            }
            SchemaNode::String { allowed, .. } => {
                let Some(text) = value.as_str() else {
                    out.push(Violation::mismatch(path, "string", value));
                    return;
                };
                if let Some(values) = allowed {
                    let normalized = text.trim().to_lowercase();
                    if !values.iter().any(|v| *v == normalized) {
                        out.push(Violation {
                            path,
                            kind: ViolationKind::NotInEnum {
                                value: text.to_string(),
                            },
                        });
                    }
                }
            }
            SchemaNode::Integer { .. } => {
                if value.as_i64().is_none() && value.as_u64().is_none() {
                    out.push(Violation::mismatch(path, "integer", value));
                }
            }
        }
    }
}

/// What went wrong at a schema location.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// JSON type differs from the declared one
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// String outside a closed value set
    NotInEnum { value: String },
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON pointer to the offending value ("" is the document root)
    pub path: String,
    pub kind: ViolationKind,
}

impl Violation {
    fn mismatch(path: String, expected: &'static str, value: &Value) -> Self {
        Violation {
            path,
            kind: ViolationKind::TypeMismatch {
                expected,
                found: json_type_name(value),
            },
        }
    }

    /// Structural violations make the document unusable. Enum violations do not.
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ViolationKind::TypeMismatch { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match &self.kind {
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "{}: expected {}, found {}", path, expected, found)
            }
            ViolationKind::NotInEnum { value } => {
                write!(f, "{}: unexpected value {:?}", path, value)
            }
        }
    }
}

/// JSON type of `value` as named in violations. Integers and other numbers differ.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string_list() -> SchemaNode {
    SchemaNode::array(SchemaNode::string())
}

/// Schema of a single interaction entry.
pub fn interaction_schema() -> SchemaNode {
    SchemaNode::object(vec![
        ("pair_or_cluster", SchemaNode::string()),
        ("severity", SchemaNode::one_of(&SEVERITY_VALUES)),
        ("evidence_level", SchemaNode::string()),
        ("mechanism", SchemaNode::string()),
        ("expected_clinical_effect", SchemaNode::string()),
        ("time_course", SchemaNode::string()),
        ("management", SchemaNode::string()),
        ("monitoring", string_list()),
    ])
}

/// Schema of the complete analysis report.
pub fn analysis_response_schema() -> SchemaNode {
    SchemaNode::object(vec![
        (
            "patient_context",
            SchemaNode::object(vec![
                ("age", SchemaNode::integer().nullable()),
                ("sex", SchemaNode::string().nullable()),
                ("pregnancy_lactation", SchemaNode::string().nullable()),
                ("renal_function", SchemaNode::string().nullable()),
                ("hepatic_function", SchemaNode::string().nullable()),
                ("comorbidities", string_list()),
                ("allergies", string_list()),
                ("region", SchemaNode::string().nullable()),
            ]),
        ),
        (
            "inputs",
            SchemaNode::object(vec![
                ("drugs", string_list()),
                ("otc_herbal_substances", string_list()),
                ("indications", string_list()),
            ]),
        ),
        ("assumptions", string_list()),
        (
            "summary",
            SchemaNode::object(vec![
                ("highest_severity_found", SchemaNode::one_of(&SEVERITY_VALUES)),
                ("interaction_count", SchemaNode::integer()),
                ("top_risks", SchemaNode::array(interaction_schema())),
                ("red_flags", string_list()),
            ]),
        ),
        (
            "detailed_findings",
            SchemaNode::object(vec![
                ("drug_drug", SchemaNode::array(interaction_schema())),
                ("drug_disease", SchemaNode::array(interaction_schema())),
                ("drug_food", SchemaNode::array(interaction_schema())),
                ("drug_herbal_otc", SchemaNode::array(interaction_schema())),
                ("duplicate_therapy", SchemaNode::array(interaction_schema())),
            ]),
        ),
        (
            "alternatives",
            SchemaNode::array(SchemaNode::object(vec![
                ("target_issue", SchemaNode::string()),
                ("current_drug", SchemaNode::string()),
                ("proposed_alternative", SchemaNode::string()),
                ("rationale", SchemaNode::string()),
                ("notes", SchemaNode::string()),
            ])),
        ),
        (
            "monitoring_plan",
            SchemaNode::object(vec![
                ("labs", string_list()),
                ("vitals_ecg", string_list()),
                ("symptoms_to_watch", string_list()),
                ("follow_up", SchemaNode::string()),
            ]),
        ),
        ("patient_counseling_points", string_list()),
        ("sources_to_verify", string_list()),
        ("disclaimer", SchemaNode::string()),
        (
            "markdown_summary",
            SchemaNode::string()
                .described("A human-readable summary of the findings in Markdown format."),
        ),
    ])
}
