//! Structural validation of JSON documents against a `FieldSchema`
//!
//! No I/O. Required fields must be present with the declared type, extra
//! fields are allowed, `null` only passes where the field is nullable.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FieldSchema, FieldType};

/// Path used for the document root.
const ROOT: &str = "$";

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "result", content = "violations", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    /// Never empty.
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(v) => v,
        }
    }
}

/// One structural problem at a field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    /// Dot-notation path, e.g. `tags.0.name`; `$` for the root.
    pub field_path: String,
    pub reason: ViolationReason,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationReason {
    /// Required field absent.
    Missing,
    TypeMismatch { expected: FieldType, actual: String },
    /// `null` where the field is not nullable.
    NullNotAllowed,
    /// Value outside the declared enum.
    NotAllowed { value: Value },
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("required field is missing"),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "expected {expected}, got {actual}")
            }
            Self::NullNotAllowed => f.write_str("null is not allowed"),
            Self::NotAllowed { value } => write!(f, "value {value} is not allowed"),
        }
    }
}

/// Validate `document` against `schema`.
///
/// `array_error_cap` stops checking an array after that many failing
/// elements; `None` checks every element. A cap of 0 acts as 1, so an array
/// with a bad element never validates.
#[must_use]
pub fn validate_document(
    document: &Value,
    schema: &FieldSchema,
    array_error_cap: Option<usize>,
) -> ValidationResult {
    let mut violations = Vec::new();
    let cap = array_error_cap.map(|c| c.max(1));
    walk(document, schema, ROOT, cap, &mut violations);
    if violations.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(violations)
    }
}

fn walk(
    value: &Value,
    schema: &FieldSchema,
    path: &str,
    cap: Option<usize>,
    out: &mut Vec<Violation>,
) {
    if value.is_null() {
        if !schema.nullable {
            out.push(violation(path, ViolationReason::NullNotAllowed));
        }
        return;
    }

    if !type_matches(value, schema.field_type) {
        out.push(violation(
            path,
            ViolationReason::TypeMismatch {
                expected: schema.field_type,
                actual: json_type_name(value).to_string(),
            },
        ));
        return;
    }

    if !schema.allowed.is_empty() && !schema.allowed.contains(value) {
        out.push(violation(
            path,
            ViolationReason::NotAllowed {
                value: value.clone(),
            },
        ));
    }

    match value {
        Value::Object(obj) if !schema.fields.is_empty() => {
            for (name, child) in &schema.fields {
                let child_path = join(path, name);
                match obj.get(name) {
                    Some(v) => walk(v, child, &child_path, cap, out),
                    None if child.required => {
                        out.push(violation(&child_path, ViolationReason::Missing));
                    }
                    None => {}
                }
            }
        }
        Value::Array(elements) => {
            let Some(items) = schema.items.as_deref() else {
                return;
            };
            let mut failing = 0usize;
            for (idx, element) in elements.iter().enumerate() {
                let before = out.len();
                walk(element, items, &join(path, &idx.to_string()), cap, out);
                if out.len() > before {
                    failing += 1;
                    if cap.is_some_and(|c| failing >= c) {
                        break;
                    }
                }
            }
        }
        _ => {}
    }
}

fn type_matches(value: &Value, expected: FieldType) -> bool {
    match expected {
        FieldType::String => value.is_string(),
        FieldType::Integer => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Object => value.is_object(),
        FieldType::Array => value.is_array(),
        FieldType::Any => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
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

fn join(path: &str, segment: &str) -> String {
    if path == ROOT {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn violation(path: &str, reason: ViolationReason) -> Violation {
    Violation {
        field_path: path.to_string(),
        reason,
    }
}
