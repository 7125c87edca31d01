//! Structural schema definitions and the registry they live in
//!
//! Definitions are loaded once at process start and shared read-only by every
//! scenario. The format is a small JSON-Schema subset: types, required and
//! nullable flags, nested objects, array items and enums.

mod builtin;
mod validate;

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub use validate::{ValidationResult, Violation, ViolationReason, validate_document};

/// Maximum nesting depth accepted when reading schema documents.
const MAX_DEPTH: u32 = 20;

/// JSON type a field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Any non-null value.
    Any,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of one field (or of a whole document, at the root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Child fields when `field_type` is `object`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSchema>,
    /// Element schema when `field_type` is `array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
    /// Allowed values (enum). Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Value>,
}

impl FieldSchema {
    #[must_use]
    pub const fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            nullable: false,
            fields: BTreeMap::new(),
            items: None,
            allowed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldType::String)
    }

    #[must_use]
    pub const fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::of(FieldType::Number)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    #[must_use]
    pub const fn object() -> Self {
        Self::of(FieldType::Object)
    }

    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(FieldType::Array)
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: Self) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Read a JSON-Schema-like document.
    ///
    /// Understands `type` (string, or array that may include `"null"`),
    /// `properties`, `required`, `items`, `enum` and OpenAPI's `nullable`.
    /// A missing `type` is inferred from `properties`/`items`, else `any`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Invalid` for unknown types or malformed keywords.
    pub fn from_json_schema(doc: &Value) -> Result<Self, SchemaError> {
        from_json_schema_inner(doc, "$", 0)
    }

    /// Export as a JSON Schema (draft 2020-12) document.
    ///
    /// Additional properties stay allowed, matching the validator.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut out = serde_json::Map::new();
        let type_value = match (self.field_type, self.nullable) {
            (FieldType::Any, _) => None,
            (t, false) => Some(json!(t.as_str())),
            (t, true) => Some(json!([t.as_str(), "null"])),
        };
        if let Some(t) = type_value {
            out.insert("type".into(), t);
        }
        if !self.fields.is_empty() {
            let props: serde_json::Map<String, Value> = self
                .fields
                .iter()
                .map(|(name, f)| (name.clone(), f.to_json_schema()))
                .collect();
            let required: Vec<&String> = self
                .fields
                .iter()
                .filter(|(_, f)| f.required)
                .map(|(name, _)| name)
                .collect();
            out.insert("properties".into(), Value::Object(props));
            if !required.is_empty() {
                out.insert("required".into(), json!(required));
            }
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.to_json_schema());
        }
        if !self.allowed.is_empty() {
            let mut allowed = self.allowed.clone();
            if self.nullable {
                allowed.push(Value::Null);
            }
            out.insert("enum".into(), Value::Array(allowed));
        }
        Value::Object(out)
    }
}

fn from_json_schema_inner(doc: &Value, path: &str, depth: u32) -> Result<FieldSchema, SchemaError> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::Invalid(format!("{path}: nesting too deep")));
    }
    let obj = doc
        .as_object()
        .ok_or_else(|| SchemaError::Invalid(format!("{path}: schema must be an object")))?;

    let mut nullable = obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    let declared = match obj.get("type") {
        None => None,
        Some(Value::String(t)) => Some(t.clone()),
        Some(Value::Array(types)) => {
            let mut non_null = Vec::new();
            for t in types {
                match t.as_str() {
                    Some("null") => nullable = true,
                    Some(other) => non_null.push(other.to_string()),
                    None => {
                        return Err(SchemaError::Invalid(format!("{path}: type entries must be strings")));
                    }
                }
            }
            if non_null.len() > 1 {
                return Err(SchemaError::Invalid(format!(
                    "{path}: union types are not supported ({})",
                    non_null.join(", ")
                )));
            }
            non_null.pop()
        }
        Some(_) => return Err(SchemaError::Invalid(format!("{path}: invalid 'type'"))),
    };

    let field_type = match declared.as_deref() {
        Some(name) => FieldType::parse(name)
            .ok_or_else(|| SchemaError::Invalid(format!("{path}: unknown type '{name}'")))?,
        None if obj.contains_key("properties") => FieldType::Object,
        None if obj.contains_key("items") => FieldType::Array,
        None => FieldType::Any,
    };

    let mut schema = FieldSchema {
        nullable,
        ..FieldSchema::of(field_type)
    };

    if let Some(props) = obj.get("properties") {
        let props = props
            .as_object()
            .ok_or_else(|| SchemaError::Invalid(format!("{path}: 'properties' must be an object")))?;
        for (name, sub) in props {
            let child = from_json_schema_inner(sub, &format!("{path}.{name}"), depth + 1)?;
            schema.fields.insert(name.clone(), child);
        }
    }

    if let Some(required) = obj.get("required") {
        let names = required
            .as_array()
            .ok_or_else(|| SchemaError::Invalid(format!("{path}: 'required' must be an array")))?;
        for name in names.iter().filter_map(Value::as_str) {
            match schema.fields.get_mut(name) {
                Some(field) => field.required = true,
                // Required but untyped: presence is all we can check.
                None => {
                    schema
                        .fields
                        .insert(name.to_string(), FieldSchema::of(FieldType::Any).required());
                }
            }
        }
    }

    if let Some(items) = obj.get("items") {
        let item = from_json_schema_inner(items, &format!("{path}[]"), depth + 1)?;
        schema.items = Some(Box::new(item));
    }

    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        schema.allowed = values.iter().filter(|v| !v.is_null()).cloned().collect();
        if values.iter().any(Value::is_null) {
            schema.nullable = true;
        }
    }

    Ok(schema)
}

/// A named document schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDefinition {
    pub name: String,
    pub root: FieldSchema,
}

/// Named schema definitions, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: BTreeMap<String, SchemaDefinition>,
    array_error_cap: Option<usize>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the Pet Store resource schemas.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in builtin::definitions() {
            registry.insert(def);
        }
        registry
    }

    /// Limit how many failing array indices are reported per array.
    #[must_use]
    pub fn with_array_error_cap(mut self, cap: Option<usize>) -> Self {
        self.array_error_cap = cap;
        self
    }

    pub fn insert(&mut self, definition: SchemaDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Load every `.json`, `.yaml` and `.yml` file in `dir`.
    ///
    /// The file stem becomes the schema name; an existing definition with the
    /// same name is replaced. Returns the loaded names.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or a file cannot be read or parsed.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>, SchemaError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SchemaError::Io(format!("{}: {e}", dir.display())))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SchemaError::Io(format!("{}: {e}", dir.display())))?;
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if matches!(ext.as_str(), "json" | "yaml" | "yml") {
                paths.push(path);
            }
        }
        // Deterministic load order
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .map_err(|e| SchemaError::Io(format!("{}: {e}", path.display())))?;
            let doc = parse_document(&path, &content)?;
            let root = FieldSchema::from_json_schema(&doc)
                .map_err(|e| SchemaError::Invalid(format!("{}: {e}", path.display())))?;
            tracing::debug!(schema = %name, path = %path.display(), "loaded schema definition");
            self.insert(SchemaDefinition {
                name: name.clone(),
                root,
            });
            loaded.push(name);
        }

        Ok(loaded)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Validate `document` against the schema registered as `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Unknown` if no such schema is registered.
    pub fn validate(&self, document: &Value, name: &str) -> Result<ValidationResult, SchemaError> {
        let def = self
            .get(name)
            .ok_or_else(|| SchemaError::Unknown(name.to_string()))?;
        Ok(validate_document(document, &def.root, self.array_error_cap))
    }
}

/// Parse a schema document from JSON or YAML.
///
/// Extension first (`.yaml`/`.yml`/`.json`), then content sniffing
/// (leading `{` → JSON, otherwise YAML).
fn parse_document(path: &Path, content: &str) -> Result<Value, SchemaError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let as_json = |c: &str| {
        serde_json::from_str(c).map_err(|e| SchemaError::Parse(format!("Invalid JSON: {e}")))
    };
    let as_yaml = |c: &str| {
        serde_yml::from_str(c).map_err(|e| SchemaError::Parse(format!("Invalid YAML: {e}")))
    };

    match ext.as_str() {
        "yaml" | "yml" => as_yaml(content),
        "json" => as_json(content),
        _ if content.trim_start().starts_with('{') => as_json(content),
        _ => as_yaml(content),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Unknown schema: {0}")]
    Unknown(String),
    #[error("Invalid schema: {0}")]
    Invalid(String),
    #[error("Cannot read schema: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
