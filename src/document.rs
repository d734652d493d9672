use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::ir::DocumentKind;
use crate::references::reference_name;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid JSON5: {0}")]
    Json5(#[from] json5::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Json5,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json5") => DocumentFormat::Json5,
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, DocumentError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(text)?),
        DocumentFormat::Json5 => Ok(json5::from_str(text)?),
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
            Ok(yaml_to_json(yaml))
        }
    }
}

pub fn load_document(path: &Path) -> Result<Value, DocumentError> {
    let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&text, DocumentFormat::from_path(path))
}

// OpenAPI response maps are keyed by bare integers in YAML; JSON keys are strings.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tagged = *tagged;
            yaml_to_json(tagged.value)
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

pub fn detect_kind(document: &Value) -> DocumentKind {
    let Some(map) = document.as_object() else {
        return DocumentKind::Unrecognized;
    };
    let versioned = map.contains_key("openapi") || map.contains_key("swagger");
    if versioned && (map.contains_key("info") || map.contains_key("paths")) {
        return DocumentKind::OpenApi;
    }
    DocumentKind::JsonSchema
}

pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub fn object_field<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

pub fn properties(schema: &Value) -> Option<&Map<String, Value>> {
    object_field(schema, "properties")
}

pub fn items(schema: &Value) -> Option<&Value> {
    schema.get("items").filter(|items| items.is_object())
}

pub fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

pub fn enum_values(schema: &Value) -> Vec<String> {
    schema
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Human-readable type of a schema fragment.
pub fn type_label(schema: &Value) -> String {
    if let Some(name) = schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(reference_name)
    {
        return name;
    }
    match schema.get("type") {
        Some(Value::String(kind)) if kind == "array" => {
            return match items(schema) {
                Some(items) => format!("{}[]", type_label(items)),
                None => "array".to_string(),
            };
        }
        Some(Value::String(kind)) => return kind.clone(),
        Some(Value::Array(kinds)) => {
            let names: Vec<&str> = kinds.iter().filter_map(Value::as_str).collect();
            if !names.is_empty() {
                return names.join(" | ");
            }
        }
        _ => {}
    }
    if schema.get("properties").is_some() {
        return "object".to_string();
    }
    if schema.get("items").is_some() {
        return "array".to_string();
    }
    for keyword in ["allOf", "anyOf", "oneOf"] {
        if schema.get(keyword).is_some() {
            return keyword.to_string();
        }
    }
    if schema.get("enum").is_some() {
        return "enum".to_string();
    }
    if schema.get("const").is_some() {
        return "const".to_string();
    }
    "any".to_string()
}

/// Whether a schema fragment has children the compiler can materialize.
pub fn has_schema_children(schema: &Value) -> bool {
    properties(schema).is_some_and(|props| !props.is_empty()) || items(schema).is_some()
}
