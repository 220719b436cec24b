//! Tolerant deserializers for model-produced fields
//!
//! Generated JSON drifts between shapes for the same field (a number where a
//! string was asked for, a bare string where a list was asked for). These
//! helpers normalize that drift and drop blank values, so a field that is
//! present always carries content. [`normalize`] handles the structural drift
//! that field deserializers cannot see: sections of the wrong shape and
//! canonical keys repeated under a deprecated alias.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::record::model::Medication;

/// Optional free-text field; blank strings and nulls become `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

/// List of strings; accepts a single string and drops blank entries.
pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().filter_map(value_to_text).collect(),
        Some(other) => value_to_text(other).into_iter().collect(),
    })
}

/// Medication entries; plain strings are treated as bare medication names.
pub fn medications<'de, D>(deserializer: D) -> Result<Vec<Medication>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };

    let mut medications = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(_) => {
                let medication: Medication =
                    serde_json::from_value(item).map_err(serde::de::Error::custom)?;
                if !medication.is_empty() {
                    medications.push(medication);
                }
            }
            other => {
                if let Some(name) = value_to_text(other) {
                    medications.push(Medication::named(name));
                }
            }
        }
    }
    Ok(medications)
}

/// Top-level sections, each expected to be a JSON object
const SECTIONS: [&str; 6] = [
    "informacion_paciente",
    "subjetivo",
    "objetivo",
    "evaluacion",
    "plan",
    "metadata",
];

/// `(section, canonical key, deprecated alias)`
const ALIASES: [(&str, &str, &str); 3] = [
    ("subjetivo", "duracion_sintomas", "duracion"),
    ("evaluacion", "diagnostico", "diagnostico_principal"),
    ("plan", "medicamentos", "medicamentos_prescritos"),
];

/// Keys set only by the extractor; a model never gets to mark its own output.
const RESERVED: [&str; 2] = ["error", "raw_response"];

/// Key holding free-text vital signs that arrived as a single value
const VITALS_NOTE_KEY: &str = "observaciones";

/// Reshape model output so it fits the typed record.
///
/// Sections that are not objects are dropped. Where a canonical key and its
/// alias both appear, the canonical value is kept unless it is blank. Scalar
/// or list `signos_vitales` become a single free-text entry.
pub fn normalize(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        return;
    };

    for key in RESERVED {
        root.remove(key);
    }

    for section in SECTIONS {
        match root.get(section) {
            None | Some(Value::Object(_)) => {}
            Some(Value::Null) => {
                root.remove(section);
            }
            Some(other) => {
                warn!(
                    "Dropping section '{}': expected an object, got {}",
                    section,
                    kind(other)
                );
                root.remove(section);
            }
        }
    }

    for (section, canonical, alias) in ALIASES {
        if let Some(Value::Object(fields)) = root.get_mut(section) {
            resolve_alias(fields, canonical, alias);
        }
    }

    if let Some(Value::Object(objective)) = root.get_mut("objetivo") {
        normalize_vitals(objective);
    }
}

fn resolve_alias(fields: &mut Map<String, Value>, canonical: &str, alias: &str) {
    let Some(aliased) = fields.remove(alias) else {
        return;
    };
    let canonical_blank = fields
        .get(canonical)
        .map_or(true, |v| value_to_text(v.clone()).is_none());
    if canonical_blank {
        fields.insert(canonical.to_string(), aliased);
    }
}

fn normalize_vitals(objective: &mut Map<String, Value>) {
    let Some(vitals) = objective.get("signos_vitales") else {
        return;
    };
    if vitals.is_object() {
        return;
    }

    if let Some(text) = objective.remove("signos_vitales").and_then(value_to_text) {
        let mut entry = Map::new();
        entry.insert(VITALS_NOTE_KEY.to_string(), Value::String(text));
        objective.insert("signos_vitales".to_string(), Value::Object(entry));
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(map) => {
            if map.is_empty() {
                None
            } else {
                Some(Value::Object(map).to_string())
            }
        }
    }
}
