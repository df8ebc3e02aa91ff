//! Reading and writing record sets and translation catalogs as JSON.

use std::fs;
use std::path::Path;

use log::debug;
use provql_engine::{TranslationTable, Value};
use serde_json::Value as JsonValue;

use crate::error::ProvqlError;

/// Parses a JSON array of records. A single object is read as a one-record
/// set.
pub fn parse_records(json: &str) -> Result<Vec<Value>, ProvqlError> {
    let document: JsonValue = serde_json::from_str(json)?;
    let items = match &document {
        JsonValue::Array(items) => items.as_slice(),
        JsonValue::Object(_) => std::slice::from_ref(&document),
        other => {
            return Err(ProvqlError::InvalidInput(format!(
                "expected an array of records, found {}",
                json_type(other)
            )));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            JsonValue::Object(_) => Ok(Value::from_json(item)),
            other => Err(ProvqlError::InvalidInput(format!(
                "element {} is {}, not a record",
                index,
                json_type(other)
            ))),
        })
        .collect()
}

pub fn load_records(path: &Path) -> Result<Vec<Value>, ProvqlError> {
    let records = parse_records(&fs::read_to_string(path)?)?;
    debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn render_records(records: &[Value]) -> JsonValue {
    JsonValue::Array(records.iter().map(Value::to_json).collect())
}

/// Parses `{ "<locale>": { "<key>": "<text>" } }`.
pub fn parse_translations(json: &str) -> Result<TranslationTable, ProvqlError> {
    let document: JsonValue = serde_json::from_str(json)?;
    let locales = document
        .as_object()
        .ok_or_else(|| ProvqlError::InvalidInput("translations must be a JSON object".into()))?;

    let mut table = TranslationTable::new();
    for (locale, entries) in locales {
        let entries = entries.as_object().ok_or_else(|| {
            ProvqlError::InvalidInput(format!("translations for '{}' must be an object", locale))
        })?;
        for (key, text) in entries {
            let text = text.as_str().ok_or_else(|| {
                ProvqlError::InvalidInput(format!("translation '{}.{}' is not a string", locale, key))
            })?;
            table.insert(locale.as_str(), key.as_str(), text);
        }
    }
    Ok(table)
}

pub fn load_translations(path: &Path) -> Result<TranslationTable, ProvqlError> {
    parse_translations(&fs::read_to_string(path)?)
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
