//! Known key sets and the structured report they describe.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ReportError;

/// The fixed set of top-level keys a report is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSchema {
    keys: Vec<String>,
}

impl ReportSchema {
    /// Creates a schema from its keys. Duplicates are dropped, order is kept.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        Self { keys: unique }
    }

    /// The known keys, in declaration order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns `true` if `key` belongs to the schema.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Inserts an empty array for every absent key and returns the keys it inserted.
    ///
    /// Keys outside the schema are left untouched.
    pub fn fill_defaults(&self, fields: &mut Map<String, Value>) -> Vec<String> {
        let mut inserted = Vec::new();
        for key in &self.keys {
            if !fields.contains_key(key) {
                fields.insert(key.clone(), Value::Array(Vec::new()));
                inserted.push(key.clone());
            }
        }
        inserted
    }

    /// JSON Schema document for the key set: an object whose known keys are arrays.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .keys
            .iter()
            .map(|key| (key.clone(), json!({ "type": "array" })))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.keys,
        })
    }

    /// Collects every violation of [`Self::json_schema`] with its instance path.
    #[must_use]
    pub fn validate(&self, instance: &Value) -> Vec<String> {
        let schema = self.json_schema();
        match jsonschema::Validator::new(&schema) {
            Ok(validator) => validator
                .iter_errors(instance)
                .map(|error| format!("At path '{}': {}", error.instance_path, error))
                .collect(),
            Err(e) => vec![format!("Schema compilation error: {e}")],
        }
    }
}

/// A JSON object recovered from a model answer, with every known key present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredReport {
    fields: Map<String, Value>,
}

impl StructuredReport {
    /// Wraps `fields`, inserting an empty array for each missing schema key.
    #[must_use]
    pub fn from_fields(mut fields: Map<String, Value>, schema: &ReportSchema) -> Self {
        schema.fill_defaults(&mut fields);
        Self { fields }
    }

    /// Looks up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The array stored under `key`, or an empty slice when absent or not an array.
    #[must_use]
    pub fn items(&self, key: &str) -> &[Value] {
        self.fields
            .get(key)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// All top-level fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) const fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Converts the report into a plain JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Deserializes the report into a caller-defined type.
    pub fn deserialize_into<T>(&self) -> Result<T, ReportError>
    where
        T: DeserializeOwned,
    {
        let value = Value::Object(self.fields.clone());
        serde_json::from_value(value).map_err(|e| ReportError::Parse {
            message: format!("Deserialization to target type failed: {e}"),
            raw_text: serde_json::to_string(&self.fields).unwrap_or_default(),
            history: Vec::new(),
        })
    }
}
