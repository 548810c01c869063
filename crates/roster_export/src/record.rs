use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One voter row as returned by the backend.
///
/// Field order is the order the backend sent them in; wildcard exports rely
/// on it for column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(key, value)` pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text for the cell at `key`. Missing keys and nulls are empty.
    pub fn display_value(&self, key: &str) -> String {
        self.get(key).map(render_value).unwrap_or_default()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "Yes".into(),
        Value::Bool(false) => "No".into(),
        Value::Number(n) => n.to_string(),
        // Nested values are rare (e.g. vote history arrays); keep them readable.
        other => other.to_string(),
    }
}

/// Parse backend JSON into records. Accepts an array of objects or a single
/// object.
pub fn records_from_json(input: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(input).context("Failed to parse voter records JSON")?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(fields) => Ok(Record { fields }),
                other => bail!("Voter record {i} is not an object: {other}"),
            })
            .collect(),
        Value::Object(fields) => Ok(vec![Record { fields }]),
        other => bail!("Expected an array of voter records, got: {other}"),
    }
}
