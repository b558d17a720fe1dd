//! Operation configuration payloads.
//!
//! Configuration is an open-ended mapping from string keys to typed
//! values (prompt text, recognition parameters, feature lists),
//! carried as structured JSON values and serialized explicitly for
//! the outbound call. Building the payload as values rather than
//! interpolated text avoids quoting and injection defects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flattened key/value parameters for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationConfig {
    params: BTreeMap<String, serde_json::Value>,
}

impl OperationConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style parameter setter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns a parameter value, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.params.iter()
    }

    /// Serializes the configuration to a JSON object for the
    /// outbound call.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_get() {
        let config = OperationConfig::new()
            .with("prompt", "Summarize the review")
            .with("temperature", 0.2)
            .with("flatten_json_output", true);

        assert_eq!(config.len(), 3);
        assert_eq!(config.get("prompt"), Some(&json!("Summarize the review")));
        assert_eq!(config.get("temperature"), Some(&json!(0.2)));
    }

    #[test]
    fn test_structured_values() {
        let config = OperationConfig::new().with("features", json!(["LABELS", "TEXT"]));
        assert_eq!(config.get("features"), Some(&json!(["LABELS", "TEXT"])));
    }

    #[test]
    fn test_quoting_is_preserved() {
        // Values with quotes and braces survive serialization intact.
        let config = OperationConfig::new().with("prompt", r#"Say "hi" {verbatim}"#);
        let value = config.to_value();
        assert_eq!(value["prompt"], json!(r#"Say "hi" {verbatim}"#));
    }

    #[test]
    fn test_to_value_object() {
        let config = OperationConfig::new().with("a", 1).with("b", "two");
        assert_eq!(config.to_value(), json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = OperationConfig::new().with("k", "v");
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: OperationConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, config);
    }
}
