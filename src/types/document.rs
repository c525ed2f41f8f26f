use serde::Serialize;
use serde_json::json;

/// The generated `scripted_metric` aggregation body.
///
/// Serializes to the four script phases; the metric key pair is carried
/// alongside for callers that read the reduce output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptDocument {
    pub init_script: String,
    pub map_script: String,
    pub combine_script: String,
    pub reduce_script: String,
    #[serde(skip)]
    pub numerator_key: String,
    #[serde(skip)]
    pub denominator_key: String,
}

impl ScriptDocument {
    /// The aggregation definition: `{"scripted_metric": {...}}`.
    #[must_use]
    pub fn to_aggregation(&self) -> serde_json::Value {
        json!({ "scripted_metric": self })
    }

    /// A complete search request body running only this aggregation under
    /// `name`. Hits are suppressed with `"size": 0`.
    #[must_use]
    pub fn to_search_body(&self, name: &str, query: Option<serde_json::Value>) -> serde_json::Value {
        let mut aggs = serde_json::Map::new();
        aggs.insert(name.to_owned(), self.to_aggregation());

        let mut body = serde_json::Map::new();
        body.insert("size".to_owned(), json!(0));
        body.insert("aggs".to_owned(), serde_json::Value::Object(aggs));
        if let Some(query) = query {
            body.insert("query".to_owned(), query);
        }
        serde_json::Value::Object(body)
    }

    /// Pretty-printed aggregation definition.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_aggregation())
    }
}
