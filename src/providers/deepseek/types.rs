use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PROVIDER_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelListResponse {
    #[serde(default = "list_object")]
    pub object: String,
    pub data: Vec<Model>,
}

fn list_object() -> String {
    "list".to_string()
}

// 上游只保证 id；其余字段（含 null、任意类型）原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Model {
    pub fn new(id: impl Into<String>, created: i64, owned_by: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("object".to_string(), Value::from("model"));
        fields.insert("created".to_string(), Value::from(created));
        fields.insert("owned_by".to_string(), Value::from(owned_by.into()));
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Proxy-facing form: `deepseek/<upstream id>`, every other field untouched.
    pub fn with_provider_prefix(self) -> Self {
        Self {
            id: format!("{}/{}", PROVIDER_PREFIX, self.id),
            ..self
        }
    }
}

/// Served when no credential is available or the upstream cannot be reached.
pub fn default_models() -> Vec<Model> {
    vec![
        Model::new("deepseek/deepseek-chat", 1_640_995_200, "deepseek"),
        Model::new("deepseek/deepseek-coder", 1_640_995_200, "deepseek"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefixing_preserves_other_fields() {
        let raw: Model = serde_json::from_value(json!({
            "id": "deepseek-reasoner",
            "object": "model",
            "owned_by": "deepseek",
            "context_window": 65536
        }))
        .unwrap();

        let prefixed = raw.with_provider_prefix();
        let out = serde_json::to_value(&prefixed).unwrap();
        assert_eq!(
            out,
            json!({
                "id": "deepseek/deepseek-reasoner",
                "object": "model",
                "owned_by": "deepseek",
                "context_window": 65536
            })
        );
    }

    #[test]
    fn defaults_use_prefixed_ids() {
        let models = default_models();
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m.id.starts_with("deepseek/")));
        assert_eq!(
            serde_json::to_value(&models[0]).unwrap(),
            json!({
                "id": "deepseek/deepseek-chat",
                "object": "model",
                "created": 1_640_995_200,
                "owned_by": "deepseek"
            })
        );
    }

    #[test]
    fn null_and_non_integer_fields_survive_prefixing() {
        let raw: Model = serde_json::from_value(json!({
            "id": "x",
            "object": "model",
            "owned_by": null,
            "created": 1700000000.5
        }))
        .unwrap();

        let out = serde_json::to_value(raw.with_provider_prefix()).unwrap();
        assert_eq!(
            out,
            json!({
                "id": "deepseek/x",
                "object": "model",
                "owned_by": null,
                "created": 1700000000.5
            })
        );
    }

    #[test]
    fn catalog_with_odd_entry_still_parses() {
        let list: ModelListResponse = serde_json::from_value(json!({
            "data": [
                {"id": "a", "created": "yesterday"},
                {"id": "b", "created": 1.5, "permission": []}
            ]
        }))
        .unwrap();
        assert_eq!(list.object, "list");
        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[1].fields["permission"], json!([]));
    }
}
