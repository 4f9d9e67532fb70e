use serde_json::{Map, Value};

use super::DEFAULT_UPSTREAM_MODEL;
use super::model_parser::ParsedModel;
use crate::providers::RequestTranslator;

/// DeepSeek speaks the OpenAI chat schema, so only the `model` field needs rewriting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSeekTranslator;

impl RequestTranslator for DeepSeekTranslator {
    fn to_upstream(&self, mut request: Map<String, Value>) -> Map<String, Value> {
        match request.get_mut("model") {
            Some(Value::String(model)) => {
                let parsed = ParsedModel::parse(model);
                if parsed.prefixed {
                    *model = parsed.get_upstream_model_name().to_string();
                }
            }
            Some(_) => {}
            None => {
                request.insert(
                    "model".to_string(),
                    Value::String(DEFAULT_UPSTREAM_MODEL.to_string()),
                );
            }
        }

        let model = request
            .get("model")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        tracing::debug!(
            model,
            fields = request.len(),
            "Converted request for upstream"
        );
        request
    }

    fn to_caller(&self, response: Value) -> Value {
        response
    }
}
