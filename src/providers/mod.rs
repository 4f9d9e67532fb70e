pub mod deepseek;

use serde_json::{Map, Value};

/// Rewrites chat payloads between the OpenAI-shaped caller surface and the upstream.
pub trait RequestTranslator: Send + Sync {
    fn to_upstream(&self, request: Map<String, Value>) -> Map<String, Value>;
    fn to_caller(&self, response: Value) -> Value;
}

pub use deepseek::DeepSeekTranslator;
