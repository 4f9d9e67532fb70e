pub mod client;
pub mod model_parser;
pub mod translate;
pub mod types;

pub use client::DeepSeekClient;
pub use translate::DeepSeekTranslator;
pub use types::Model;

/// Prefix joining proxy-facing model ids to upstream names, as in `deepseek/deepseek-chat`.
pub const PROVIDER_PREFIX: &str = "deepseek";

/// Upstream model used when a chat request names none.
pub const DEFAULT_UPSTREAM_MODEL: &str = "deepseek-chat";
