use super::PROVIDER_PREFIX;

/// 解析代理侧模型名，识别 `deepseek/` 前缀并得到上游模型名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedModel<'a> {
    pub prefixed: bool,
    pub model_name: &'a str,
}

impl<'a> ParsedModel<'a> {
    /// 示例：
    /// - "deepseek/deepseek-chat" -> ParsedModel { prefixed: true, model_name: "deepseek-chat" }
    /// - "deepseek-chat" -> ParsedModel { prefixed: false, model_name: "deepseek-chat" }
    /// - "openai/gpt-4o" -> ParsedModel { prefixed: false, model_name: "openai/gpt-4o" }
    pub fn parse(model: &'a str) -> Self {
        match model
            .strip_prefix(PROVIDER_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(model_name) => Self {
                prefixed: true,
                model_name,
            },
            None => Self {
                prefixed: false,
                model_name: model,
            },
        }
    }

    /// 获取实际应该传递给上游 API 的模型名称
    pub fn get_upstream_model_name(&self) -> &'a str {
        self.model_name
    }
}
