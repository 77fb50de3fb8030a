//! 语言模型调用
//!
//! [`ChatModel`] 是管道与外部模型之间唯一的接缝：请求体进，首个
//! choice 的文本出。[`OpenAiClient`] 是兼容 OpenAI chat-completions
//! 协议的 HTTPS 实现。

use std::future::Future;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::translation::config::TranslationConfig;
use crate::translation::error::{TranslationError, TranslationResult};

// ============================================================================
// 请求/响应类型
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// chat-completions 请求体，未设置的采样参数不序列化
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

impl ChatRequest {
    /// 用配置中的模型与采样参数构造 `[system, user]` 请求
    pub fn new(config: &TranslationConfig, system: String, user: String) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
            presence_penalty: config.presence_penalty,
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    pub fn user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// 首个 choice 的文本
    pub fn into_content(self) -> TranslationResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::ParseError("响应中没有 choices".to_string()))
    }
}

// ============================================================================
// 模型接口
// ============================================================================

/// 语言模型
pub trait ChatModel: Send + Sync {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = TranslationResult<String>> + Send;
}

impl<M: ChatModel> ChatModel for std::sync::Arc<M> {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = TranslationResult<String>> + Send {
        (**self).complete(request)
    }
}

// ============================================================================
// OpenAI 兼容客户端
// ============================================================================

/// OpenAI 兼容的 HTTPS 客户端
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
}

impl OpenAiClient {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| TranslationError::ConfigError(format!("API key 含非法字符: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            tracing::warn!("未设置 API key，请求将不带认证头");
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> TranslationResult<String> {
        let response = self.http.post(&self.api_url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::HttpStatus {
                status: status.as_u16(),
                body: if body.is_empty() {
                    status.canonical_reason().unwrap_or_default().to_string()
                } else {
                    body
                },
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_unset_params() {
        let config = TranslationConfig::with_langs("en", &["fr"]);
        let request = ChatRequest::new(&config, "sys".into(), "user".into());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], config.model.as_str());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "user");
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_includes_set_params() {
        let config = TranslationConfig {
            temperature: Some(0.2),
            max_tokens: Some(2048),
            ..TranslationConfig::with_langs("en", &["fr"])
        };
        let request = ChatRequest::new(&config, "sys".into(), "user".into());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["max_tokens"], 2048);
        assert!(json.get("temperature").is_some());
        assert_eq!(request.system_prompt(), Some("sys"));
        assert_eq!(request.user_content(), Some("user"));
    }

    #[test]
    fn test_response_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour"}},{"message":{"content":"x"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content().unwrap(), "Bonjour");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            empty.into_content(),
            Err(TranslationError::ParseError(_))
        ));
    }

    #[test]
    fn test_client_builds_without_key() {
        let config = TranslationConfig::with_langs("en", &["fr"]);
        let client = OpenAiClient::new(&config).unwrap();
        assert_eq!(client.api_url(), config.api_url);
    }
}
