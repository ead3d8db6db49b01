use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::base::{Provider, Usage};
use super::configs::{OpenAiProviderConfig, ProviderConfig};
use super::utils::{messages_to_openai_spec, openai_response_to_message, tools_to_openai_spec};
use crate::models::message::Message;
use crate::models::tool::ToolSpec;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiProviderConfig::from_env()?)
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok());

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok());

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => input.checked_add(output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(anyhow!("Authentication failed: {}", response.status()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("Request failed: {}\n{}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<(Message, Usage)> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });

        // Add optional parameters
        if !tools.is_empty() {
            let tools_spec = tools_to_openai_spec(tools)?;
            payload["tools"] = json!(tools_spec);
            payload["tool_choice"] = json!("auto");
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        debug!(model = %self.config.model, messages = messages.len(), "requesting completion");
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let message = openai_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(status: u16, response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(status).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let config = OpenAiProviderConfig::new(
            format!("{}/v1", mock_server.uri()),
            "test_api_key",
            "qwen-plus",
        );
        let provider = OpenAiProvider::new(config).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Action: weather\nAction Input: {\"location\":\"Paris\"}",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, provider) = setup_mock_server(200, response_body).await;
        assert_eq!(provider.model(), "qwen-plus");

        let messages = vec![Message::system("sys"), Message::user("Weather in Paris?")];
        let (message, usage) = provider.complete(&messages, &[]).await?;

        assert_eq!(
            message.content,
            "Action: weather\nAction Input: {\"location\":\"Paris\"}"
        );
        assert!(message.tool.is_none());
        assert_eq!(usage, Usage::new(Some(12), Some(15), Some(27)));

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_sends_model_messages_and_tools() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "messages": [{"role": "system", "content": "sys"}],
                "tools": [{"type": "function", "function": {"name": "weather"}}],
                "tool_choice": "auto",
                "temperature": 0.5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = OpenAiProviderConfig::new(mock_server.uri(), "test_api_key", "gpt-4o");
        config.temperature = Some(0.5);
        let provider = OpenAiProvider::new(config)?;

        let tool = ToolSpec::new("weather", "Get the weather", json!({"type": "object"}));
        let (message, usage) = provider
            .complete(&[Message::system("sys")], &[tool])
            .await?;

        assert_eq!(message.content, "ok");
        assert_eq!(usage, Usage::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_tool_request_metadata() -> Result<()> {
        let response_body = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "weather",
                            "arguments": "{\"location\":\"San Francisco, CA\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 15}
        });

        let (_server, provider) = setup_mock_server(200, response_body).await;
        let (message, usage) = provider
            .complete(&[Message::user("What's the weather in San Francisco?")], &[])
            .await?;

        let tool = message.tool.expect("tool metadata");
        assert_eq!(tool.name.as_deref(), Some("weather"));
        assert_eq!(tool.call_id.as_deref(), Some("call_123"));
        assert_eq!(usage.total_tokens, Some(35));

        Ok(())
    }

    #[test]
    fn test_usage_out_of_range_counts_are_dropped() {
        let usage = OpenAiProvider::get_usage(&json!({
            "usage": {
                "prompt_tokens": 5_000_000_000_i64,
                "completion_tokens": 15,
                "total_tokens": 5_000_000_015_i64
            }
        }));
        assert_eq!(usage, Usage::new(None, Some(15), None));

        let usage = OpenAiProvider::get_usage(&json!({
            "usage": {"prompt_tokens": i64::from(i32::MAX), "completion_tokens": 1}
        }));
        assert_eq!(usage.input_tokens, Some(i32::MAX));
        assert_eq!(usage.total_tokens, None);
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let (_server, provider) = setup_mock_server(500, json!({})).await;
        let err = provider
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Server error: 500"));
    }

    #[tokio::test]
    async fn test_complete_api_error_body() {
        let (_server, provider) =
            setup_mock_server(200, json!({"error": {"message": "model not found"}})).await;
        let err = provider
            .complete(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("OpenAI API error"));
    }
}
