use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::Tool;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::ToolSpec;

pub const WEATHER_TOOL_NAME: &str = "weather";
pub const WTTR_HOST: &str = "https://wttr.in";

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub location: String,
}

/// Current conditions for a location, from a wttr.in compatible service
pub struct WeatherTool {
    client: Client,
    base_url: Url,
    spec: ToolSpec,
}

impl WeatherTool {
    pub fn new() -> AgentResult<Self> {
        Self::with_base_url(WTTR_HOST)
    }

    pub fn with_base_url(base_url: &str) -> AgentResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AgentError::Internal(format!("invalid weather url '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            spec: ToolSpec::new(
                WEATHER_TOOL_NAME,
                "Get the current weather conditions and temperature for a location",
                json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "description": "The city to look up, e.g. Shenzhen"
                        }
                    },
                    "required": ["location"]
                }),
            ),
        })
    }

    fn location_url(&self, location: &str) -> AgentResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AgentError::Internal(format!("weather url '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .push(location);
        Ok(url)
    }

    async fn lookup(&self, params: &WeatherParams) -> AgentResult<String> {
        let url = self.location_url(params.location.trim())?;
        let response = self
            .client
            .get(url)
            .query(&[("format", "%C %t")])
            .send()
            .await
            .map_err(|e| AgentError::ToolExecutionFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::ToolExecutionFailure(format!(
                "weather service returned {} for '{}'",
                status, params.location
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::ToolExecutionFailure(e.to_string()))?;
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, input: Value) -> AgentResult<String> {
        let params: WeatherParams =
            serde_json::from_value(input).map_err(|e| AgentError::invalid_input(WEATHER_TOOL_NAME, e))?;
        if params.location.trim().is_empty() {
            return Err(AgentError::invalid_input(WEATHER_TOOL_NAME, "location is empty"));
        }
        self.lookup(&params).await
    }
}
