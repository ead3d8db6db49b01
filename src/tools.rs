use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AgentResult;
use crate::models::tool::ToolSpec;

pub mod registry;
pub mod weather;

pub use registry::ToolRegistry;
pub use weather::WeatherTool;

/// A capability the agent can invoke on behalf of the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and input schema shown to the model
    fn spec(&self) -> &ToolSpec;

    /// Run the tool with input that has already been checked against the schema.
    ///
    /// The returned text is placed verbatim after `Observation: ` in the next user turn.
    async fn call(&self, input: Value) -> AgentResult<String>;

    fn name(&self) -> &str {
        &self.spec().name
    }
}
