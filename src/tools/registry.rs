use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::Tool;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::ToolSpec;

/// Tools known to the agent, in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> AgentResult<()> {
        self.register_boxed(Box::new(tool))
    }

    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) -> AgentResult<()> {
        let name = tool.name().to_string();
        if !tool.spec().has_valid_name() {
            return Err(AgentError::InvalidToolName(name));
        }
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }

        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> AgentResult<&dyn Tool> {
        self.index
            .get(name)
            .map(|&i| &*self.tools[i])
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Parse `raw_input` as JSON, check it against the tool's schema and call the tool
    pub async fn invoke(&self, name: &str, raw_input: &str) -> AgentResult<String> {
        let tool = self.get(name)?;

        let input: Value = serde_json::from_str(raw_input)
            .map_err(|e| AgentError::invalid_input(name, e))?;
        tool.spec()
            .validate_input(&input)
            .map_err(|reason| AgentError::invalid_input(name, reason))?;

        debug!(tool = name, input = %input, "invoking tool");
        tool.call(input).await
    }

    /// Like [`ToolRegistry::invoke`], but failures come back as text the model can read
    pub async fn dispatch(&self, name: &str, raw_input: &str) -> String {
        match self.invoke(name, raw_input).await {
            Ok(result) => result,
            Err(err) => {
                warn!(tool = name, error = %err, "tool invocation failed");
                self.describe_failure(&err)
            }
        }
    }

    /// Render a tool failure as observation text
    pub fn describe_failure(&self, err: &AgentError) -> String {
        match err {
            AgentError::UnknownTool(_) => {
                format!("{}. Available tools: [{}]", err, self.names().join(", "))
            }
            _ => err.to_string(),
        }
    }
}
