use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the agent and its tools.
///
/// Everything except `ModelCallFailure` under the abort policy is recoverable: the loop renders
/// the error with `Display` and feeds it back to the model as an observation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool name '{0}', it must match [a-zA-Z0-9_-]+")]
    InvalidToolName(String),

    #[error("Error parsing {tool} parameters: {reason}")]
    InvalidToolInput { tool: String, reason: String },

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailure(String),

    #[error("Model call failed: {0}")]
    ModelCallFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    pub fn invalid_input<T: Into<String>, R: ToString>(tool: T, reason: R) -> Self {
        AgentError::InvalidToolInput {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
