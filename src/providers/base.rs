use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::ToolSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Base trait for completion clients
#[async_trait]
pub trait Provider: Send + Sync {
    /// The model identifier requests are sent to
    fn model(&self) -> &str;

    /// Generate the next assistant message for the ordered `messages`.
    ///
    /// `tools` is an optional catalogue advertised to the model; an empty slice sends none.
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<(Message, Usage)>;
}
