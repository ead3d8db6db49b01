use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::objectid::create_object_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool-invocation metadata attached to a message.
///
/// Assistant replies keep whatever function-call payload the completion API returned so it can be
/// sent back untouched; tool-role messages use `name` and `call_id` to point at the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ToolInvocation {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.call_id.is_none() && self.payload.is_none()
    }

    /// Every `(call_id, name)` pair this invocation opens, in payload order
    pub fn calls(&self) -> Vec<(String, String)> {
        let from_payload: Vec<(String, String)> = self
            .payload
            .as_ref()
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|call| {
                        let id = call["id"].as_str()?;
                        let name = call["function"]["name"].as_str().unwrap_or_default();
                        Some((id.to_string(), name.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if !from_payload.is_empty() {
            return from_payload;
        }
        match &self.call_id {
            Some(id) => vec![(id.clone(), self.name.clone().unwrap_or_default())],
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub id: String,
    pub role: Role,
    pub created: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInvocation>,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            id: create_object_id("msg"),
            role,
            created: Utc::now().timestamp(),
            content: content.into(),
            tool: None,
        }
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// A tool-role message answering the call identified by `call_id`
    pub fn tool<S, N, I>(content: S, name: N, call_id: I) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        I: Into<String>,
    {
        Self::new(Role::Tool, content).with_tool_invocation(ToolInvocation {
            name: Some(name.into()),
            call_id: Some(call_id.into()),
            payload: None,
        })
    }

    /// Attach tool-invocation metadata; empty metadata is dropped
    pub fn with_tool_invocation(mut self, invocation: ToolInvocation) -> Self {
        self.tool = if invocation.is_empty() {
            None
        } else {
            Some(invocation)
        };
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "message:{} ({} chars){}",
            self.role,
            self.content.len(),
            match &self.tool {
                Some(ToolInvocation {
                    name: Some(name), ..
                }) => format!(" tool={}", name),
                _ => String::new(),
            }
        )
    }
}
