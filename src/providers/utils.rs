use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::models::message::{Message, Role, ToolInvocation};
use crate::models::tool::ToolSpec;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });

            if let Some(tool) = &message.tool {
                match message.role {
                    Role::Assistant => {
                        if let Some(payload) = &tool.payload {
                            converted["tool_calls"] = payload.clone();
                        }
                    }
                    Role::Tool => {
                        if let Some(call_id) = &tool.call_id {
                            converted["tool_call_id"] = json!(call_id);
                        }
                        if let Some(name) = &tool.name {
                            converted["name"] = json!(name);
                        }
                    }
                    Role::System | Role::User => {}
                }
            }

            converted
        })
        .collect()
}

/// Convert internal ToolSpec format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[ToolSpec]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to internal Message format
///
/// Any `tool_calls` are kept as the raw payload, with the first call's name and id lifted out.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No choices in response: {}", response))?;

    let content = original
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut message = Message::assistant(content);

    if let Some(tool_calls) = original.get("tool_calls").filter(|v| !v.is_null()) {
        let first = tool_calls.get(0);
        message = message.with_tool_invocation(ToolInvocation {
            name: first
                .and_then(|call| call["function"]["name"].as_str())
                .map(String::from),
            call_id: first
                .and_then(|call| call["id"].as_str())
                .map(String::from),
            payload: Some(tool_calls.clone()),
        });
    }

    Ok(message)
}
