//! The ReAct prompt: the system prompt, and the opening user turn that teaches the model the
//! Thought / Action / Action Input / Observation format and lists the tools it may call.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::ToolSpec;
use crate::prompt_template::load_prompt;

pub const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");
const REACT_TEMPLATE: &str = include_str!("prompts/react.md");

lazy_static! {
    static ref PERMITTED_ACTIONS: Regex =
        Regex::new(r"Action: the action to take, should be one of \[([^\]\r\n]*)\]").unwrap();
}

#[derive(Serialize)]
struct CatalogueEntry<'a> {
    name: &'a str,
    description: &'a str,
    parameters: String,
}

#[derive(Serialize)]
struct ReactContext<'a> {
    tools: Vec<CatalogueEntry<'a>>,
    tool_names: Vec<&'a str>,
    task: &'a str,
}

/// Render the opening user turn for `task` with the given tool catalogue
pub fn render_react_prompt(tools: &[ToolSpec], task: &str) -> AgentResult<String> {
    let entries = tools
        .iter()
        .map(|tool| {
            Ok(CatalogueEntry {
                name: &tool.name,
                description: &tool.description,
                parameters: serde_json::to_string_pretty(&tool.parameters)
                    .map_err(|e| AgentError::Internal(e.to_string()))?,
            })
        })
        .collect::<AgentResult<Vec<_>>>()?;

    let context = ReactContext {
        tools: entries,
        tool_names: tools.iter().map(|tool| tool.name.as_str()).collect(),
        task,
    };
    load_prompt(REACT_TEMPLATE, &context).map_err(|e| AgentError::Internal(e.to_string()))
}

/// Recover the permitted action names from a rendered prompt, in order
pub fn parse_permitted_actions(prompt: &str) -> Vec<String> {
    PERMITTED_ACTIONS
        .captures(prompt)
        .map(|captures| {
            captures[1]
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
