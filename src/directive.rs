//! Extracts the model's intent from a free-text ReAct reply.
//!
//! The markers are matched literally and case-sensitively. A `Final Answer:` anywhere in the
//! reply wins over any `Action:` in the same reply. Only the first occurrence of each marker is
//! considered.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FINAL_ANSWER: Regex = Regex::new(r"Final Answer:\s*(.*)").unwrap();
    static ref ACTION: Regex = Regex::new(r"Action:[ \t]*([^\r\n]*)").unwrap();
    static ref ACTION_INPUT: Regex = Regex::new(r"Action Input:[ \t]*([^\r\n]*)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    FinalAnswer(String),
    ToolCall { action: String, input: String },
    None,
}

pub fn parse_directive(text: &str) -> Directive {
    if let Some(captures) = FINAL_ANSWER.captures(text) {
        return Directive::FinalAnswer(captures[1].trim().to_string());
    }

    let action = first_capture(&ACTION, text);
    let input = first_capture(&ACTION_INPUT, text);
    match (action, input) {
        (Some(action), Some(input)) if !action.is_empty() && !input.is_empty() => {
            Directive::ToolCall {
                action: action.to_string(),
                input: input.to_string(),
            }
        }
        _ => Directive::None,
    }
}

fn first_capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
}
