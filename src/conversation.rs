//! The prompt history of one agent session.
//!
//! The conversation is an append-only log: messages are never edited, removed or reordered, and
//! the system prompt always sits at index zero. The only way to shrink it is [`Conversation::reset`],
//! which drops every turn and seeds the system prompt again.

use crate::models::message::{Message, ToolInvocation};

/// Returned by [`Conversation::last_content`] when there is nothing to return.
pub const NO_MESSAGES: &str = "No messages in the chat history";

#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation seeded with `system_prompt`
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        let mut conversation = Conversation {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
        };
        conversation.reset();
        conversation
    }

    /// Drop every message and seed the system prompt again
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::system(self.system_prompt.clone()));
    }

    pub fn append_system<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::system(content));
    }

    pub fn append_user<S: Into<String>>(&mut self, content: S) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant turn, keeping any tool-invocation metadata exactly as received
    pub fn append_assistant<S: Into<String>>(&mut self, content: S, tool: Option<ToolInvocation>) {
        let mut message = Message::assistant(content);
        message.tool = tool;
        self.messages.push(message);
    }

    pub fn append_tool<S, N, I>(&mut self, content: S, name: N, call_id: I)
    where
        S: Into<String>,
        N: Into<String>,
        I: Into<String>,
    {
        self.messages.push(Message::tool(content, name, call_id));
    }

    /// An owned copy of the history, safe to hand to a completion client
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_content(&self) -> &str {
        self.messages
            .last()
            .map(|message| message.content.as_str())
            .unwrap_or(NO_MESSAGES)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Role;
    use serde_json::json;

    #[test]
    fn test_new_seeds_system_prompt() {
        let conversation = Conversation::new("be helpful");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.last_content(), "be helpful");
    }

    #[test]
    fn test_appends_preserve_order_and_roles() {
        let mut conversation = Conversation::new("sys");
        conversation.append_user("question");
        conversation.append_assistant("thinking", None);
        conversation.append_tool("22C", "weather", "call_1");
        conversation.append_system("reminder");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::System
            ]
        );
        assert_eq!(conversation.len(), 5);
        assert_eq!(conversation.last_content(), "reminder");
    }

    #[test]
    fn test_reset_after_any_appends() {
        let mut conversation = Conversation::new("sys");
        for round in 0..3 {
            for i in 0..round {
                conversation.append_user(format!("turn {}", i));
            }
            assert_eq!(conversation.snapshot().len(), 1 + round);

            conversation.reset();
            let snapshot = conversation.snapshot();
            assert_eq!(snapshot.len(), 1);
            assert_eq!(snapshot[0].role, Role::System);
            assert_eq!(snapshot[0].content, "sys");
        }
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut conversation = Conversation::new("sys");
        conversation.append_user("hello");

        let mut snapshot = conversation.snapshot();
        snapshot[1].content = "tampered".to_string();
        snapshot.clear();

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last_content(), "hello");
    }

    #[test]
    fn test_assistant_metadata_is_kept_verbatim() {
        let payload = json!([{"id": "call_9", "type": "function"}]);
        let invocation = ToolInvocation {
            name: Some("weather".to_string()),
            call_id: Some("call_9".to_string()),
            payload: Some(payload.clone()),
        };

        let mut conversation = Conversation::new("sys");
        conversation.append_assistant("", Some(invocation.clone()));

        assert_eq!(conversation.messages()[1].tool, Some(invocation));
    }

    #[test]
    fn test_last_content_sentinel() {
        let conversation = Conversation {
            system_prompt: String::new(),
            messages: Vec::new(),
        };
        assert!(conversation.is_empty());
        assert_eq!(conversation.last_content(), NO_MESSAGES);
    }
}
