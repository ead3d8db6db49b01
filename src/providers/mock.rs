use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::models::message::Message;
use crate::models::tool::ToolSpec;
use crate::providers::base::{Provider, Usage};

/// One scripted reaction of the mock provider
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Message(Message),
    Fail(String),
    Hang,
}

/// A mock provider that replays pre-configured replies for testing.
///
/// Clones share the script and the call log, so a test can keep a handle after boxing one.
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of text replies
    pub fn new<S: Into<String>>(replies: Vec<S>) -> Self {
        Self::scripted(replies.into_iter().map(|r| MockReply::Text(r.into())).collect())
    }

    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The message lists received, one entry per call
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[Message], _tools: &[ToolSpec]) -> Result<(Message, Usage)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            // Return empty response if no more pre-configured responses
            None => Ok((Message::assistant(""), Usage::default())),
            Some(MockReply::Text(text)) => Ok((Message::assistant(text), Usage::default())),
            Some(MockReply::Message(message)) => Ok((message, Usage::default())),
            Some(MockReply::Fail(reason)) => Err(anyhow!(reason)),
            Some(MockReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok((Message::assistant(""), Usage::default()))
            }
        }
    }
}
