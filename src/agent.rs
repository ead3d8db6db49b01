//! The reasoning + acting loop.
//!
//! Each iteration sends the whole conversation to the provider, reads one directive out of the
//! reply and either finishes, runs a tool and appends its observation, or moves on. Iterations
//! run strictly one after another; a new model call never starts while another is outstanding.

use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::conversation::Conversation;
use crate::directive::{parse_directive, Directive};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{Message, ToolInvocation};
use crate::prompt::{render_react_prompt, SYSTEM_PROMPT};
use crate::providers::base::Provider;
use crate::tools::ToolRegistry;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Answer for a native tool call the text protocol did not run
const NOT_EXECUTED: &str =
    "Not executed. Tools only run through the `Action:` and `Action Input:` lines.";

/// What to do when the completion call fails or times out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelFailurePolicy {
    /// Log the failure and treat it as an empty reply
    #[default]
    Degrade,
    /// Stop the loop and return the failure
    Abort,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
    pub model_failure: ModelFailurePolicy,
    /// Append replies that carry no directive to the conversation instead of dropping them
    pub retain_unparsed_replies: bool,
    pub model_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    /// Also send the tool catalogue to the provider in its native tool format
    pub advertise_tools: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_failure: ModelFailurePolicy::default(),
            retain_unparsed_replies: false,
            model_timeout: Some(DEFAULT_MODEL_TIMEOUT),
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            advertise_tools: false,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    FinalAnswer { answer: String, iterations: usize },
    /// The iteration budget ran out before the model gave a final answer
    Exhausted { iterations: usize },
    Cancelled { iterations: usize },
}

impl AgentOutcome {
    pub fn final_answer(&self) -> Option<&str> {
        match self {
            AgentOutcome::FinalAnswer { answer, .. } => Some(answer),
            _ => None,
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            AgentOutcome::FinalAnswer { iterations, .. }
            | AgentOutcome::Exhausted { iterations }
            | AgentOutcome::Cancelled { iterations } => *iterations,
        }
    }
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentOutcome::FinalAnswer { answer, .. } => f.write_str(answer),
            AgentOutcome::Exhausted { iterations } => write!(
                f,
                "Stopped after {} iterations without reaching a final answer",
                iterations
            ),
            AgentOutcome::Cancelled { iterations } => {
                write!(f, "Cancelled after {} iterations", iterations)
            }
        }
    }
}

/// The result of a single iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Finished(String),
    Acted { action: String, observation: String },
    /// A tool call arrived on the last iteration, when nothing would read its observation
    Skipped { action: String },
    NoDirective,
    Cancelled,
}

/// Agent pairs a completion provider with the tools it may call
pub struct Agent {
    provider: Box<dyn Provider>,
    tools: ToolRegistry,
    config: AgentConfig,
    system_prompt: String,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            config: AgentConfig::default(),
            system_prompt: SYSTEM_PROMPT.trim().to_string(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// A fresh conversation holding the system prompt and the task turn
    pub fn start(&self, task: &str) -> AgentResult<Conversation> {
        let mut conversation = Conversation::new(self.system_prompt.clone());
        let prompt = render_react_prompt(&self.tools.specs(), task)?;
        debug!(prompt = %prompt, "rendered task prompt");
        conversation.append_user(prompt);
        Ok(conversation)
    }

    pub async fn run(&self, task: &str) -> AgentResult<AgentOutcome> {
        self.run_with_cancel(task, &CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> AgentResult<AgentOutcome> {
        let mut conversation = self.start(task)?;
        self.drive(&mut conversation, cancel).await
    }

    /// Iterate on `conversation` until a final answer, the iteration budget or cancellation.
    ///
    /// Only a model failure under [`ModelFailurePolicy::Abort`] returns an error.
    pub async fn drive(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> AgentResult<AgentOutcome> {
        let mut completed = 0;
        while completed < self.config.max_iterations {
            let iteration = completed + 1;
            let last = iteration == self.config.max_iterations;
            info!(
                iteration,
                messages = conversation.len(),
                model = self.provider.model(),
                "starting reasoning round"
            );

            match self.advance(conversation, cancel, !last).await? {
                Step::Finished(answer) => {
                    return Ok(AgentOutcome::FinalAnswer {
                        answer,
                        iterations: iteration,
                    })
                }
                Step::Cancelled => {
                    info!(iteration, "run cancelled");
                    return Ok(AgentOutcome::Cancelled {
                        iterations: completed,
                    });
                }
                Step::Acted { .. } | Step::Skipped { .. } | Step::NoDirective => {
                    completed = iteration
                }
            }
        }

        warn!(
            iterations = completed,
            "exceeded maximum number of reasoning loops, stopping"
        );
        Ok(AgentOutcome::Exhausted {
            iterations: completed,
        })
    }

    /// Run one iteration: query the model, classify the reply and act on it.
    ///
    /// A cancellation during the tool call leaves the assistant turn appended without an
    /// observation.
    pub async fn step(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
    ) -> AgentResult<Step> {
        self.advance(conversation, cancel, true).await
    }

    async fn advance(
        &self,
        conversation: &mut Conversation,
        cancel: &CancellationToken,
        dispatch: bool,
    ) -> AgentResult<Step> {
        for (index, message) in conversation.messages().iter().enumerate() {
            debug!(index, "{}", message.summary());
        }

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Step::Cancelled),
            reply = self.query_model(conversation) => reply,
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => match self.config.model_failure {
                ModelFailurePolicy::Abort => return Err(err),
                ModelFailurePolicy::Degrade => {
                    warn!(error = %err, "treating failed model call as an empty reply");
                    Message::assistant("")
                }
            },
        };
        debug!(reply = %reply.content, "response from model");

        match parse_directive(&reply.content) {
            Directive::FinalAnswer(answer) => {
                info!(answer = %answer, "final answer from model");
                Ok(Step::Finished(answer))
            }
            Directive::ToolCall { action, input } => {
                if !dispatch {
                    warn!(action = %action, "no iteration left to read an observation, skipping tool call");
                    return Ok(Step::Skipped { action });
                }

                let calls = opened_calls(reply.tool.as_ref());
                conversation.append_assistant(reply.content.clone(), reply.tool);

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        answer_calls(conversation, &calls, None, "");
                        return Ok(Step::Cancelled);
                    }
                    result = self.invoke_tool(&action, &input) => result,
                };
                info!(action = %action, input = %input, result = %result, "tool dispatched");
                answer_calls(conversation, &calls, Some(action.as_str()), &result);

                let observation = format!("Observation: {}", result);
                conversation.append_user(format!("{}\n{}", reply.content.trim_end(), observation));
                Ok(Step::Acted {
                    action,
                    observation,
                })
            }
            Directive::None => {
                debug!("no directive found in reply");
                if self.config.retain_unparsed_replies {
                    let calls = opened_calls(reply.tool.as_ref());
                    conversation.append_assistant(reply.content, reply.tool);
                    answer_calls(conversation, &calls, None, "");
                }
                Ok(Step::NoDirective)
            }
        }
    }

    async fn query_model(&self, conversation: &Conversation) -> AgentResult<Message> {
        let tools = if self.config.advertise_tools {
            self.tools.specs()
        } else {
            Vec::new()
        };
        let messages = conversation.snapshot();

        let call = self.provider.complete(&messages, &tools);
        let result = match self.config.model_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AgentError::ModelCallFailure(format!("no reply within {:?}", limit))
            })?,
            None => call.await,
        };

        let (message, usage) =
            result.map_err(|e| AgentError::ModelCallFailure(format!("{:#}", e)))?;
        debug!(?usage, "model usage");
        Ok(message)
    }

    async fn invoke_tool(&self, action: &str, input: &str) -> String {
        let call = self.tools.dispatch(action, input);
        match self.config.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                warn!(tool = action, "tool call timed out");
                AgentError::ToolExecutionFailure(format!(
                    "{} did not finish within {:?}",
                    action, limit
                ))
                .to_string()
            }),
            None => call.await,
        }
    }
}

fn opened_calls(tool: Option<&ToolInvocation>) -> Vec<(String, String)> {
    tool.map(ToolInvocation::calls).unwrap_or_default()
}

/// Answer each native tool call of the assistant turn just appended, so the history stays valid
/// for endpoints that require a tool message per call id. Calls naming `action` get `result`.
fn answer_calls(
    conversation: &mut Conversation,
    calls: &[(String, String)],
    action: Option<&str>,
    result: &str,
) {
    for (call_id, name) in calls {
        let content = if action == Some(name.as_str()) {
            result
        } else {
            NOT_EXECUTED
        };
        conversation.append_tool(content, name.as_str(), call_id.as_str());
    }
}
