//! Data passed between the conversation, the completion client and the tools.
//!
//! Messages are kept close to the OpenAI chat format, since that is what the completion client
//! speaks, but carry their own id and timestamp so the agent can log and trace them.
pub mod message;
pub mod objectid;
pub mod tool;
