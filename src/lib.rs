pub mod agent;
pub mod conversation;
pub mod directive;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod prompt_template;
pub mod providers;
pub mod tools;
