//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for LLM API calls, the
//! [`TextGenerator`] seam the pipeline drives, and the prompts used for
//! paraphrasing, answer simulation and auditing.

mod client;
mod prompts;

pub use client::{GenerationRole, LlmClient, Message, Role, TextGenerator};
pub use prompts::Prompts;
