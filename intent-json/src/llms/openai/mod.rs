//! OpenAI API client implementation.
//!
//! Only non-streaming chat completions are implemented; the invoker needs a
//! single complete reply to parse and validate.

mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
