//! LLM backend implementations.
//!
//! # Available Backends
//!
//! - [`openai`] - OpenAI Chat Completions API (and compatible servers)
//! - [`mock`] - scripted, offline provider for tests

pub mod error;
pub mod mock;

#[cfg(feature = "openai")]
pub mod openai;

pub use mock::{MockProvider, MockReply};

#[cfg(feature = "openai")]
pub use openai::{OpenAI, OpenAIConfig};
